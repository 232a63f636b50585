//! `digest`: one batch run of the energy news digest.
//!
//! Meant to be triggered by a scheduler; every invocation is independent and
//! leaves the data directory in a consistent state or exits non-zero.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use energy_news_digest::{
    brief::BriefOutcome,
    config::DigestConfig,
    hashing::short_id,
    ingest::normalize::canonical_url,
    metrics::Metrics,
    timestamp::iso,
    windows::WindowSelector,
    Pipeline,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Energy & grid news digest: archive, briefs, shortlinks")]
struct Cli {
    /// Config file (defaults to $DIGEST_CONFIG_PATH, then config/digest.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch sources and rebuild every output.
    Run {
        /// Skip fetching; rebuild outputs from the stored archive only.
        #[arg(long)]
        offline: bool,
    },
    /// Print the configured brief windows resolved for the current instant.
    Windows,
    /// Print the short id for a URL.
    Shortlink { url: String },
}

/// Compact human logs by default; `DIGEST_LOG_JSON=1` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));
    let json = std::env::var("DIGEST_LOG_JSON").is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<DigestConfig> {
    match path {
        Some(p) => {
            let mut cfg = DigestConfig::load_from(&p)?;
            cfg.apply_env_overrides();
            Ok(cfg)
        }
        None => DigestConfig::load(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional (local runs); CI passes real env vars.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Shortlink { url } => {
            println!("{}", short_id(&canonical_url(&url)));
        }
        Command::Windows => {
            let cfg = load_config(cli.config)?;
            let sel = WindowSelector::new(chrono::Utc::now());
            println!("now {}", iso(&sel.now()));
            for b in &cfg.briefs {
                let w = sel.resolve(b.window);
                println!(
                    "{:<22} [{} .. {})  {}",
                    w.name,
                    iso(&w.start),
                    iso(&w.end),
                    b.label
                );
            }
        }
        Command::Run { offline } => {
            let cfg = load_config(cli.config)?;
            let metrics_path = cfg.paths.metrics.clone().map(|p| cfg.data_path(&p));
            let metrics = Metrics::init()?;

            let pipeline = Pipeline::from_config(cfg).context("building pipeline")?;
            let report = if offline {
                pipeline.run_offline().await
            } else {
                pipeline.run().await
            }
            .context("digest run failed")?;

            for (label, outcome) in &report.briefs {
                match outcome {
                    BriefOutcome::Generated => tracing::info!(%label, "brief: generated"),
                    BriefOutcome::Unchanged => tracing::info!(%label, "brief: unchanged"),
                    BriefOutcome::Stub(reason) => tracing::info!(%label, %reason, "brief: stub"),
                }
            }
            tracing::info!(
                fetched = report.fetched_raw,
                admitted = report.admitted,
                archive = report.archive_items,
                headlines = report.headlines,
                "done"
            );

            if let Some(p) = metrics_path {
                metrics.write_textfile(&p)?;
            }
        }
    }
    Ok(())
}
