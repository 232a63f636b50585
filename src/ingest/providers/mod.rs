// src/ingest/providers/mod.rs
pub mod feed;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DigestConfig;
use crate::ingest::types::SourceProvider;

pub use feed::FeedProvider;

/// Build one provider per configured source, sharing a single HTTP client.
pub fn from_config(cfg: &DigestConfig) -> Result<Vec<Arc<dyn SourceProvider>>> {
    let client = feed::http_client(
        &cfg.fetch.user_agent,
        Duration::from_secs(cfg.fetch.timeout_secs.min(10)),
    )?;
    Ok(cfg
        .sources
        .iter()
        .map(|s| {
            Arc::new(FeedProvider::from_config(s, client.clone(), cfg.fetch.max_per_feed))
                as Arc<dyn SourceProvider>
        })
        .collect())
}
