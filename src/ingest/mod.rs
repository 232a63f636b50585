// src/ingest/mod.rs
pub mod normalize;
pub mod providers;
pub mod types;

use crate::error::DigestError;
use crate::ingest::types::{RawEntry, SourceProvider};
use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

pub use normalize::Normalizer;

/// One-time metrics registration (so series show up in the textfile).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_entries_total", "Raw entries returned by providers.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors and timeouts."
        );
        describe_counter!(
            "ingest_dropped_total",
            "Entries dropped during normalization."
        );
        describe_histogram!("ingest_fetch_ms", "Provider fetch time in milliseconds.");
    });
}

/// Normalize text: decode entities, strip tags, fold quotes, collapse whitespace,
/// cap at `max_chars` characters.
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z!][^>]*>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes, en/em dashes to '-'
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{2013}', '\u{2014}'], "-");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect::<String>().trim_end().to_string();
    }

    out
}

/// Fetch every provider on a bounded pool. Each fetch carries its own timeout;
/// a failing or slow source contributes zero entries instead of failing the run.
pub async fn fetch_all(
    providers: &[Arc<dyn SourceProvider>],
    concurrency: usize,
    timeout: Duration,
) -> Vec<RawEntry> {
    ensure_metrics_described();

    let results: Vec<(String, Vec<RawEntry>)> = stream::iter(providers.iter().cloned())
        .map(|p| async move {
            let name = p.name().to_string();
            let t0 = std::time::Instant::now();
            let entries = match tokio::time::timeout(timeout, p.fetch_latest()).await {
                Ok(Ok(v)) => v,
                Ok(Err(e)) => {
                    let err = DigestError::SourceUnavailable {
                        provider: name.clone(),
                        reason: format!("{e:#}"),
                    };
                    tracing::warn!(target: "ingest", error = %err, "fetch failed");
                    counter!("ingest_provider_errors_total").increment(1);
                    Vec::new()
                }
                Err(_) => {
                    let err = DigestError::SourceUnavailable {
                        provider: name.clone(),
                        reason: format!("timed out after {}ms", timeout.as_millis()),
                    };
                    tracing::warn!(target: "ingest", error = %err, "fetch failed");
                    counter!("ingest_provider_errors_total").increment(1);
                    Vec::new()
                }
            };
            histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            (name, entries)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut raw = Vec::new();
    for (name, mut entries) in results {
        tracing::debug!(target: "ingest", provider = %name, entries = entries.len(), "fetched");
        raw.append(&mut entries);
    }
    counter!("ingest_entries_total").increment(raw.len() as u64);
    raw
}
