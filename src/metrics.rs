//! Prometheus recorder for batch runs.
//!
//! There is no server to scrape; at the end of a run the rendered exposition
//! text is written to a file (node-exporter textfile style).

use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::path::Path;

use crate::error::DigestResult;
use crate::store;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global recorder once; later calls reuse it.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let h = PrometheusBuilder::new()
                    .install_recorder()
                    .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
                describe_gauge!("digest_archive_items", "Items in the archive after the run.");
                describe_gauge!(
                    "digest_last_run_timestamp_seconds",
                    "Unix time of the last completed run."
                );
                Ok::<_, anyhow::Error>(h)
            })?
            .clone();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn write_textfile(&self, path: &Path) -> DigestResult<()> {
        store::write_bytes_atomic(path, self.render().as_bytes())
    }
}

/// Run-level gauges set by the pipeline.
pub fn record_run(archive_items: usize, finished_unix: i64) {
    gauge!("digest_archive_items").set(archive_items as f64);
    gauge!("digest_last_run_timestamp_seconds").set(finished_unix as f64);
}
