//! Windowed brief documents, gated by a content fingerprint.
//!
//! A brief file always exists after a run: either a generated summary whose
//! `fingerprint` hashes the exact item set it was written from, or a stub
//! (`fingerprint: "stub"`) explaining why there is no summary yet. A brief
//! whose fingerprint still matches is not touched at all.

pub mod fingerprint;
pub mod generator;
pub mod prompt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DigestError, DigestResult};
use crate::item::{sort_newest_first, Item};
use crate::relevance::Classifier;
use crate::store;
use crate::timestamp::iso;

pub use fingerprint::fingerprint;
pub use generator::{build_generator, BriefGenerator, BriefRequest, DynGenerator, MockGenerator};

pub const STUB_FINGERPRINT: &str = "stub";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BriefMode {
    #[default]
    Brief,
    /// Forward-looking watch list instead of a recap.
    Forecast,
}

/// On-disk brief document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brief {
    pub updated_at: String,
    pub label: String,
    pub fingerprint: String,
    pub summary_md: String,
}

impl Brief {
    pub fn stub(label: &str, reason: &str, now: DateTime<Utc>) -> Self {
        Self {
            updated_at: iso(&now),
            label: label.to_string(),
            fingerprint: STUB_FINGERPRINT.to_string(),
            summary_md: format!("• Not available yet.\n\nReason: {reason}"),
        }
    }

    pub fn is_stub(&self) -> bool {
        self.fingerprint == STUB_FINGERPRINT
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BriefOutcome {
    Generated,
    /// Fingerprint matched (or an identical stub was already there); file untouched.
    Unchanged,
    Stub(String),
}

/// One brief to (re)build.
#[derive(Debug, Clone, Copy)]
pub struct BriefJob<'a> {
    pub path: &'a Path,
    pub label: &'a str,
    pub mode: BriefMode,
    pub max_items: usize,
}

/// Write a stub unless an identical one is already on disk.
fn write_stub(
    path: &Path,
    label: &str,
    reason: &DigestError,
    existing: Option<&Brief>,
    now: DateTime<Utc>,
) -> DigestResult<BriefOutcome> {
    let reason = reason.to_string();
    let stub = Brief::stub(label, &reason, now);
    let same = existing
        .is_some_and(|b| b.is_stub() && b.label == stub.label && b.summary_md == stub.summary_md);
    if !same {
        store::write_json_atomic(path, &stub)?;
        tracing::info!(target: "brief", label, reason = %reason, "stub written");
    }
    Ok(BriefOutcome::Stub(reason))
}

/// Build one brief from the items of its window.
///
/// Items are re-checked against the classifier, ordered newest-first and
/// capped before fingerprinting. Generator problems end in a stub; only
/// storage errors are returned.
pub async fn generate_brief_file(
    job: BriefJob<'_>,
    window_items: &[&Item],
    classifier: &Classifier,
    generator: &dyn BriefGenerator,
    now: DateTime<Utc>,
) -> DigestResult<BriefOutcome> {
    let existing: Option<Brief> = store::load_json(job.path);

    let mut items: Vec<Item> = window_items
        .iter()
        .filter(|it| classifier.classify_item(it).admitted)
        .map(|it| (*it).clone())
        .collect();

    if items.is_empty() {
        return write_stub(job.path, job.label, &DigestError::EmptyWindow, existing.as_ref(), now);
    }

    sort_newest_first(&mut items);
    items.truncate(job.max_items.max(1));

    let fp = fingerprint(job.label, &items);
    if existing.as_ref().is_some_and(|b| b.fingerprint == fp) {
        tracing::debug!(target: "brief", label = job.label, "unchanged (fingerprint match)");
        return Ok(BriefOutcome::Unchanged);
    }

    let req = BriefRequest {
        label: job.label,
        mode: job.mode,
        items: &items,
    };
    let summary_md = match generator.generate(&req).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            let e = DigestError::GeneratorFailure("empty response".into());
            return write_stub(job.path, job.label, &e, existing.as_ref(), now);
        }
        Err(e @ DigestError::CredentialMissing(_)) | Err(e @ DigestError::GeneratorFailure(_)) => {
            tracing::warn!(target: "brief", label = job.label, error = %e, "brief not generated");
            return write_stub(job.path, job.label, &e, existing.as_ref(), now);
        }
        Err(other) => {
            let e = DigestError::GeneratorFailure(other.to_string());
            tracing::warn!(target: "brief", label = job.label, error = %e, "brief not generated");
            return write_stub(job.path, job.label, &e, existing.as_ref(), now);
        }
    };

    let doc = Brief {
        updated_at: iso(&now),
        label: job.label.to_string(),
        fingerprint: fp,
        summary_md,
    };
    store::write_json_atomic(job.path, &doc)?;
    tracing::info!(target: "brief", label = job.label, items = items.len(), generator = generator.name(), "brief generated");
    Ok(BriefOutcome::Generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;
    use crate::relevance::RuleSet;
    use chrono::{Duration, TimeZone};
    use generator::DisabledGenerator;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn clf() -> Classifier {
        Classifier::new(RuleSet::default_seed()).unwrap()
    }

    fn items() -> Vec<Item> {
        vec![
            Item::new(
                "New 500kV substation energized in Texas",
                "https://x.test/sub",
                "Utility Dive",
                ItemType::Article,
                now() - Duration::hours(2),
            ),
            Item::new(
                "Senator debates farm bill",
                "https://x.test/farm",
                "Wire",
                ItemType::Article,
                now() - Duration::hours(3),
            ),
        ]
    }

    fn job(path: &Path) -> BriefJob<'_> {
        BriefJob {
            path,
            label: "Daily (last 24 hours)",
            mode: BriefMode::Brief,
            max_items: 120,
        }
    }

    #[tokio::test]
    async fn generates_from_admitted_items_then_stays_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("briefs/daily.json");
        let all = items();
        let refs: Vec<&Item> = all.iter().collect();
        let gen = MockGenerator::replying("## Daily\n- substation");

        let out = generate_brief_file(job(&path), &refs, &clf(), &gen, now()).await.unwrap();
        assert_eq!(out, BriefOutcome::Generated);
        let b: Brief = store::load_json(&path).unwrap();
        assert_eq!(b.fingerprint, fingerprint("Daily (last 24 hours)", &all[..1]));
        assert_eq!(b.summary_md, "## Daily\n- substation");

        let before = std::fs::read(&path).unwrap();
        let later = now() + Duration::minutes(30);
        let out = generate_brief_file(job(&path), &refs, &clf(), &gen, later).await.unwrap();
        assert_eq!(out, BriefOutcome::Unchanged);
        assert_eq!(gen.calls(), 1);
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn empty_window_writes_stub_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weekly.json");
        let gen = MockGenerator::replying("x");
        let out = generate_brief_file(job(&path), &[], &clf(), &gen, now()).await.unwrap();
        assert_eq!(
            out,
            BriefOutcome::Stub("Not enough relevant items in this time window yet.".into())
        );
        let b: Brief = store::load_json(&path).unwrap();
        assert!(b.is_stub());
        assert_eq!(
            b.summary_md,
            "• Not available yet.\n\nReason: Not enough relevant items in this time window yet."
        );

        let before = std::fs::read(&path).unwrap();
        generate_brief_file(job(&path), &[], &clf(), &gen, now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), before, "identical stub is not rewritten");
        assert_eq!(gen.calls(), 0);
    }

    #[tokio::test]
    async fn missing_credential_and_failure_become_stubs() {
        let dir = tempfile::tempdir().unwrap();
        let all = items();
        let refs: Vec<&Item> = all.iter().collect();

        let path = dir.path().join("a.json");
        let off = DisabledGenerator::new(DigestError::CredentialMissing("OPENAI_API_KEY is not set.".into()));
        let out = generate_brief_file(job(&path), &refs, &clf(), &off, now()).await.unwrap();
        assert_eq!(out, BriefOutcome::Stub("OPENAI_API_KEY is not set.".into()));

        let path = dir.path().join("b.json");
        let bad = MockGenerator::failing("timeout");
        let out = generate_brief_file(job(&path), &refs, &clf(), &bad, now()).await.unwrap();
        assert_eq!(out, BriefOutcome::Stub("Brief generation failed: timeout".into()));
        let b: Brief = store::load_json(&path).unwrap();
        assert_eq!(b.fingerprint, STUB_FINGERPRINT);
        assert_eq!(b.label, "Daily (last 24 hours)");
    }

    #[tokio::test]
    async fn cap_keeps_most_recent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        let mut all = items();
        all.push(Item::new(
            "HVDC converter station order",
            "https://x.test/hvdc",
            "T&D World",
            ItemType::Article,
            now() - Duration::hours(1),
        ));
        let refs: Vec<&Item> = all.iter().collect();
        let gen = MockGenerator::replying("");
        let mut j = job(&path);
        j.max_items = 1;
        generate_brief_file(j, &refs, &clf(), &gen, now()).await.unwrap();
        let b: Brief = store::load_json(&path).unwrap();
        assert_eq!(b.fingerprint, fingerprint(j.label, &all[2..3]));
        assert!(b.summary_md.contains("HVDC converter station order"));
    }
}
