//! Durable rolling archive of items across runs.
//!
//! On disk the archive is `{ "updated_at": ..., "items": [...] }`. A bare
//! array (older layout) is accepted on read. Individual records that fail to
//! decode are skipped; a file that is not JSON at all stops the run instead of
//! being silently replaced.

pub mod merge;
pub mod retention;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::DigestResult;
use crate::item::{sort_newest_first, Item};
use crate::store;
use crate::timestamp::iso;

pub use merge::{merge, MergeStats};
pub use retention::apply_retention;

#[derive(Debug, Serialize, Deserialize)]
pub struct ArchiveDoc {
    pub updated_at: String,
    pub items: Vec<Item>,
}

/// Decode archive JSON, tolerating the bare-array layout and bad records.
pub fn parse_items(json: &str) -> Result<Vec<Item>> {
    let v: Value = serde_json::from_str(json).context("archive is not valid JSON")?;
    let records = match v {
        Value::Array(a) => a,
        Value::Object(mut o) => match o.remove("items") {
            Some(Value::Array(a)) => a,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut items = Vec::with_capacity(records.len());
    let mut skipped = 0usize;
    for rec in records {
        match serde_json::from_value::<Item>(rec) {
            Ok(mut it) if !it.title.trim().is_empty() && !it.key().is_empty() => {
                it.ensure_id();
                items.push(it);
            }
            Ok(_) => skipped += 1,
            Err(e) => {
                skipped += 1;
                tracing::debug!(target: "archive", error = %e, "archive record skipped");
            }
        }
    }
    if skipped > 0 {
        tracing::warn!(target: "archive", skipped, "archive records could not be decoded");
    }
    Ok(items)
}

/// Load the archive. A missing file is an empty archive.
pub fn load(path: &Path) -> Result<Vec<Item>> {
    match fs::read_to_string(path) {
        Ok(s) => parse_items(&s).with_context(|| format!("loading {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

/// Load the static seed snapshot. Problems here only cost the seed.
pub fn load_bootstrap(path: &Path) -> Vec<Item> {
    match load(path) {
        Ok(items) => {
            if items.is_empty() {
                tracing::warn!(target: "archive", path = %path.display(), "bootstrap snapshot is empty or missing");
            }
            items
        }
        Err(e) => {
            tracing::warn!(target: "archive", error = ?e, "bootstrap snapshot unusable");
            Vec::new()
        }
    }
}

/// Write the archive newest-first, atomically.
pub fn save(path: &Path, mut items: Vec<Item>, now: DateTime<Utc>) -> DigestResult<usize> {
    sort_newest_first(&mut items);
    let n = items.len();
    let doc = ArchiveDoc {
        updated_at: iso(&now),
        items,
    };
    store::write_json_atomic(path, &doc)?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;
    use chrono::TimeZone;

    #[test]
    fn bare_array_and_document_both_load() {
        let arr = r#"[{"title":"HVDC","url":"https://x.test/a","published":"2026-10-19T08:00:00Z"}]"#;
        let doc = r#"{"updated_at":"x","items":[{"title":"HVDC","url":"https://x.test/a"}]}"#;
        let a = parse_items(arr).unwrap();
        let b = parse_items(doc).unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(a[0].id, b[0].id);
        assert!(!a[0].id.is_empty());
    }

    #[test]
    fn bad_records_are_skipped_not_fatal() {
        let s = r#"[{"title":"ok","url":"https://x.test/a"},{"title":5},{"url":"https://x.test/b","title":" "}]"#;
        assert_eq!(parse_items(s).unwrap().len(), 1);
        assert!(parse_items("not json {").is_err());
    }

    #[test]
    fn save_then_load_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/news_archive.json");
        let t = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let items = vec![
            Item::new("old", "https://x.test/old", "P", ItemType::Article, t - chrono::Duration::days(2)),
            Item::new("new", "https://x.test/new", "P", ItemType::Video, t),
        ];
        assert_eq!(save(&path, items, t).unwrap(), 2);
        let back = load(&path).unwrap();
        assert_eq!(back[0].title, "new");
        assert_eq!(back[1].title, "old");
        assert!(!dir.path().join("data/news_archive.json.tmp").exists());
    }

    #[test]
    fn missing_archive_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("nope.json")).unwrap().is_empty());
        assert!(load_bootstrap(&dir.path().join("nope.json")).is_empty());
    }
}
