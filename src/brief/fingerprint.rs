//! Content fingerprint of the item set behind a brief.
//!
//! Canonical encoding: compact JSON `{"items":[...],"label":...}` with keys
//! in sorted order, each item reduced to `category, published, publisher,
//! title, type, url`. Missing category encodes as `""`.

use serde::Serialize;

use crate::hashing::sha256_hex;
use crate::item::Item;
use crate::timestamp::iso;

// Field order is the serialized key order; keep it alphabetical.
#[derive(Serialize)]
struct CompactItem<'a> {
    category: &'a str,
    published: String,
    publisher: &'a str,
    title: &'a str,
    #[serde(rename = "type")]
    item_type: &'static str,
    url: &'a str,
}

#[derive(Serialize)]
struct Canonical<'a> {
    items: Vec<CompactItem<'a>>,
    label: &'a str,
}

/// Canonical bytes that get hashed. Exposed for tests and debugging.
pub fn canonical_json(label: &str, items: &[Item]) -> String {
    let doc = Canonical {
        items: items
            .iter()
            .map(|it| CompactItem {
                category: it.category.as_deref().unwrap_or(""),
                published: iso(&it.published),
                publisher: &it.publisher,
                title: &it.title,
                item_type: it.item_type.as_str(),
                url: &it.url,
            })
            .collect(),
        label,
    };
    // Only strings inside; serialization cannot fail.
    serde_json::to_string(&doc).unwrap_or_default()
}

/// SHA-256 hex over [`canonical_json`]. `items` must already be windowed,
/// capped and in newest-first order.
pub fn fingerprint(label: &str, items: &[Item]) -> String {
    sha256_hex(canonical_json(label, items).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;
    use chrono::{TimeZone, Utc};

    fn item() -> Item {
        let mut it = Item::new(
            "New 500kV substation energized in Texas",
            "https://x.test/a",
            "Utility Dive",
            ItemType::Article,
            Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap(),
        );
        it.score = 1.7;
        it.summary = Some("ignored".into());
        it
    }

    #[test]
    fn canonical_form_is_sorted_and_compact() {
        assert_eq!(
            canonical_json("Daily", &[item()]),
            concat!(
                r#"{"items":[{"category":"","published":"2026-10-19T10:00:00Z","#,
                r#""publisher":"Utility Dive","title":"New 500kV substation energized in Texas","#,
                r#""type":"article","url":"https://x.test/a"}],"label":"Daily"}"#
            )
        );
    }

    #[test]
    fn unstable_fields_do_not_change_fingerprint() {
        let a = item();
        let mut b = item();
        b.score = 0.1;
        b.summary = None;
        b.image = Some("https://img.test/x.jpg".into());
        b.tags = vec!["Substations".into()];
        assert_eq!(fingerprint("Daily", &[a.clone()]), fingerprint("Daily", &[b]));
        assert_ne!(fingerprint("Daily", &[a.clone()]), fingerprint("Weekly", &[a]));
    }

    #[test]
    fn stable_fields_do_change_fingerprint() {
        let a = item();
        let mut b = item();
        b.category = Some("Substations".into());
        assert_ne!(fingerprint("Daily", &[a]), fingerprint("Daily", &[b]));
        assert_eq!(fingerprint("Daily", &[]).len(), 64);
    }
}
