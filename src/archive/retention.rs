//! Age-based trimming of the merged archive.

use chrono::{DateTime, Duration, Utc};

use crate::item::Item;

/// Keep items with `now - published <= days`. The cutoff instant itself is
/// kept; future-dated items are kept. Returns the survivors and the number
/// removed.
pub fn apply_retention(items: Vec<Item>, now: DateTime<Utc>, days: u32) -> (Vec<Item>, usize) {
    let cutoff = now - Duration::days(days as i64);
    let before = items.len();
    let kept: Vec<Item> = items.into_iter().filter(|it| it.published >= cutoff).collect();
    let removed = before - kept.len();
    if removed > 0 {
        tracing::info!(target: "archive", removed, days, "retention trimmed archive");
    }
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn at(t: DateTime<Utc>, url: &str) -> Item {
        Item::new("t", url, "p", ItemType::Article, t)
    }

    #[test]
    fn boundary_instant_is_retained() {
        let c = Duration::days(30);
        let items = vec![
            at(now() - c, "https://x.test/exact"),
            at(now() - c - Duration::seconds(1), "https://x.test/over"),
            at(now() + Duration::hours(1), "https://x.test/future"),
        ];
        let (kept, removed) = apply_retention(items, now(), 30);
        assert_eq!(removed, 1);
        let urls: Vec<_> = kept.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.test/exact", "https://x.test/future"]);
    }

    #[test]
    fn idempotent() {
        let items = vec![
            at(now() - Duration::days(400), "https://x.test/a"),
            at(now() - Duration::days(3), "https://x.test/b"),
        ];
        let (once, _) = apply_retention(items, now(), 365);
        let (twice, removed) = apply_retention(once.clone(), now(), 365);
        assert_eq!(once, twice);
        assert_eq!(removed, 0);
    }
}
