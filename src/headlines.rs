//! Top headlines: a short, source-balanced list of the best recent items.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::config::HeadlinesCfg;
use crate::error::DigestResult;
use crate::ingest::normalize::domain_of;
use crate::item::Item;
use crate::relevance::Classifier;
use crate::scoring::rank;
use crate::store;
use crate::timestamp::iso;
use crate::windows::{WindowKind, WindowSelector};

#[derive(Debug, Serialize)]
pub struct HeadlinesDoc<'a> {
    pub generated_at: String,
    pub items: &'a [Item],
}

/// Admitted items inside the lookback window, best score first, at most
/// `per_source_max` per source domain (publisher when the URL has none).
pub fn select(
    items: &[Item],
    classifier: &Classifier,
    cfg: &HeadlinesCfg,
    selector: &WindowSelector,
) -> Vec<Item> {
    let window = selector.resolve(WindowKind::RollingHours {
        hours: cfg.lookback_hours,
    });
    let mut pool: Vec<Item> = window
        .slice(items)
        .into_iter()
        .filter(|it| classifier.classify_item(it).admitted)
        .cloned()
        .collect();
    rank(&mut pool);

    let mut per_source: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(cfg.max_items);
    for it in pool {
        if out.len() >= cfg.max_items {
            break;
        }
        let source = domain_of(&it.url).unwrap_or_else(|| it.publisher.to_ascii_lowercase());
        let n = per_source.entry(source).or_insert(0);
        if *n < cfg.per_source_max {
            *n += 1;
            out.push(it);
        }
    }
    out
}

pub fn write(path: &Path, items: &[Item], now: DateTime<Utc>) -> DigestResult<()> {
    store::write_json_atomic(
        path,
        &HeadlinesDoc {
            generated_at: iso(&now),
            items,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemType;
    use crate::relevance::RuleSet;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn it(title: &str, url: &str, age_h: i64, score: f64) -> Item {
        let mut i = Item::new(title, url, "P", ItemType::Article, now() - Duration::hours(age_h));
        i.score = score;
        i
    }

    #[test]
    fn caps_per_source_and_total() {
        let clf = Classifier::new(RuleSet::default_seed()).unwrap();
        let items = vec![
            it("Substation A", "https://a.test/1", 1, 3.0),
            it("Substation B", "https://a.test/2", 2, 2.9),
            it("Substation C", "https://a.test/3", 3, 2.8),
            it("HVDC D", "https://b.test/1", 4, 1.0),
            it("HVDC old", "https://c.test/1", 200, 9.0),
            it("Senator speaks", "https://d.test/1", 1, 9.0),
        ];
        let cfg = HeadlinesCfg {
            enabled: true,
            max_items: 3,
            per_source_max: 2,
            lookback_hours: 96,
        };
        let got = select(&items, &clf, &cfg, &WindowSelector::new(now()));
        let titles: Vec<_> = got.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Substation A", "Substation B", "HVDC D"]);
    }
}
