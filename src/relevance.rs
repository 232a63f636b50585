// src/relevance.rs
//! Topic admission gate and taxonomy tagging.
//!
//! Two-tier evidence: a single "hard" (domain-specific) term admits an item
//! even next to negative vocabulary; "broad" (generic) terms need
//! corroboration and a clean negative check. Rule sets are plain config and
//! can be loaded side by side.

use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::item::{Item, ItemType};

pub const DEFAULT_RULES_PATH: &str = "config/rules.toml";
pub const ENV_RULES_PATH: &str = "DIGEST_RULES_PATH";

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub admission: AdmissionCfg,
    pub hard: Vec<String>,
    pub broad: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
    #[serde(default)]
    pub categories: Vec<CategoryCfg>,
    #[serde(default)]
    pub scoring: ScoringCfg,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdmissionCfg {
    /// Broad-term matches needed when no hard term matched.
    pub min_broad_hits: usize,
    /// Same threshold for video items.
    pub video_min_broad_hits: usize,
}

impl Default for AdmissionCfg {
    fn default() -> Self {
        Self {
            min_broad_hits: 2,
            video_min_broad_hits: 2,
        }
    }
}

/// One taxonomy entry: tag name and the pattern that assigns it.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryCfg {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringCfg {
    /// Recency contribution falls linearly to zero at this age.
    pub recency_horizon_days: f64,
    pub recency_weight: f64,
    pub category_weight: f64,
    /// Category hits beyond this count add nothing.
    pub category_cap: usize,
}

impl Default for ScoringCfg {
    fn default() -> Self {
        Self {
            recency_horizon_days: 7.0,
            recency_weight: 1.0,
            category_weight: 0.5,
            category_cap: 3,
        }
    }
}

impl RuleSet {
    /// Load using `$DIGEST_RULES_PATH` or `path`; falls back to `default_seed()`
    /// when the file is absent.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let path = std::env::var(ENV_RULES_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| path.to_path_buf());
        if !path.exists() {
            tracing::info!(target: "classify", path = %path.display(), "rules file absent, using built-in rule set");
            return Ok(Self::default_seed());
        }
        let content = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read rules at {}: {}", path.display(), e)
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Built-in energy / grid / infrastructure rule set.
    pub fn default_seed() -> Self {
        let s = |v: &[&str]| v.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        let hard = s(&[
            r"\bhvdc\b",
            r"\bhigh[-\s]?voltage\b",
            r"\b\d{2,4}\s?kv\b",
            r"\bsubstation(s)?\b",
            r"\btransmission\b",
            r"\bdistribution\b",
            r"\bpower\s*grid\b|\belectric\s*grid\b|\bgrid\b",
            r"\btransformer(s)?\b",
            r"\bgis\b|\bgas[-\s]?insulated\b",
            r"\bsynchronous\s+condenser(s)?\b",
            r"\bseries\s+capacitor(s)?\b|\bfsc\b",
            r"\bfacts\b|\bsvc\b|\bstatcom\b",
            r"\brenewable(s)?\b|\bclean\s+energy\b|\benergy\s+transition\b",
            r"\bsolar\b|\bpv\b|\bphotovoltaic(s)?\b",
            r"\bwind\b|\boffshore\s+wind\b|\bonshore\s+wind\b",
            r"\bbattery\b|\benergy\s+storage\b|\bbess\b",
            r"\bnuclear\b|\bsmr\b|\bsmall\s+modular\s+reactor(s)?\b",
            r"\bdata\s*center(s)?\b|\bdatacenter(s)?\b",
            r"\bai\b|\bartificial\s+intelligence\b|\bgenai\b",
            r"\bchip(s)?\b|\bsemiconductor(s)?\b|\bnvidia\b|\btsmc\b",
            r"\brare\s+earth(s)?\b|\bcritical\s+mineral(s)?\b|\blithium\b|\bcobalt\b",
            r"\boil\b|\bgas\b|\blng\b|\bpipeline(s)?\b|\brefiner(y|ies)\b",
            r"\butility\b|\butilities\b|\bindependent\s+system\s+operator\b|\brto\b",
        ]);
        let broad = s(&[
            r"\belectricity\b",
            r"\bpower\b",
            r"\benergy\b",
            r"\bcarbon\b|\bemissions\b|\bco2\b",
            r"\bmarket(s)?\b|\bpricing\b|\btariff(s)?\b",
            r"\binterconnector(s)?\b",
            r"\bcharger(s)?\b|\bev\b|\belectric\s+vehicle(s)?\b",
        ]);
        let negative = s(&[
            r"\belection(s)?\b",
            r"\bpresident\b|\bprime\s+minister\b|\bparliament\b|\bsenate\b|\bsenator(s)?\b|\bcongress\b",
            r"\btrump\b|\bbiden\b|\bobama\b",
            r"\bmayor\b|\bgubern(or|atorial)\b",
            r"\bwar\b|\bukraine\b|\brussia\b|\bgaza\b|\bisrael\b|\bhamas\b",
            r"\bmurder\b|\bshooting\b|\btrial\b|\bcourt\b",
            r"\bcelebrity\b|\boscar(s)?\b|\bmovie\b|\bfootball\b|\bsoccer\b|\bnba\b|\bnfl\b",
        ]);
        let categories = [
            ("Grid", r"\bgrid\b|\breliability\b|\bresilience\b"),
            ("Transmission", r"\btransmission\b|\binterconnector(s)?\b|\bhigh[-\s]?voltage\b|\b\d{2,4}\s?kv\b"),
            ("Substations", r"\bsubstation(s)?\b|\bswitchgear\b|\btransformer(s)?\b"),
            ("HVDC", r"\bhvdc\b"),
            ("AI", r"\bai\b|\bartificial\s+intelligence\b|\bgenai\b"),
            ("Data Centers", r"\bdata\s*center(s)?\b|\bdatacenter(s)?\b"),
            ("Chips", r"\bchip(s)?\b|\bsemiconductor(s)?\b"),
            ("Renewables", r"\brenewable(s)?\b|\bsolar\b|\bwind\b|\bclean\s+energy\b"),
            ("Storage", r"\bbattery\b|\bbess\b|\benergy\s+storage\b"),
            ("Oil & Gas", r"\boil\b|\bgas\b|\blng\b|\bpipeline(s)?\b|\brefiner(y|ies)\b"),
            ("EPC", r"\bepc\b|\bengineering,?\s+procurement\b"),
            ("OEM", r"\boem(s)?\b|\bsiemens\b|\bhitachi\b|\bge\s+vernova\b"),
            ("Permitting", r"\bpermit(s|ting)?\b"),
            ("Interconnection", r"\binterconnection\b|\bqueue\b|\bcurtailment\b"),
            ("Markets", r"\bmarket(s)?\b|\bpricing\b|\btariff(s)?\b|\bauction\b"),
            ("Policy", r"\bpolicy\b|\bregulat(or|ion|ory)\b|\bferc\b"),
        ]
        .into_iter()
        .map(|(name, pattern)| CategoryCfg {
            name: name.to_string(),
            pattern: pattern.to_string(),
        })
        .collect();

        Self {
            admission: AdmissionCfg::default(),
            hard,
            broad,
            negative,
            categories,
            scoring: ScoringCfg::default(),
        }
    }
}

/* ----------------------------
Compiled classifier
---------------------------- */

/// Outcome of classifying one text blob.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub admitted: bool,
    pub hard_hits: usize,
    pub broad_hits: usize,
    pub negative_hits: usize,
    /// Taxonomy tags in taxonomy order.
    pub tags: Vec<String>,
    pub reasons: Vec<String>,
}

#[derive(Debug)]
struct CompiledCategory {
    name: String,
    re: Regex,
}

#[derive(Debug)]
pub struct Classifier {
    pub rules: RuleSet,
    hard: Option<Regex>,
    broad: Option<Regex>,
    negative: Option<Regex>,
    categories: Vec<CompiledCategory>,
}

/// Combine a term list into one case-insensitive alternation so that
/// overlapping terms count once per occurrence.
fn compile_list(list_name: &str, patterns: &[String]) -> anyhow::Result<Option<Regex>> {
    for (i, p) in patterns.iter().enumerate() {
        Regex::new(p).map_err(|e| anyhow::anyhow!("{list_name}[{i}] regex error: {e}"))?;
    }
    if patterns.is_empty() {
        return Ok(None);
    }
    let joined = patterns
        .iter()
        .map(|p| format!("(?:{p})"))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Some(Regex::new(&format!("(?i){joined}"))?))
}

fn count(re: &Option<Regex>, text: &str) -> usize {
    re.as_ref().map(|r| r.find_iter(text).count()).unwrap_or(0)
}

impl Classifier {
    pub fn new(rules: RuleSet) -> anyhow::Result<Self> {
        let hard = compile_list("hard", &rules.hard)?;
        let broad = compile_list("broad", &rules.broad)?;
        let negative = compile_list("negative", &rules.negative)?;
        let categories = rules
            .categories
            .iter()
            .map(|c| {
                let re = Regex::new(&format!("(?i){}", c.pattern))
                    .map_err(|e| anyhow::anyhow!("category `{}` regex error: {}", c.name, e))?;
                Ok(CompiledCategory {
                    name: c.name.clone(),
                    re,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self {
            rules,
            hard,
            broad,
            negative,
            categories,
        })
    }

    pub fn taxonomy(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    fn min_broad_for(&self, item_type: ItemType) -> usize {
        match item_type {
            ItemType::Video => self.rules.admission.video_min_broad_hits,
            ItemType::Article => self.rules.admission.min_broad_hits,
        }
    }

    /// Classify a text blob (title + description + category + publisher).
    pub fn classify(&self, text: &str, item_type: ItemType) -> Classification {
        let mut c = Classification {
            hard_hits: count(&self.hard, text),
            broad_hits: count(&self.broad, text),
            negative_hits: count(&self.negative, text),
            ..Default::default()
        };

        // 1) Negative vocabulary without domain evidence: reject outright.
        if c.negative_hits > 0 && c.hard_hits == 0 {
            c.reasons.push(format!("negative:{}", c.negative_hits));
            c.reasons.push("negative_without_hard".into());
        // 2) One hard term is enough.
        } else if c.hard_hits > 0 {
            c.admitted = true;
            c.reasons.push(format!("hard:{}", c.hard_hits));
        // 3) Generic vocabulary needs corroboration.
        } else {
            let need = self.min_broad_for(item_type).max(1);
            c.admitted = c.broad_hits >= need;
            c.reasons.push(format!("broad:{}/{}", c.broad_hits, need));
        }

        if c.admitted {
            c.tags = self
                .categories
                .iter()
                .filter(|cat| cat.re.is_match(text))
                .map(|cat| cat.name.clone())
                .collect();
        }

        tracing::debug!(
            target: "classify",
            admitted = c.admitted,
            hard = c.hard_hits,
            broad = c.broad_hits,
            negative = c.negative_hits,
            reasons = ?c.reasons
        );
        c
    }

    /// Classify an item on title, summary, feed category and publisher.
    /// Records written before the feed category had its own field may still
    /// carry it in `category`; it counts only when it is not a taxonomy tag,
    /// so tags never vote for themselves.
    pub fn classify_item(&self, item: &Item) -> Classification {
        let mut parts: Vec<&str> = vec![item.title.as_str()];
        if let Some(s) = item.summary.as_deref() {
            parts.push(s);
        }
        match (item.source_category.as_deref(), item.category.as_deref()) {
            (Some(src), _) => parts.push(src),
            (None, Some(cat)) if !self.taxonomy().any(|t| t == cat) => parts.push(cat),
            _ => {}
        }
        parts.push(item.publisher.as_str());
        parts.retain(|p| !p.is_empty());
        self.classify(&parts.join(" "), item.item_type)
    }

    /// Write tags and primary category from a classification onto the item.
    pub fn apply_tags(item: &mut Item, c: &Classification) {
        item.tags = c.tags.clone();
        item.category = c.tags.first().cloned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clf() -> Classifier {
        Classifier::new(RuleSet::default_seed()).expect("seed rules compile")
    }

    #[test]
    fn one_hard_term_beats_negative_vocabulary() {
        let c = clf().classify(
            "New 500kV substation energized, announced by Senator X",
            ItemType::Article,
        );
        assert!(c.admitted, "{c:?}");
        assert!(c.hard_hits >= 1);
        assert_eq!(c.negative_hits, 1);
    }

    #[test]
    fn two_broad_terms_without_negatives_pass() {
        let c = clf().classify("electricity market tariff update", ItemType::Article);
        assert!(c.admitted, "{c:?}");
        assert_eq!(c.hard_hits, 0);
        assert!(c.broad_hits >= 2);
    }

    #[test]
    fn single_broad_term_is_rejected() {
        let c = clf().classify("market update", ItemType::Article);
        assert!(!c.admitted);
        assert_eq!(c.broad_hits, 1);
        assert!(c.tags.is_empty());
    }

    #[test]
    fn negative_without_hard_is_rejected_even_with_broad() {
        let c = clf().classify(
            "Senate debates electricity market pricing",
            ItemType::Article,
        );
        assert!(!c.admitted);
        assert!(c.reasons.iter().any(|r| r == "negative_without_hard"));
    }

    #[test]
    fn video_threshold_is_separate() {
        let mut rules = RuleSet::default_seed();
        rules.admission.video_min_broad_hits = 1;
        let clf = Classifier::new(rules).unwrap();
        assert!(clf.classify("market update", ItemType::Video).admitted);
        assert!(!clf.classify("market update", ItemType::Article).admitted);
    }

    #[test]
    fn tags_follow_taxonomy_order() {
        let c = clf().classify(
            "HVDC substation to feed new data center campus",
            ItemType::Article,
        );
        assert!(c.admitted);
        assert_eq!(c.tags, vec!["Substations", "HVDC", "Data Centers"]);
    }

    #[test]
    fn stored_taxonomy_category_does_not_vote() {
        let clf = clf();
        let t = chrono::Utc::now();
        let mut it = Item::new("Quarterly update", "https://x.test/a", "", ItemType::Article, t);
        it.category = Some("Grid".into());
        assert!(!clf.classify_item(&it).admitted);
        it.category = Some("grid news".into());
        assert!(clf.classify_item(&it).admitted);
    }

    #[test]
    fn feed_category_survives_tagging() {
        let clf = clf();
        let t = chrono::Utc::now();
        let mut it = Item::new("Quarterly update", "https://x.test/a", "Wire", ItemType::Article, t);
        it.source_category = Some("Power Grid".into());

        let first = clf.classify_item(&it);
        assert!(first.admitted, "{first:?}");
        Classifier::apply_tags(&mut it, &first);
        assert_eq!(it.category.as_deref(), Some("Grid"));
        assert_eq!(it.source_category.as_deref(), Some("Power Grid"));

        let again = clf.classify_item(&it);
        assert!(again.admitted, "{again:?}");
        assert_eq!(again.tags, first.tags);
    }

    #[test]
    fn toml_rule_set_loads_and_bad_regex_is_reported() {
        let rules = RuleSet::from_toml_str(
            r#"
hard = ["\\bstatcom\\b"]
broad = ["\\bpower\\b", "\\benergy\\b"]
negative = ["\\bnfl\\b"]

[admission]
min_broad_hits = 3

[[categories]]
name = "FACTS"
pattern = "\\bstatcom\\b"
"#,
        )
        .unwrap();
        assert_eq!(rules.admission.min_broad_hits, 3);
        assert_eq!(rules.admission.video_min_broad_hits, 2);
        let clf = Classifier::new(rules).unwrap();
        assert!(!clf.classify("power energy", ItemType::Article).admitted);
        assert_eq!(clf.classify("STATCOM online", ItemType::Article).tags, vec!["FACTS"]);

        let mut bad = RuleSet::default_seed();
        bad.hard.push("(unclosed".into());
        let err = Classifier::new(bad).unwrap_err().to_string();
        assert!(err.contains("hard["), "{err}");
    }
}
