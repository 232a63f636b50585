//! Item scoring and ranking.
//!
//! score = source_weight
//!       + recency_weight * max(0, 1 - age / horizon)
//!       + category_weight * min(category_hits, cap)
//!
//! Items from the future count as brand new. Ties rank the most recent first.

use chrono::{DateTime, Utc};

use crate::item::Item;
use crate::relevance::ScoringCfg;
use crate::source_weights::SourceWeightsConfig;

/// Signals feeding one score, kept separate so tests can check each term.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreInputs {
    pub source_weight: f64,
    /// In `[0, 1]`, 1 for an item published at `now`.
    pub freshness: f64,
    pub category_hits: usize,
}

#[derive(Debug, Clone)]
pub struct Scorer {
    weights: SourceWeightsConfig,
    params: ScoringCfg,
}

impl Scorer {
    pub fn new(weights: SourceWeightsConfig, params: ScoringCfg) -> Self {
        Self { weights, params }
    }

    pub fn inputs(&self, item: &Item, category_hits: usize, now: DateTime<Utc>) -> ScoreInputs {
        let horizon_secs = (self.params.recency_horizon_days * 86_400.0).max(1.0);
        let age_secs = (now - item.published).num_seconds().max(0) as f64;
        ScoreInputs {
            source_weight: self.weights.weight_for(&item.publisher) as f64,
            freshness: (1.0 - age_secs / horizon_secs).clamp(0.0, 1.0),
            category_hits,
        }
    }

    pub fn combine(&self, i: &ScoreInputs) -> f64 {
        let p = &self.params;
        let raw = i.source_weight
            + p.recency_weight * i.freshness
            + p.category_weight * i.category_hits.min(p.category_cap) as f64;
        if raw.is_finite() {
            // Three decimals keep the archive diff-friendly.
            (raw * 1000.0).round() / 1000.0
        } else {
            0.0
        }
    }

    pub fn score(&self, item: &Item, category_hits: usize, now: DateTime<Utc>) -> f64 {
        self.combine(&self.inputs(item, category_hits, now))
    }
}

/// Highest score first, then most recent, then URL.
pub fn rank(items: &mut [Item]) {
    items.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.published.cmp(&a.published))
            .then_with(|| a.url.cmp(&b.url))
    });
}
