//! # Source Weights
//!
//! Maps publisher names (e.g. "Utility Dive", "Reuters") to trust weights
//! in `[0.0, 1.0]`. The weight is the base term of an item's score.
//!
//! - Loads from JSON config (weights + aliases).
//! - Case-insensitive lookup with normalization of punctuation, dashes, etc.
//! - Fallback order: aliases → exact match → substring match → default.
//! - Includes a built-in `default_seed()` with trade press and wire services.

use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

pub const ENV_SOURCE_WEIGHTS_PATH: &str = "DIGEST_SOURCE_WEIGHTS_PATH";

/// Configuration for source weights, loaded from JSON or defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceWeightsConfig {
    /// Default weight if no match is found.
    #[serde(default = "default_default_weight")]
    pub default_weight: f32,
    /// Explicit weights for canonical publisher names.
    #[serde(default)]
    pub weights: HashMap<String, f32>,
    /// Aliases mapping non-canonical names → canonical names.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_default_weight() -> f32 {
    0.50
}

impl SourceWeightsConfig {
    /// Load configuration from a JSON file (or `$DIGEST_SOURCE_WEIGHTS_PATH`).
    /// Falls back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = std::env::var(ENV_SOURCE_WEIGHTS_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| path.as_ref().to_path_buf());
        match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "bad source weights, using seed");
                Self::default_seed()
            }),
            Err(_) => Self::default_seed(),
        }
    }

    /// Get the weight for a publisher.
    ///
    /// Steps:
    /// 1. Alias lookup (normalized) → canonical → weight.
    /// 2. Exact weight match.
    /// 3. Substring fallback, longest key first so the result is stable.
    /// 4. Default weight.
    pub fn weight_for(&self, source: &str) -> f32 {
        let s = normalize(source);

        // 1) Alias resolution.
        if let Some(canon) = self.aliases.get(&s) {
            let c = normalize(canon);
            if let Some(&w) = self.weights.get(&c) {
                return clamp01(w);
            }
        }

        // 2) Exact weight match.
        if let Some(&w) = self.weights.get(&s) {
            return clamp01(w);
        }

        // 3) Substring fallback.
        let mut best: Option<(&str, f32)> = None;
        for (k, &w) in &self.weights {
            if s.contains(k.as_str()) && best.map_or(true, |(bk, _)| k.len() > bk.len()) {
                best = Some((k.as_str(), w));
            }
        }
        if let Some((_, w)) = best {
            return clamp01(w);
        }

        // 4) Default.
        clamp01(self.default_weight)
    }

    /// Built-in seed used when no config file is found.
    pub fn default_seed() -> Self {
        let mut weights = HashMap::new();
        let mut aliases = HashMap::new();

        for (k, v) in [
            ("t&d world", 0.90),
            ("utility dive", 0.88),
            ("power technology", 0.80),
            ("smart energy international", 0.78),
            ("renewables now", 0.75),
            ("canary media", 0.75),
            ("reuters", 0.85),
            ("bloomberg", 0.85),
            ("financial times", 0.85),
            ("wall street journal", 0.85),
            ("associated press", 0.80),
            ("cnbc", 0.70),
            ("cnn", 0.65),
            ("iea", 0.90),
            ("eia", 0.90),
            ("ferc", 0.90),
        ] {
            weights.insert(k.to_string(), v);
        }

        for (a, c) in [
            ("tdworld", "t&d world"),
            ("tdworld com", "t&d world"),
            ("utilitydive com", "utility dive"),
            ("the wall street journal", "wall street journal"),
            ("wsj", "wall street journal"),
            ("ft", "financial times"),
            ("ap", "associated press"),
            ("international energy agency", "iea"),
            ("energy information administration", "eia"),
            ("federal energy regulatory commission", "ferc"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }

        Self {
            default_weight: default_default_weight(),
            weights,
            aliases,
        }
    }
}

/// Lowercase, replace punctuation/dashes with spaces, collapse spaces.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_ascii_lowercase();

    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }

    out = out.replace(['\n', '\r', '\t', '.', ',', '‚', '’', '\''], " ");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}
