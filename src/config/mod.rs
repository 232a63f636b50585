// src/config/mod.rs
//! Run configuration loaded from `config/digest.toml`.
//!
//! Every section has defaults, so a missing default file still yields a
//! working pipeline. An explicit `DIGEST_CONFIG_PATH` that does not exist is an
//! error.

pub mod ai;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::brief::BriefMode;
use crate::item::ItemType;
use crate::windows::WindowKind;

pub use ai::GeneratorCfg;

pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";
pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const ENV_RETENTION_DAYS: &str = "DIGEST_RETENTION_DAYS";

#[derive(Debug, Clone, Deserialize)]
pub struct DigestConfig {
    #[serde(default)]
    pub paths: PathsCfg,
    #[serde(default)]
    pub archive: ArchiveCfg,
    #[serde(default)]
    pub fetch: FetchCfg,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceCfg>,
    #[serde(default)]
    pub generator: GeneratorCfg,
    #[serde(default = "default_briefs")]
    pub briefs: Vec<BriefSpec>,
    #[serde(default)]
    pub shortlinks: ShortlinkCfg,
    #[serde(default)]
    pub headlines: HeadlinesCfg,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            paths: PathsCfg::default(),
            archive: ArchiveCfg::default(),
            fetch: FetchCfg::default(),
            sources: default_sources(),
            generator: GeneratorCfg::default(),
            briefs: default_briefs(),
            shortlinks: ShortlinkCfg::default(),
            headlines: HeadlinesCfg::default(),
        }
    }
}

/// Output locations. Relative document paths resolve against `data_dir`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsCfg {
    pub data_dir: PathBuf,
    pub archive: PathBuf,
    pub headlines: PathBuf,
    pub metrics: Option<PathBuf>,
    pub rules: PathBuf,
    pub source_weights: PathBuf,
}

impl Default for PathsCfg {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            archive: PathBuf::from("news_archive.json"),
            headlines: PathBuf::from("top.json"),
            metrics: None,
            rules: PathBuf::from("config/rules.toml"),
            source_weights: PathBuf::from("config/source_weights.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveCfg {
    pub retention_days: u32,
    /// Snapshot used to seed an empty archive when a run also fetched nothing.
    pub bootstrap: Option<PathBuf>,
}

impl Default for ArchiveCfg {
    fn default() -> Self {
        Self {
            retention_days: 365,
            bootstrap: Some(PathBuf::from("config/bootstrap_archive.json")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchCfg {
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub max_per_feed: usize,
    pub user_agent: String,
    pub blocked_domains: Vec<String>,
}

impl Default for FetchCfg {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout_secs: 15,
            max_per_feed: 50,
            user_agent: "energy-news-digest/0.1".to_string(),
            blocked_domains: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Rss,
    Youtube,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceCfg {
    pub name: String,
    pub url: String,
    pub kind: FeedKind,
    /// Defaults to `video` for YouTube feeds, `article` otherwise.
    #[serde(rename = "type", default)]
    pub item_type: Option<ItemType>,
}

impl SourceCfg {
    pub fn item_type(&self) -> ItemType {
        self.item_type.unwrap_or(match self.kind {
            FeedKind::Youtube => ItemType::Video,
            FeedKind::Rss => ItemType::Article,
        })
    }
}

fn default_sources() -> Vec<SourceCfg> {
    let yt = |id: &str, name: &str| SourceCfg {
        name: name.to_string(),
        url: format!("https://www.youtube.com/feeds/videos.xml?channel_id={id}"),
        kind: FeedKind::Youtube,
        item_type: None,
    };
    let rss = |url: &str, name: &str| SourceCfg {
        name: name.to_string(),
        url: url.to_string(),
        kind: FeedKind::Rss,
        item_type: None,
    };
    vec![
        rss("https://www.tdworld.com/rss", "T&D World"),
        rss("https://www.utilitydive.com/feeds/news/", "Utility Dive"),
        rss("https://www.smart-energy.com/feed/", "Smart Energy International"),
        rss("https://www.power-technology.com/feed/", "Power Technology"),
        yt("UCupvZG-5ko_eiXAupbDfxWw", "CNN"),
        yt("UChqUTb7kYRX8-EiaN3XFrSQ", "Reuters"),
        yt("UCK7tptUDHh-RYDsdxO1-5QQ", "The Wall Street Journal"),
        yt("UCoUxsWakJucWg46KW5RsvPw", "Financial Times"),
    ]
}

/// One brief artifact: where it goes, what it is called, which window feeds it.
#[derive(Debug, Clone, Deserialize)]
pub struct BriefSpec {
    pub file: PathBuf,
    pub label: String,
    pub window: WindowKind,
    #[serde(default)]
    pub mode: BriefMode,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

fn default_max_items() -> usize {
    120
}

fn default_briefs() -> Vec<BriefSpec> {
    let b = |file: &str, label: &str, window: WindowKind, mode: BriefMode| BriefSpec {
        file: PathBuf::from(file),
        label: label.to_string(),
        window,
        mode,
        max_items: default_max_items(),
    };
    use BriefMode::{Brief, Forecast};
    vec![
        b(
            "home_summary.json",
            "Daily (Homepage • last 24 hours)",
            WindowKind::RollingHours { hours: 24 },
            Brief,
        ),
        b("briefs/daily.json", "Daily (last 24 hours)", WindowKind::RollingHours { hours: 24 }, Brief),
        b("briefs/weekly.json", "Weekly (last 7 days)", WindowKind::LastDays { days: 7 }, Brief),
        b("briefs/workday.json", "Workday rollup", WindowKind::WorkdayRollup, Brief),
        b("briefs/monthly_mtd.json", "Monthly (month-to-date)", WindowKind::MonthToDate, Brief),
        b("briefs/monthly_30d.json", "Monthly (last 30 days)", WindowKind::LastDays { days: 30 }, Brief),
        b("briefs/quarterly_qtd.json", "Quarter-to-date", WindowKind::QuarterToDate, Brief),
        b("briefs/ytd.json", "Year-to-date", WindowKind::YearToDate, Brief),
        b(
            "briefs/year_2025.json",
            "Year 2025 review",
            WindowKind::CalendarYear { year: 2025 },
            Brief,
        ),
        b(
            "briefs/forecast_rest_of_year.json",
            "Forward Watchlist (headline signals from last 30 days)",
            WindowKind::LastDays { days: 30 },
            Forecast,
        ),
    ]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShortlinkCfg {
    pub enabled: bool,
    pub table: PathBuf,
    /// Directory of redirect pages, relative to `data_dir`.
    pub dir: PathBuf,
    /// Public base URL of the site, used for the redirect page's own `og:url`.
    pub base_url: String,
    /// Items published inside this window get a shortlink.
    pub window: WindowKind,
}

impl Default for ShortlinkCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            table: PathBuf::from("shortlinks.json"),
            dir: PathBuf::from("s"),
            base_url: String::new(),
            window: WindowKind::RollingHours { hours: 60 },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeadlinesCfg {
    pub enabled: bool,
    pub max_items: usize,
    pub per_source_max: usize,
    pub lookback_hours: u32,
}

impl Default for HeadlinesCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            max_items: 8,
            per_source_max: 2,
            lookback_hours: 96,
        }
    }
}

impl DigestConfig {
    /// Load using `$DIGEST_CONFIG_PATH`, then `config/digest.toml`, then defaults.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::load_from(&default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: DigestConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Apply `DIGEST_RETENTION_DAYS` and re-sanitize.
    pub fn apply_env_overrides(&mut self) {
        if let Some(days) = std::env::var(ENV_RETENTION_DAYS)
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            self.archive.retention_days = days;
        }
        self.sanitize();
    }

    fn sanitize(&mut self) {
        self.fetch.concurrency = self.fetch.concurrency.max(1);
        self.fetch.timeout_secs = self.fetch.timeout_secs.max(1);
        self.archive.retention_days = self.archive.retention_days.max(1);
        for b in &mut self.briefs {
            b.max_items = b.max_items.max(1);
        }
    }

    /// Resolve a document path against `data_dir` (absolute paths pass through).
    pub fn data_path(&self, rel: &Path) -> PathBuf {
        self.paths.data_dir.join(rel)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.data_path(&self.paths.archive)
    }
}
