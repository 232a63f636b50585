//! One digest run: fetch → normalize → classify/score → merge → retain →
//! persist → briefs → headlines → shortlinks.
//!
//! Everything after fetching is computed from a single `now`, and nothing is
//! written until the in-memory archive is final.

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

use crate::archive::{self, MergeStats};
use crate::brief::{self, BriefJob, BriefOutcome, DynGenerator};
use crate::config::DigestConfig;
use crate::headlines;
use crate::ingest::{self, providers, types::SourceProvider, Normalizer};
use crate::item::{sort_newest_first, Item};
use crate::relevance::{Classifier, RuleSet};
use crate::scoring::Scorer;
use crate::shortlink::{self, ShortlinkStats, ShortlinkTable};
use crate::source_weights::SourceWeightsConfig;
use crate::windows::WindowSelector;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("classify_rejected_total", "Fresh items rejected by the classifier.");
        describe_counter!("brief_outcomes_total", "Brief results by outcome.");
        describe_counter!("archive_bootstrapped_total", "Runs that seeded the archive from the snapshot.");
    });
}

/// Items from one fetch pass plus what was lost on the way.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub items: Vec<Item>,
    pub raw: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub fetched_raw: usize,
    pub dropped_malformed: usize,
    pub rejected: usize,
    pub admitted: usize,
    pub bootstrapped: bool,
    pub merge: MergeStats,
    pub removed_by_retention: usize,
    pub archive_items: usize,
    pub briefs: Vec<(String, BriefOutcome)>,
    pub headlines: usize,
    pub shortlinks: Option<ShortlinkStats>,
}

pub struct Pipeline {
    cfg: DigestConfig,
    classifier: Classifier,
    scorer: Scorer,
    normalizer: Normalizer,
    providers: Vec<Arc<dyn SourceProvider>>,
    generator: DynGenerator,
}

impl Pipeline {
    /// Wire everything from configuration files and the environment.
    pub fn from_config(cfg: DigestConfig) -> anyhow::Result<Self> {
        let rules = RuleSet::load(&cfg.paths.rules)?;
        let weights = SourceWeightsConfig::load_from_file(&cfg.paths.source_weights);
        let providers = providers::from_config(&cfg)?;
        let generator = brief::build_generator(&cfg.generator);
        Self::new(cfg, rules, weights, providers, generator)
    }

    pub fn new(
        cfg: DigestConfig,
        rules: RuleSet,
        weights: SourceWeightsConfig,
        providers: Vec<Arc<dyn SourceProvider>>,
        generator: DynGenerator,
    ) -> anyhow::Result<Self> {
        let scorer = Scorer::new(weights, rules.scoring.clone());
        let classifier = Classifier::new(rules)?;
        let normalizer = Normalizer::new(&cfg.fetch.blocked_domains);
        Ok(Self {
            cfg,
            classifier,
            scorer,
            normalizer,
            providers,
            generator,
        })
    }

    pub fn config(&self) -> &DigestConfig {
        &self.cfg
    }

    /// Fetch every source and normalize. Timestamps that are missing or bad
    /// become the fetch time.
    pub async fn fetch(&self) -> FetchOutcome {
        let raw = ingest::fetch_all(
            &self.providers,
            self.cfg.fetch.concurrency,
            Duration::from_secs(self.cfg.fetch.timeout_secs),
        )
        .await;
        let n_raw = raw.len();
        let (items, dropped) = self.normalizer.normalize_all(raw, Utc::now());
        if dropped > 0 {
            counter!("ingest_dropped_total").increment(dropped as u64);
        }
        FetchOutcome {
            items,
            raw: n_raw,
            dropped,
        }
    }

    /// Full run against the live sources.
    pub async fn run(&self) -> anyhow::Result<RunReport> {
        let fetched = self.fetch().await;
        let now = Utc::now();
        let mut report = self.run_with(fetched.items, now).await?;
        report.fetched_raw = fetched.raw;
        report.dropped_malformed = fetched.dropped;
        Ok(report)
    }

    /// Rebuild archive-derived outputs without fetching.
    pub async fn run_offline(&self) -> anyhow::Result<RunReport> {
        self.run_with(Vec::new(), Utc::now()).await
    }

    /// Everything after fetching, for already-normalized `fresh` items.
    pub async fn run_with(&self, fresh: Vec<Item>, now: DateTime<Utc>) -> anyhow::Result<RunReport> {
        ensure_metrics_described();
        let mut report = RunReport::default();

        // 1) Classify and score fresh items; rejected ones never reach the archive.
        let mut admitted = Vec::with_capacity(fresh.len());
        for mut it in fresh {
            let c = self.classifier.classify_item(&it);
            if !c.admitted {
                report.rejected += 1;
                continue;
            }
            Classifier::apply_tags(&mut it, &c);
            it.score = self.scorer.score(&it, c.tags.len(), now);
            admitted.push(it);
        }
        report.admitted = admitted.len();
        counter!("classify_rejected_total").increment(report.rejected as u64);

        // 2) Merge with the stored archive (or seed it).
        let archive_path = self.cfg.archive_path();
        let existing = archive::load(&archive_path)?;
        let merged = if existing.is_empty() && admitted.is_empty() {
            report.bootstrapped = true;
            counter!("archive_bootstrapped_total").increment(1);
            match &self.cfg.archive.bootstrap {
                Some(p) => archive::load_bootstrap(p),
                None => Vec::new(),
            }
        } else {
            let (m, stats) = archive::merge(existing, admitted);
            report.merge = stats;
            m
        };

        // 3) Retention, then bring tags and scores up to date.
        let (mut items, removed) =
            archive::apply_retention(merged, now, self.cfg.archive.retention_days);
        report.removed_by_retention = removed;
        for it in &mut items {
            let c = self.classifier.classify_item(it);
            if c.admitted {
                Classifier::apply_tags(it, &c);
            }
            it.score = self.scorer.score(it, c.tags.len(), now);
        }

        // 4) Persist the archive; from here on it is the source of truth.
        sort_newest_first(&mut items);
        report.archive_items = archive::save(&archive_path, items.clone(), now)?;

        // 5) Briefs, one per configured window; a failing window only stubs itself.
        let selector = WindowSelector::new(now);
        for spec in &self.cfg.briefs {
            let window = selector.resolve(spec.window);
            let in_window = window.slice(&items);
            let path = self.cfg.data_path(&spec.file);
            let job = BriefJob {
                path: &path,
                label: &spec.label,
                mode: spec.mode,
                max_items: spec.max_items,
            };
            let outcome = brief::generate_brief_file(
                job,
                &in_window,
                &self.classifier,
                self.generator.as_ref(),
                now,
            )
            .await?;
            let tag = match &outcome {
                BriefOutcome::Generated => "generated",
                BriefOutcome::Unchanged => "unchanged",
                BriefOutcome::Stub(_) => "stub",
            };
            counter!("brief_outcomes_total", "outcome" => tag).increment(1);
            tracing::info!(target: "brief", label = %spec.label, window = %window.name, in_window = in_window.len(), outcome = tag);
            report.briefs.push((spec.label.clone(), outcome));
        }

        // 6) Top headlines.
        if self.cfg.headlines.enabled {
            let top = headlines::select(&items, &self.classifier, &self.cfg.headlines, &selector);
            headlines::write(&self.cfg.data_path(&self.cfg.paths.headlines), &top, now)?;
            report.headlines = top.len();
        }

        // 7) Shortlinks for items in the current window.
        if self.cfg.shortlinks.enabled {
            let sl = &self.cfg.shortlinks;
            let window = selector.resolve(sl.window);
            let visible: Vec<&Item> = window
                .slice(&items)
                .into_iter()
                .filter(|it| self.classifier.classify_item(it).admitted)
                .collect();
            let table_path = self.cfg.data_path(&sl.table);
            let mut table = ShortlinkTable::load(&table_path)?;
            let before = table.len();
            let stats = shortlink::emit(&visible, &mut table, &self.cfg.data_path(&sl.dir), &sl.base_url)?;
            if table.len() != before || !table_path.exists() {
                table.save(&table_path)?;
            }
            report.shortlinks = Some(stats);
        }

        crate::metrics::record_run(report.archive_items, now.timestamp());
        tracing::info!(
            target: "pipeline",
            admitted = report.admitted,
            rejected = report.rejected,
            archive = report.archive_items,
            removed = report.removed_by_retention,
            bootstrapped = report.bootstrapped,
            "run complete"
        );
        Ok(report)
    }
}
