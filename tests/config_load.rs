// tests/config_load.rs
use serial_test::serial;
use std::path::Path;

use energy_news_digest::archive;
use energy_news_digest::config::{DigestConfig, FeedKind, ENV_CONFIG_PATH, ENV_RETENTION_DAYS};
use energy_news_digest::relevance::{Classifier, RuleSet, ENV_RULES_PATH};
use energy_news_digest::source_weights::SourceWeightsConfig;
use energy_news_digest::windows::WindowKind;
use energy_news_digest::ItemType;

fn clear_env() {
    std::env::remove_var(ENV_CONFIG_PATH);
    std::env::remove_var(ENV_RETENTION_DAYS);
    std::env::remove_var(ENV_RULES_PATH);
}

#[test]
#[serial]
fn shipped_digest_toml_parses() {
    clear_env();
    let cfg = DigestConfig::load_from(Path::new("config/digest.toml")).expect("config parses");
    assert_eq!(cfg.briefs.len(), 10);
    assert_eq!(cfg.sources.len(), 8);
    assert!(cfg.sources.iter().any(|s| s.kind == FeedKind::Youtube));
    assert!(cfg
        .briefs
        .iter()
        .any(|b| b.window == WindowKind::WorkdayRollup));
    assert_eq!(cfg.archive.retention_days, 365);
}

#[test]
#[serial]
fn shipped_rules_compile_and_classify() {
    clear_env();
    let rules = RuleSet::load(Path::new("config/rules.toml")).expect("rules load");
    assert_eq!(rules.admission.min_broad_hits, 2);
    let clf = Classifier::new(rules).expect("rules compile");

    assert!(clf.classify("New 500kV substation energized", ItemType::Article).admitted);
    assert!(!clf.classify("Senator debates farm bill", ItemType::Article).admitted);
    assert!(clf.classify("Electricity market reform lifts power prices", ItemType::Article).admitted);
}

#[test]
#[serial]
fn shipped_weights_and_bootstrap_load() {
    clear_env();
    let w = SourceWeightsConfig::load_from_file("config/source_weights.json");
    assert!(w.weight_for("Utility Dive") > w.default_weight);

    let seed = archive::load_bootstrap(Path::new("config/bootstrap_archive.json"));
    assert_eq!(seed.len(), 2);
    assert!(seed.iter().all(|i| !i.id.is_empty()));
}

#[test]
#[serial]
fn explicit_config_path_must_exist() {
    clear_env();
    std::env::set_var(ENV_CONFIG_PATH, "/definitely/not/here/digest.toml");
    let err = DigestConfig::load().unwrap_err();
    assert!(err.to_string().contains(ENV_CONFIG_PATH));
    clear_env();
}

#[test]
#[serial]
fn retention_override_from_env() {
    clear_env();
    std::env::set_var(ENV_CONFIG_PATH, "config/digest.toml");
    std::env::set_var(ENV_RETENTION_DAYS, "30");
    let cfg = DigestConfig::load().unwrap();
    assert_eq!(cfg.archive.retention_days, 30);

    std::env::set_var(ENV_RETENTION_DAYS, "not a number");
    let cfg = DigestConfig::load().unwrap();
    assert_eq!(cfg.archive.retention_days, 365, "unparseable override is ignored");
    clear_env();
}

#[test]
#[serial]
fn rules_path_override_from_env() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("rules.toml");
    std::fs::write(&p, "hard = ['\\bhvdc\\b']\nbroad = []\nnegative = []\n").unwrap();
    std::env::set_var(ENV_RULES_PATH, &p);

    let rules = RuleSet::load(Path::new("config/rules.toml")).unwrap();
    assert_eq!(rules.hard.len(), 1);
    let clf = Classifier::new(rules).unwrap();
    assert!(!clf.classify("New 500kV substation energized", ItemType::Article).admitted);
    assert!(clf.classify("HVDC cable laid", ItemType::Article).admitted);
    clear_env();
}
