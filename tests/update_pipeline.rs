// tests/update_pipeline.rs
//
// Fetch → normalize → write → validate, end to end against a temp data dir.

use anyhow::{anyhow, Result};
use blockwall_feeds::ingest::providers::substack_rss::SubstackRssProvider;
use blockwall_feeds::ingest::update_substack_at;
use blockwall_feeds::validate::FileStatus;
use blockwall_feeds::{
    default_targets, validate_all, ArticleRecord, FeedEntry, FeedSource, FeedsConfig,
    UpdateOutcome,
};
use chrono::NaiveDate;
use std::fs;

const SUBSTACK_XML: &str = include_str!("fixtures/substack_rss.xml");

struct Broken;

#[async_trait::async_trait]
impl FeedSource for Broken {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>> {
        Err(anyhow!("connection refused"))
    }
    fn name(&self) -> &'static str {
        "Broken"
    }
}

fn cfg_in(dir: &std::path::Path) -> FeedsConfig {
    FeedsConfig {
        data_dir: dir.to_path_buf(),
        ..FeedsConfig::default()
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
}

#[tokio::test]
async fn update_writes_six_articles_then_validates() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg_in(dir.path());

    let provider = SubstackRssProvider::from_fixture(SUBSTACK_XML);
    let out = update_substack_at(&provider, &cfg, today()).await;
    assert_eq!(
        out,
        UpdateOutcome::Written {
            path: cfg.substack_json(),
            count: 6
        }
    );

    let written: Vec<ArticleRecord> =
        serde_json::from_str(&fs::read_to_string(cfg.substack_json()).unwrap()).unwrap();
    assert_eq!(written.len(), 6);
    assert_eq!(written[0].date, "2024-03-15");

    let report = validate_all(&default_targets(&cfg.data_dir));
    assert!(report.all_valid);
    assert_eq!(report.files[0].status, FileStatus::Valid(6));
    // The other four files were never created.
    assert!(report.files[1..]
        .iter()
        .all(|f| f.status == FileStatus::NotFound));
}

#[tokio::test]
async fn failed_fetch_leaves_existing_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg_in(dir.path());
    let before = r#"[{"title":"old","url":"u","author":"a","date":"2023-01-01","excerpt":""}]"#;
    fs::write(cfg.substack_json(), before).unwrap();

    let out = update_substack_at(&Broken, &cfg, today()).await;
    match out {
        UpdateOutcome::KeptExisting { reason } => assert!(reason.contains("connection refused")),
        other => panic!("expected KeptExisting, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(cfg.substack_json()).unwrap(), before);

    // Validation still runs against what is on disk.
    let report = validate_all(&default_targets(&cfg.data_dir));
    assert!(report.all_valid);
    assert_eq!(report.files[0].status, FileStatus::Valid(1));
}

#[tokio::test]
async fn malformed_feed_counts_as_fetch_failure() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg_in(dir.path());

    let provider = SubstackRssProvider::from_fixture("<rss><channel><item><title>oops</item>");
    let out = update_substack_at(&provider, &cfg, today()).await;
    assert!(matches!(out, UpdateOutcome::KeptExisting { .. }));
    assert!(!cfg.substack_json().exists());
}

#[tokio::test]
async fn outcome_renders_status_line() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg_in(dir.path());
    let out = update_substack_at(&Broken, &cfg, today()).await;
    assert!(out.to_string().starts_with("Using existing substack.json"));
}
