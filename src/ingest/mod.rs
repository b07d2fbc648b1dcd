// src/ingest/mod.rs
pub mod normalize;
pub mod providers;
pub mod store;
pub mod types;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use std::fmt;
use std::path::PathBuf;

use crate::config::FeedsConfig;
use crate::ingest::normalize::{normalize_entries, today_local};
use crate::ingest::store::write_articles;
use crate::ingest::types::{ArticleRecord, FeedSource};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_entries_total", "Raw entries parsed from feeds.");
        describe_counter!(
            "feed_fetch_errors_total",
            "Feed fetch/parse errors; the stored file was left untouched."
        );
        describe_counter!(
            "feed_articles_written_total",
            "Article records written to disk."
        );
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Result of the update step. Never an error: a failed fetch or write keeps
/// whatever file was already on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Written { path: PathBuf, count: usize },
    KeptExisting { reason: String },
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Written { path, count } => {
                write!(f, "Updated {} with {} articles", path.display(), count)
            }
            UpdateOutcome::KeptExisting { reason } => {
                write!(f, "Using existing substack.json ({reason})")
            }
        }
    }
}

/// Fetch + normalize. Any fetch/parse error yields `Err`, never a partial list.
pub async fn fetch_articles(
    source: &dyn FeedSource,
    cfg: &FeedsConfig,
    today: NaiveDate,
) -> Result<Vec<ArticleRecord>> {
    let entries = source
        .fetch_entries()
        .await
        .with_context(|| format!("fetching {} feed", source.name()))?;
    Ok(normalize_entries(&entries, cfg, today))
}

/// Refresh substack.json from `source`, dating undated entries with today's
/// local date.
pub async fn update_substack(source: &dyn FeedSource, cfg: &FeedsConfig) -> UpdateOutcome {
    update_substack_at(source, cfg, today_local()).await
}

pub async fn update_substack_at(
    source: &dyn FeedSource,
    cfg: &FeedsConfig,
    today: NaiveDate,
) -> UpdateOutcome {
    ensure_metrics_described();

    let articles = match fetch_articles(source, cfg, today).await {
        Ok(a) => a,
        Err(e) => {
            tracing::warn!(target: "feeds", error = ?e, provider = source.name(), "feed fetch failed");
            counter!("feed_fetch_errors_total").increment(1);
            return UpdateOutcome::KeptExisting {
                reason: format!("RSS fetch failed: {e:#}"),
            };
        }
    };

    if articles.is_empty() {
        tracing::info!(target: "feeds", provider = source.name(), "feed had no entries");
        return UpdateOutcome::KeptExisting {
            reason: "feed had no entries".to_string(),
        };
    }

    let path = cfg.substack_json();
    match write_articles(&path, &articles) {
        Ok(()) => {
            counter!("feed_articles_written_total").increment(articles.len() as u64);
            tracing::info!(
                target: "feeds",
                file = %path.display(),
                count = articles.len(),
                "articles written"
            );
            UpdateOutcome::Written {
                path,
                count: articles.len(),
            }
        }
        Err(e) => {
            tracing::error!(target: "feeds", error = ?e, file = %path.display(), "write failed");
            UpdateOutcome::KeptExisting {
                reason: format!("write failed: {e:#}"),
            }
        }
    }
}
