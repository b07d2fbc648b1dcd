// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One media reference attached to an entry (`media:content`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaRef {
    pub url: Option<String>,
}

/// One full-content block (`content:encoded` or Atom `<content>`), raw markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBlock {
    pub value: String,
}

/// A feed item before normalization. Every field is optional; defaults are
/// applied by the normalizer, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub author: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    /// UTC (year, month, day, hour, minute, second, ...), as parsed from the
    /// textual date. Fewer than six components is treated as unusable.
    pub published_parsed: Option<Vec<i64>>,
    pub summary: Option<String>,
    pub content: Vec<ContentBlock>,
    pub media_content: Vec<MediaRef>,
}

impl FeedEntry {
    /// Raw textual date: `published`, else `updated`.
    pub fn raw_date(&self) -> Option<&str> {
        self.published.as_deref().or(self.updated.as_deref())
    }
}

/// The normalized record written to substack.json. Field order is the
/// serialized order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleRecord {
    pub title: String,
    pub url: String,
    pub author: String,
    pub date: String,
    pub excerpt: String,
    pub image: String,
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>>;
    fn name(&self) -> &'static str;
}
