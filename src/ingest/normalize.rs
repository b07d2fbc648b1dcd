// src/ingest/normalize.rs
//! Feed entry → `ArticleRecord` normalization.
//!
//! Each field has its own fallback rule:
//! - image: first `media:content` url, else first `<img src="...">` in the first
//!   content block, else the configured placeholder
//! - date: structured UTC tuple formatted `YYYY-MM-DD`, else today's local date
//! - excerpt: tag-stripped summary cut to `excerpt_chars`, with `...` when the
//!   raw summary was longer than that
//! - author: entry author if non-empty, else the configured fallback
//!
//! Only the first `max_articles` entries are looked at.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::config::FeedsConfig;
use crate::ingest::types::{ArticleRecord, FeedEntry};

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag regex"))
}

fn re_img_src() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r#"<img[^>]+src="([^"]+)""#).expect("img regex"))
}

/// Remove every `<...>` run. Unterminated `<` is left as text.
pub fn strip_tags(s: &str) -> String {
    re_tags().replace_all(s, "").into_owned()
}

/// First `<img ... src="...">` in the markup, if any.
pub fn first_img_src(markup: &str) -> Option<String> {
    re_img_src()
        .captures(markup)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn resolve_image(entry: &FeedEntry, fallback: &str) -> String {
    if let Some(first) = entry.media_content.first() {
        return first
            .url
            .clone()
            .unwrap_or_else(|| fallback.to_string());
    }
    if let Some(block) = entry.content.first() {
        if let Some(src) = first_img_src(&block.value) {
            return src;
        }
    }
    fallback.to_string()
}

/// Build a date-time from (year, month, day, hour, minute, second).
/// Extra trailing components are ignored.
pub fn date_from_tuple(parts: &[i64]) -> Option<NaiveDateTime> {
    let [y, mo, d, h, mi, s] = parts.get(..6)? else {
        return None;
    };
    // Four-digit years only; chrono would otherwise accept negative ones.
    let year = i32::try_from(*y).ok().filter(|y| (1..=9999).contains(y))?;
    let date = NaiveDate::from_ymd_opt(
        year,
        u32::try_from(*mo).ok()?,
        u32::try_from(*d).ok()?,
    )?;
    let time = NaiveTime::from_hms_opt(
        u32::try_from(*h).ok()?,
        u32::try_from(*mi).ok()?,
        u32::try_from(*s).ok()?,
    )?;
    Some(date.and_time(time))
}

pub fn resolve_date(parsed: Option<&[i64]>, today: NaiveDate) -> String {
    parsed
        .and_then(date_from_tuple)
        .map(|dt| dt.date())
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

pub fn resolve_excerpt(summary: Option<&str>, max_chars: usize) -> String {
    let Some(raw) = summary else {
        return String::new();
    };
    let stripped = strip_tags(raw);
    let head: String = stripped.chars().take(max_chars).collect();
    let mut excerpt = head.trim().to_string();
    // Length check is on the raw summary, markup included.
    if raw.chars().count() > max_chars {
        excerpt.push_str("...");
    }
    excerpt
}

pub fn resolve_author(author: Option<&str>, fallback: &str) -> String {
    match author {
        Some(a) if !a.trim().is_empty() => a.to_string(),
        _ => fallback.to_string(),
    }
}

pub fn normalize_entry(entry: &FeedEntry, cfg: &FeedsConfig, today: NaiveDate) -> ArticleRecord {
    ArticleRecord {
        title: entry.title.clone().unwrap_or_default(),
        url: entry.link.clone().unwrap_or_default(),
        author: resolve_author(entry.author.as_deref(), &cfg.fallback_author),
        date: resolve_date(entry.published_parsed.as_deref(), today),
        excerpt: resolve_excerpt(entry.summary.as_deref(), cfg.excerpt_chars),
        image: resolve_image(entry, &cfg.fallback_image),
    }
}

/// Truncate to `cfg.max_articles` first, then normalize in source order.
pub fn normalize_entries(
    entries: &[FeedEntry],
    cfg: &FeedsConfig,
    today: NaiveDate,
) -> Vec<ArticleRecord> {
    entries
        .iter()
        .take(cfg.max_articles)
        .map(|e| normalize_entry(e, cfg, today))
        .collect()
}

/// Processing date used when an entry has no usable published tuple.
pub fn today_local() -> NaiveDate {
    chrono::Local::now().date_naive()
}
