use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use std::path::PathBuf;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::ingest::types::{ContentBlock, FeedEntry, FeedSource, MediaRef};

// quick-xml matches elements by local name, so `dc:creator` is `creator`,
// `content:encoded` is `encoded` and `media:content` is `content`.

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    // Lists, because `itunes:title` / `itunes:author` share these local names.
    #[serde(rename = "title", default)]
    titles: Vec<String>,
    link: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<String>,
    creator: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    encoded: Option<String>,
    #[serde(rename = "content", default)]
    media_content: Vec<XmlContent>,
}

/// Either a `media:content` (carries `@url`) or an Atom `<content>` (carries
/// text). Both arrive under the local name `content`.
#[derive(Debug, Deserialize)]
struct XmlContent {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "$text", default)]
    value: String,
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(rename = "title", default)]
    titles: Vec<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomPerson>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<AtomText>,
    #[serde(rename = "content", default)]
    contents: Vec<XmlContent>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomPerson {
    name: Option<String>,
}

/// Parse an RFC 2822 (RSS) or RFC 3339 (Atom) timestamp into a UTC
/// (year, month, day, hour, minute, second) tuple.
pub fn parse_date_tuple(ts: &str) -> Option<Vec<i64>> {
    let ts = ts.trim();
    let dt = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()
        .or_else(|| {
            // chrono is more forgiving about obsolete zone names ("GMT", "EST").
            chrono::DateTime::parse_from_rfc2822(ts)
                .ok()
                .and_then(|d| OffsetDateTime::from_unix_timestamp(d.timestamp()).ok())
        })?
        .to_offset(UtcOffset::UTC);
    Some(vec![
        i64::from(dt.year()),
        i64::from(u8::from(dt.month())),
        i64::from(dt.day()),
        i64::from(dt.hour()),
        i64::from(dt.minute()),
        i64::from(dt.second()),
    ])
}

impl From<RssItem> for FeedEntry {
    fn from(it: RssItem) -> Self {
        let published_parsed = it.pub_date.as_deref().and_then(parse_date_tuple);
        FeedEntry {
            title: it.titles.into_iter().next(),
            link: it.link.map(|l| l.trim().to_string()),
            author: it.creator.or_else(|| it.authors.into_iter().next()),
            published: it.pub_date,
            updated: None,
            published_parsed,
            summary: it.description,
            content: it
                .encoded
                .map(|value| ContentBlock { value })
                .into_iter()
                .collect(),
            media_content: it
                .media_content
                .into_iter()
                .map(|m| MediaRef { url: m.url })
                .collect(),
        }
    }
}

impl From<AtomEntry> for FeedEntry {
    fn from(it: AtomEntry) -> Self {
        // rel defaults to "alternate" when absent
        let link = it
            .links
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
            .or_else(|| it.links.first())
            .and_then(|l| l.href.clone());
        let published_parsed = it.published.as_deref().and_then(parse_date_tuple);
        let (media, content): (Vec<XmlContent>, Vec<XmlContent>) =
            it.contents.into_iter().partition(|c| c.url.is_some());
        FeedEntry {
            title: it.titles.into_iter().next().map(|t| t.value),
            link,
            author: it.authors.into_iter().find_map(|a| a.name),
            published: it.published,
            updated: it.updated,
            published_parsed,
            summary: it.summary.map(|t| t.value),
            content: content
                .into_iter()
                .map(|c| ContentBlock { value: c.value })
                .collect(),
            media_content: media.into_iter().map(|m| MediaRef { url: m.url }).collect(),
        }
    }
}

/// Local name of the first element in the document.
fn root_element(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().context("reading feed xml")? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
            }
            Event::Eof => bail!("feed xml has no root element"),
            _ => {}
        }
    }
}

/// Parse RSS 2.0 or Atom into raw entries, in document order.
pub fn parse_feed(s: &str) -> Result<Vec<FeedEntry>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(s);

    let entries: Vec<FeedEntry> = match root_element(&xml_clean)?.as_str() {
        "rss" => {
            let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
            rss.channel.items.into_iter().map(FeedEntry::from).collect()
        }
        "feed" => {
            let atom: AtomFeed = from_str(&xml_clean).context("parsing atom xml")?;
            atom.entries.into_iter().map(FeedEntry::from).collect()
        }
        other => bail!("unsupported feed root element <{other}>"),
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("feed_parse_ms").record(ms);
    counter!("feed_entries_total").increment(entries.len() as u64);
    Ok(entries)
}

pub struct SubstackRssProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    File(PathBuf),
    Http { url: String, client: reqwest::Client },
}

impl SubstackRssProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            mode: Mode::File(path.into()),
        }
    }

    pub fn from_url(url: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("building http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        })
    }

    /// Where entries come from, for log lines.
    pub fn origin(&self) -> String {
        match &self.mode {
            Mode::Fixture(_) => "<fixture>".to_string(),
            Mode::File(p) => p.display().to_string(),
            Mode::Http { url, .. } => url.clone(),
        }
    }
}

#[async_trait]
impl FeedSource for SubstackRssProvider {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>> {
        match &self.mode {
            Mode::Fixture(s) => parse_feed(s),
            Mode::File(path) => {
                let body = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading feed file {}", path.display()))?;
                parse_feed(&body)
            }
            Mode::Http { url, client } => {
                let resp = client
                    .get(url.as_str())
                    .send()
                    .await
                    .context("substack http get()")?
                    .error_for_status()
                    .context("substack non-2xx")?;
                let body = resp.text().await.context("substack http .text()")?;
                parse_feed(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "Substack"
    }
}

/// HTML named entities are not defined in XML; replace the common ones so the
/// deserializer does not reject otherwise well-formed feeds.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", "\u{00A0}")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}")
        .replace("&ldquo;", "\u{201C}")
        .replace("&rdquo;", "\u{201D}")
        .replace("&lsquo;", "\u{2018}")
        .replace("&rsquo;", "\u{2019}")
        .replace("&hellip;", "\u{2026}")
}
