// src/ingest/providers/feed.rs
//! RSS 2.0 and YouTube (Atom) channel feeds.

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::config::{FeedKind, SourceCfg};
use crate::ingest::types::{RawEntry, SourceProvider};
use crate::item::ItemType;

// Prefixed elements are declared by local name with the qualified name as an
// alias, so matching does not depend on how the reader reports prefixes.

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "date", alias = "dc:date")]
    dc_date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    category: Vec<String>,
    #[serde(rename = "thumbnail", alias = "media:thumbnail")]
    thumbnail: Option<MediaUrl>,
    enclosure: Option<MediaUrl>,
}

#[derive(Debug, Deserialize)]
struct MediaUrl {
    #[serde(rename = "@url")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    #[serde(rename = "videoId", alias = "yt:videoId")]
    video_id: Option<String>,
    #[serde(default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    #[serde(rename = "group", alias = "media:group")]
    media: Option<MediaGroup>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaGroup {
    #[serde(rename = "description", alias = "media:description")]
    description: Option<String>,
}

/// Entities that are valid HTML but not XML show up in real feeds.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}

fn parse_rss(xml: &str, publisher: &str, item_type: ItemType) -> Result<Vec<RawEntry>> {
    let rss: Rss = from_str(&scrub_html_entities_for_xml(xml)).context("parsing rss xml")?;
    Ok(rss
        .channel
        .item
        .into_iter()
        .map(|it| RawEntry {
            title: it.title,
            link: it.link,
            description: it.description,
            published: it.pub_date.or(it.dc_date),
            publisher: publisher.to_string(),
            item_type,
            category: it.category.into_iter().next(),
            video_id: None,
            image: it
                .thumbnail
                .and_then(|m| m.url)
                .or_else(|| it.enclosure.and_then(|m| m.url)),
        })
        .collect())
}

fn parse_youtube(xml: &str, publisher: &str, item_type: ItemType) -> Result<Vec<RawEntry>> {
    let feed: AtomFeed =
        from_str(&scrub_html_entities_for_xml(xml)).context("parsing youtube atom xml")?;
    Ok(feed
        .entry
        .into_iter()
        // Entries without a video id are not playable; skip them here.
        .filter(|e| e.video_id.as_deref().is_some_and(|v| !v.trim().is_empty()))
        .map(|e| {
            let link = e
                .link
                .iter()
                .find(|l| l.rel.as_deref().unwrap_or("alternate") == "alternate")
                .and_then(|l| l.href.clone());
            RawEntry {
                title: e.title,
                link,
                description: e.media.and_then(|m| m.description),
                published: e.published.or(e.updated),
                publisher: publisher.to_string(),
                item_type,
                category: None,
                video_id: e.video_id,
                image: None,
            }
        })
        .collect())
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

/// A configured feed: RSS channel or YouTube channel, read over HTTP or from a fixture.
pub struct FeedProvider {
    name: String,
    kind: FeedKind,
    item_type: ItemType,
    max_entries: usize,
    mode: Mode,
}

impl FeedProvider {
    pub fn from_config(cfg: &SourceCfg, client: reqwest::Client, max_entries: usize) -> Self {
        Self {
            name: cfg.name.clone(),
            kind: cfg.kind,
            item_type: cfg.item_type(),
            max_entries,
            mode: Mode::Http {
                url: cfg.url.clone(),
                client,
            },
        }
    }

    pub fn from_fixture(name: &str, kind: FeedKind, xml: &str) -> Self {
        let item_type = match kind {
            FeedKind::Youtube => ItemType::Video,
            FeedKind::Rss => ItemType::Article,
        };
        Self {
            name: name.to_string(),
            kind,
            item_type,
            max_entries: usize::MAX,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    fn parse(&self, body: &str) -> Result<Vec<RawEntry>> {
        let mut out = match self.kind {
            FeedKind::Rss => parse_rss(body, &self.name, self.item_type)?,
            FeedKind::Youtube => parse_youtube(body, &self.name, self.item_type)?,
        };
        out.truncate(self.max_entries);
        Ok(out)
    }
}

/// Shared HTTP client for feed fetches. Per-fetch deadlines are enforced by the caller.
pub fn http_client(user_agent: &str, connect_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(connect_timeout)
        .build()
        .context("building feed http client")
}

#[async_trait]
impl SourceProvider for FeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawEntry>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse(s),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url.as_str())
                    .send()
                    .await
                    .with_context(|| format!("{} http get()", self.name))?
                    .error_for_status()
                    .with_context(|| format!("{} http status", self.name))?;
                let body = resp
                    .text()
                    .await
                    .with_context(|| format!("{} http .text()", self.name))?;
                self.parse(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
