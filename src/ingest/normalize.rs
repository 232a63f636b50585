// src/ingest/normalize.rs
//! Raw entry → canonical [`Item`].

use chrono::{DateTime, Utc};
use url::Url;

use crate::error::DigestError;
use crate::ingest::normalize_text;
use crate::ingest::types::RawEntry;
use crate::item::{Item, ItemType};
use crate::timestamp::resolve_timestamp;

const SUMMARY_MAX_CHARS: usize = 320;
const TITLE_MAX_CHARS: usize = 300;

/// Query parameters that never change what a link points at.
fn is_tracking_param(key: &str) -> bool {
    let k = key.to_ascii_lowercase();
    k.starts_with("utm_") || matches!(k.as_str(), "fbclid" | "gclid" | "mc_cid" | "mc_eid")
}

/// Trim, drop the fragment and tracking parameters. Non-URL input is only trimmed.
pub fn canonical_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut u) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };
    u.set_fragment(None);
    if u.query().is_some() {
        let kept: Vec<(String, String)> = u
            .query_pairs()
            .filter(|(k, _)| !is_tracking_param(k))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if kept.is_empty() {
            u.set_query(None);
        } else {
            u.query_pairs_mut().clear().extend_pairs(kept);
        }
    }
    u.to_string()
}

/// Host without a leading `www.`.
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_ascii_lowercase()))
}

/// Provider video id from `watch?v=`, `youtu.be/<id>` or `/shorts/<id>` links.
pub fn video_id_from_url(url: &str) -> Option<String> {
    let u = Url::parse(url).ok()?;
    let host = u.host_str()?.trim_start_matches("www.").to_ascii_lowercase();
    if host == "youtu.be" {
        return u.path_segments()?.next().filter(|s| !s.is_empty()).map(str::to_string);
    }
    if host.ends_with("youtube.com") {
        if let Some((_, v)) = u.query_pairs().find(|(k, _)| k == "v") {
            return Some(v.into_owned()).filter(|s| !s.is_empty());
        }
        let mut segs = u.path_segments()?;
        if segs.next() == Some("shorts") {
            return segs.next().filter(|s| !s.is_empty()).map(str::to_string);
        }
    }
    None
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg")
}

/// Converts raw entries into items. Holds the few knobs normalization needs.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    blocked_domains: Vec<String>,
}

impl Normalizer {
    pub fn new(blocked_domains: &[String]) -> Self {
        Self {
            blocked_domains: blocked_domains
                .iter()
                .map(|d| d.trim().trim_start_matches("www.").to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Normalize one entry. `now` replaces a missing or unparseable date.
    pub fn normalize(&self, raw: RawEntry, now: DateTime<Utc>) -> Result<Item, DigestError> {
        let title = raw
            .title
            .as_deref()
            .map(|t| normalize_text(t, TITLE_MAX_CHARS))
            .unwrap_or_default();
        let url = raw.link.as_deref().map(canonical_url).unwrap_or_default();
        if title.is_empty() || url.is_empty() {
            return Err(DigestError::MalformedEntry(format!(
                "missing {} from {}",
                if title.is_empty() { "title" } else { "url" },
                raw.publisher
            )));
        }

        let domain = domain_of(&url);
        if let Some(d) = &domain {
            if self
                .blocked_domains
                .iter()
                .any(|b| d == b || d.ends_with(&format!(".{b}")))
            {
                return Err(DigestError::MalformedEntry(format!("blocked domain {d}")));
            }
        }

        let publisher = {
            let p = normalize_text(&raw.publisher, 120);
            if p.is_empty() {
                domain.clone().unwrap_or_else(|| "Source".to_string())
            } else {
                p
            }
        };

        let published = resolve_timestamp(raw.published.as_deref(), now);
        let mut item = Item::new(title, url, publisher, raw.item_type, published);

        item.summary = raw
            .description
            .as_deref()
            .map(|d| normalize_text(d, SUMMARY_MAX_CHARS))
            .filter(|s| !s.is_empty());
        item.source_category = raw
            .category
            .as_deref()
            .map(|c| normalize_text(c, 80))
            .filter(|c| !c.is_empty());
        item.image = raw.image.map(|i| i.trim().to_string()).filter(|i| !i.is_empty());

        if item.item_type == ItemType::Video {
            let vid = raw
                .video_id
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .or_else(|| video_id_from_url(&item.url));
            if let Some(v) = vid {
                item.image = Some(thumbnail_url(&v));
                item.video_id = Some(v);
            }
        }

        Ok(item)
    }

    /// Normalize a batch, dropping malformed entries. Returns (items, dropped).
    pub fn normalize_all(&self, raw: Vec<RawEntry>, now: DateTime<Utc>) -> (Vec<Item>, usize) {
        let mut dropped = 0usize;
        let mut out = Vec::with_capacity(raw.len());
        for entry in raw {
            match self.normalize(entry, now) {
                Ok(item) => out.push(item),
                Err(e) => {
                    dropped += 1;
                    tracing::debug!(target: "ingest", error = %e, "entry dropped");
                }
            }
        }
        (out, dropped)
    }
}
