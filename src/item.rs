// src/item.rs
//! Canonical content record shared by every stage of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hashing;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    Article,
    Video,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Article => "article",
            ItemType::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(rename = "type", default)]
    pub item_type: ItemType,
    /// Primary taxonomy tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Category text as the feed published it. Classification input only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(with = "crate::timestamp::serde_utc", default = "Utc::now")]
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "videoId", default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl Item {
    /// Minimal constructor; optional fields start empty.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        publisher: impl Into<String>,
        item_type: ItemType,
        published: DateTime<Utc>,
    ) -> Self {
        let url = url.into();
        Self {
            id: hashing::item_id(&url),
            title: title.into(),
            url,
            publisher: publisher.into(),
            item_type,
            category: None,
            source_category: None,
            tags: Vec::new(),
            published,
            score: 0.0,
            image: None,
            summary: None,
            video_id: None,
        }
    }

    /// Merge key: the URL, or the id for records that somehow lost it.
    pub fn key(&self) -> &str {
        if self.url.is_empty() {
            &self.id
        } else {
            &self.url
        }
    }

    /// Fill a missing id from the URL (legacy archive records).
    pub fn ensure_id(&mut self) {
        if self.id.is_empty() && !self.url.is_empty() {
            self.id = hashing::item_id(&self.url);
        }
    }
}

/// Newest first; equal timestamps fall back to URL so the order is total.
pub fn sort_newest_first(items: &mut [Item]) {
    items.sort_by(|a, b| b.published.cmp(&a.published).then_with(|| a.url.cmp(&b.url)));
}
