// src/ingest/types.rs
use anyhow::Result;

use crate::item::ItemType;

/// One entry as a connector saw it, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub published: Option<String>, // as found in the feed
    pub publisher: String,         // e.g., "Reuters", "T&D World"
    pub item_type: ItemType,
    pub category: Option<String>,
    pub video_id: Option<String>,
    pub image: Option<String>,
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawEntry>>;
    fn name(&self) -> &str;
}
