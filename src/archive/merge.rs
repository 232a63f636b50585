//! Cross-run deduplication keyed by URL (id when the URL is missing).

use std::collections::HashMap;

use crate::item::Item;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub existing: usize,
    pub fresh: usize,
    pub added: usize,
    pub updated: usize,
    pub total: usize,
}

/// Fold a fresh record into the stored one for the same key. The fresh one
/// wins, but optional fields it lacks keep their stored value. `published`
/// keeps the earlier value so a feed that omits dates cannot make an item
/// look new.
fn merge_into(old: &mut Item, new: Item) {
    if !new.id.is_empty() {
        old.id = new.id;
    }
    if !new.title.trim().is_empty() {
        old.title = new.title;
    }
    if !new.url.is_empty() {
        old.url = new.url;
    }
    if !new.publisher.is_empty() {
        old.publisher = new.publisher;
    }
    old.item_type = new.item_type;
    if new.category.is_some() {
        old.category = new.category;
    }
    if new.source_category.is_some() {
        old.source_category = new.source_category;
    }
    if !new.tags.is_empty() {
        old.tags = new.tags;
    }
    old.published = old.published.min(new.published);
    old.score = new.score;
    if new.image.is_some() {
        old.image = new.image;
    }
    if new.summary.is_some() {
        old.summary = new.summary;
    }
    if new.video_id.is_some() {
        old.video_id = new.video_id;
    }
}

/// Merge `fresh` into `existing`. Existing order is kept and new keys are
/// appended. Never drops an existing key, so an empty `fresh` returns the
/// archive as it was.
pub fn merge(existing: Vec<Item>, fresh: Vec<Item>) -> (Vec<Item>, MergeStats) {
    let mut stats = MergeStats {
        existing: existing.len(),
        fresh: fresh.len(),
        ..Default::default()
    };

    let mut out: Vec<Item> = Vec::with_capacity(existing.len() + fresh.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(out.capacity());

    for it in existing {
        let key = it.key().to_string();
        match index.get(&key).copied() {
            // duplicate inside the stored archive itself
            Some(i) => {
                merge_into(&mut out[i], it);
            }
            None => {
                index.insert(key, out.len());
                out.push(it);
            }
        }
    }
    let stored = out.len();

    for it in fresh {
        let key = it.key().to_string();
        match index.get(&key).copied() {
            Some(i) => {
                merge_into(&mut out[i], it);
                if i < stored {
                    stats.updated += 1;
                }
            }
            None => {
                index.insert(key, out.len());
                out.push(it);
                stats.added += 1;
            }
        }
    }

    stats.total = out.len();
    tracing::info!(
        target: "archive",
        existing = stats.existing,
        fresh = stats.fresh,
        added = stats.added,
        updated = stats.updated,
        total = stats.total,
        "archive merged"
    );
    (out, stats)
}
