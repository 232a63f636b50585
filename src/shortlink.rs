//! Short ids and static redirect pages.
//!
//! The table `id → url` only grows. An id, once written, keeps pointing at the
//! same URL; a second URL hashing to a taken id is reported and gets no link.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{DigestError, DigestResult};
use crate::hashing::short_id;
use crate::item::Item;
use crate::store;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("shortlink_created_total", "New short ids assigned.");
        describe_counter!(
            "shortlink_collisions_total",
            "URLs refused because their short id maps to another URL."
        );
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Created(String),
    Existing(String),
    Collision { id: String, existing_url: String },
}

impl Assignment {
    pub fn id(&self) -> Option<&str> {
        match self {
            Assignment::Created(id) | Assignment::Existing(id) => Some(id),
            Assignment::Collision { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortlinkTable {
    map: BTreeMap<String, String>,
}

impl ShortlinkTable {
    /// Load the table. A missing file starts empty; a file that is present
    /// but cannot be read or decoded is an error, never an empty table.
    pub fn load(path: &Path) -> DigestResult<Self> {
        Ok(Self {
            map: store::load_json_strict(path)?.unwrap_or_default(),
        })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn resolve(&self, id: &str) -> Option<&str> {
        self.map.get(id).map(String::as_str)
    }

    pub fn assign(&mut self, url: &str) -> Assignment {
        ensure_metrics_described();
        let id = short_id(url);
        match self.map.get(&id) {
            Some(existing) if existing == url => Assignment::Existing(id),
            Some(existing) => {
                counter!("shortlink_collisions_total").increment(1);
                tracing::warn!(target: "shortlink", %id, existing = %existing, refused = %url, "short id collision");
                Assignment::Collision {
                    id,
                    existing_url: existing.clone(),
                }
            }
            None => {
                counter!("shortlink_created_total").increment(1);
                self.map.insert(id.clone(), url.to_string());
                Assignment::Created(id)
            }
        }
    }

    /// Persist as a key-sorted JSON object.
    pub fn save(&self, path: &Path) -> DigestResult<()> {
        store::write_json_atomic(path, &self.map)
    }
}

/// Redirect page for one item: link-preview metadata plus an immediate redirect.
pub fn redirect_html(item: &Item, id: &str, base_url: &str) -> String {
    use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

    let title = if item.title.trim().is_empty() {
        "Redirecting…"
    } else {
        item.title.as_str()
    };
    let desc = item.summary.as_deref().unwrap_or(&item.publisher);
    let target = item.url.as_str();

    let mut meta = String::new();
    meta.push_str(&format!("  <meta property=\"og:title\" content=\"{}\">\n", attr(title)));
    meta.push_str(&format!("  <meta property=\"og:description\" content=\"{}\">\n", attr(desc)));
    if let Some(img) = item.image.as_deref() {
        meta.push_str(&format!("  <meta property=\"og:image\" content=\"{}\">\n", attr(img)));
        meta.push_str("  <meta name=\"twitter:card\" content=\"summary_large_image\">\n");
    }
    if !base_url.is_empty() {
        let own = format!("{}/s/{}/", base_url.trim_end_matches('/'), id);
        meta.push_str(&format!("  <meta property=\"og:url\" content=\"{}\">\n", attr(&own)));
    }

    // serde_json string literal is a safe JS string; "</" is broken up for the HTML parser.
    let js_target = serde_json::to_string(target)
        .unwrap_or_else(|_| "\"/\"".to_string())
        .replace("</", "<\\/");

    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  <title>{t}</title>\n  <link rel=\"canonical\" href=\"{u}\">\n{meta}  <meta http-equiv=\"refresh\" content=\"0; url={u}\">\n  <script>location.replace({js});</script>\n</head>\n<body>\n  <p><a href=\"{u}\">{t}</a></p>\n</body>\n</html>\n",
        t = text(title),
        u = attr(target),
        meta = meta,
        js = js_target,
    )
}

/// Write `bytes` to `path` unless the file already holds exactly them.
fn write_if_changed(path: &Path, bytes: &[u8]) -> DigestResult<bool> {
    match fs::read(path) {
        Ok(cur) if cur == bytes => Ok(false),
        Ok(_) => store::write_bytes_atomic(path, bytes).map(|_| true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            store::write_bytes_atomic(path, bytes).map(|_| true)
        }
        Err(e) => Err(DigestError::storage(path, e)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShortlinkStats {
    pub created: usize,
    pub existing: usize,
    pub collisions: usize,
    pub pages_written: usize,
}

/// Assign ids for `items` and (re)write their redirect pages under `dir`.
pub fn emit(
    items: &[&Item],
    table: &mut ShortlinkTable,
    dir: &Path,
    base_url: &str,
) -> DigestResult<ShortlinkStats> {
    let mut stats = ShortlinkStats::default();
    for it in items {
        if it.url.is_empty() {
            continue;
        }
        let a = table.assign(&it.url);
        match &a {
            Assignment::Created(_) => stats.created += 1,
            Assignment::Existing(_) => stats.existing += 1,
            Assignment::Collision { .. } => {
                stats.collisions += 1;
                continue;
            }
        }
        if let Some(id) = a.id() {
            let page = redirect_html(it, id, base_url);
            if write_if_changed(&dir.join(id).join("index.html"), page.as_bytes())? {
                stats.pages_written += 1;
            }
        }
    }
    tracing::info!(
        target: "shortlink",
        created = stats.created,
        existing = stats.existing,
        collisions = stats.collisions,
        pages_written = stats.pages_written,
        "shortlinks emitted"
    );
    Ok(stats)
}
