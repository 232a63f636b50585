// src/lib.rs
// Public library surface for the `digest` binary and integration tests.

pub mod archive;
pub mod brief;
pub mod config;
pub mod error;
pub mod hashing;
pub mod headlines;
pub mod ingest;
pub mod item;
pub mod metrics;
pub mod pipeline;
pub mod relevance;
pub mod scoring;
pub mod shortlink;
pub mod source_weights;
pub mod store;
pub mod timestamp;
pub mod windows;

// ---- Re-exports for stable public API ----
pub use crate::config::DigestConfig;
pub use crate::error::{DigestError, DigestResult};
pub use crate::item::{Item, ItemType};
pub use crate::pipeline::{Pipeline, RunReport};
