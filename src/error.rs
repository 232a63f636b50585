//! Error taxonomy for a digest run.
//!
//! Persistence failures ([`DigestError::Storage`], [`DigestError::Corrupt`],
//! [`DigestError::Encode`]) are fatal. Every other variant is recovered
//! inside the pipeline (zero items, dropped entry, substituted timestamp, or a
//! stub brief) and its `Display` text is what a stub carries as its reason.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("source `{provider}` unavailable: {reason}")]
    SourceUnavailable { provider: String, reason: String },

    #[error("malformed entry: {0}")]
    MalformedEntry(String),

    #[error("unparseable timestamp `{0}`")]
    UnparseableTimestamp(String),

    #[error("{0}")]
    CredentialMissing(String),

    #[error("Brief generation failed: {0}")]
    GeneratorFailure(String),

    #[error("Not enough relevant items in this time window yet.")]
    EmptyWindow,

    #[error("cannot write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exists but cannot be decoded: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

impl DigestError {
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether the run must stop and surface this error to the operator.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Corrupt { .. } | Self::Encode(_))
    }
}

pub type DigestResult<T> = Result<T, DigestError>;
