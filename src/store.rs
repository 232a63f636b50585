// src/store.rs
//! File persistence: lenient reads, atomic whole-file writes.
//!
//! Writers go through a sibling `*.tmp` file followed by `rename`, so a reader
//! of the static site never observes a half-written document.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{DigestError, DigestResult};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `bytes` atomically, creating parent directories.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> DigestResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DigestError::storage(parent, e))?;
    }
    let tmp = tmp_path(path);
    let mut f = fs::File::create(&tmp).map_err(|e| DigestError::storage(&tmp, e))?;
    f.write_all(bytes)
        .and_then(|_| f.sync_all())
        .map_err(|e| DigestError::storage(&tmp, e))?;
    drop(f);
    fs::rename(&tmp, path).map_err(|e| DigestError::storage(path, e))?;
    Ok(())
}

/// Pretty JSON with a trailing newline.
pub fn to_json_bytes<T: Serialize>(value: &T) -> DigestResult<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(value)?;
    out.push(b'\n');
    Ok(out)
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> DigestResult<()> {
    write_bytes_atomic(path, &to_json_bytes(value)?)
}

/// Read and decode a document that must not be silently replaced. Missing
/// is `Ok(None)`; unreadable or undecodable is an error.
pub fn load_json_strict<T: DeserializeOwned>(path: &Path) -> DigestResult<Option<T>> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DigestError::storage(path, e)),
    };
    serde_json::from_str(&s)
        .map(Some)
        .map_err(|source| DigestError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Read and decode a JSON document. Missing or malformed files yield `None`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable document");
            return None;
        }
    };
    match serde_json::from_str(&s) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed document ignored");
            None
        }
    }
}
