//! SHA-256 helpers behind item ids, short ids and brief fingerprints.

use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Width of an item id in hex chars.
pub const ITEM_ID_LEN: usize = 16;
/// Width of a shortlink id in hex chars.
pub const SHORT_ID_LEN: usize = 10;

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn truncated(input: &str, width: usize) -> String {
    let mut full = sha256_hex(input.as_bytes());
    full.truncate(width);
    full
}

/// Stable item identity derived from the canonical URL.
pub fn item_id(canonical_url: &str) -> String {
    truncated(canonical_url, ITEM_ID_LEN)
}

/// Fixed-width short id for redirect pages.
pub fn short_id(canonical_url: &str) -> String {
    truncated(canonical_url, SHORT_ID_LEN)
}
