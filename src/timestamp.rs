//! Timestamp parsing and the canonical ISO-8601 rendering used in every
//! persisted document.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use time::{
    format_description::well_known::{Rfc2822, Rfc3339},
    OffsetDateTime,
};

use crate::error::DigestError;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn offset_to_utc(dt: OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
}

/// Parse the date formats feeds commonly emit. Naive values are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DigestError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(DigestError::UnparseableTimestamp(raw.to_string()));
    }

    if let Some(dt) = OffsetDateTime::parse(s, &Rfc3339).ok().and_then(offset_to_utc) {
        return Ok(dt);
    }
    if let Some(dt) = OffsetDateTime::parse(s, &Rfc2822).ok().and_then(offset_to_utc) {
        return Ok(dt);
    }
    // chrono is more lenient with RFC 2822 variants (e.g. "GMT", "UT").
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(DigestError::UnparseableTimestamp(raw.to_string()))
}

/// Parse `raw`, substituting `now` when it is absent or unparseable.
pub fn resolve_timestamp(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    match raw {
        None => now,
        Some(s) => parse_timestamp(s).unwrap_or_else(|e| {
            tracing::warn!(target: "ingest", error = %e, "timestamp replaced with run time");
            now
        }),
    }
}

/// `2026-10-19T08:30:00Z`
pub fn iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Serde adapter for persisted timestamps: always written as [`iso`], read
/// leniently so a hand-edited or legacy document never fails to load.
pub mod serde_utc {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&iso(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(resolve_timestamp(raw.as_deref(), Utc::now()))
    }
}
