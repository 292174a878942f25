//! Timestamp normalization.
//!
//! Backend records carry instants either as native timestamps or as ISO-8601
//! text (older records were written by hand). Everything read from a record
//! goes through [`normalize_instant`]; malformed values become absent instead
//! of failing the snapshot.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::FieldValue;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Converts a raw field into a canonical instant.
pub fn normalize_instant(value: &FieldValue) -> Option<DateTime<Utc>> {
    match value {
        FieldValue::Timestamp(instant) => Some(*instant),
        FieldValue::Text(text) => parse_iso(text),
        FieldValue::Null
        | FieldValue::Bool(_)
        | FieldValue::Integer(_)
        | FieldValue::Float(_)
        | FieldValue::ServerTimestamp => None,
    }
}

/// Canonical stored form of a temporal field: `Timestamp` or `Null`.
///
/// Idempotent: canonicalizing an already canonical value returns it unchanged.
pub fn canonicalize(value: &FieldValue) -> FieldValue {
    normalize_instant(value).map_or(FieldValue::Null, FieldValue::Timestamp)
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(instant.with_timezone(&Utc));
    }
    parse_naive(trimmed).map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Parses an operator-typed date/time (`2025-03-01T14:30`) in the local zone.
pub fn parse_local_input(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(instant.with_timezone(&Utc));
    }
    let naive = parse_naive(trimmed)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Local, human-readable rendering; `-` when absent.
pub fn format_instant(instant: Option<DateTime<Utc>>) -> String {
    match instant {
        Some(instant) => instant
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_iso_is_read_as_utc() {
        let parsed = normalize_instant(&FieldValue::from("2025-01-02T03:04:05")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-01-02T03:04:05+00:00");
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(normalize_instant(&FieldValue::from("   ")), None);
    }

    #[test]
    fn pending_server_timestamp_is_absent() {
        assert_eq!(normalize_instant(&FieldValue::ServerTimestamp), None);
    }

    #[test]
    fn absent_formats_as_dash() {
        assert_eq!(format_instant(None), "-");
    }
}
