//! Timestamp normalization.
//!
//! Venues hand us either a millisecond epoch integer (Binance, Huobi, OKX) or
//! an ISO-8601 string (Coinbase). Both are converted to the canonical
//! internal form `YYYY-MM-DD HH:MM:SS.uuuuuu UTC`. Anything unrecognized is
//! returned unchanged rather than dropped — a bad timestamp is treated as a
//! cosmetic defect, not a reason to lose the record.

use chrono::{DateTime, NaiveDateTime, Utc};

const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f UTC";
const CANONICAL_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f UTC";

/// Normalize a venue-supplied timestamp to `YYYY-MM-DD HH:MM:SS.uuuuuu UTC`.
///
/// Accepts a millisecond epoch (all-digit string, optionally negative) or an
/// RFC 3339 / ISO-8601 string. Returns the input unchanged if neither parses.
pub fn normalize_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return raw.to_string();
    }

    if let Some(dt) = parse_epoch_millis(trimmed) {
        return dt.format(CANONICAL_FORMAT).to_string();
    }

    if let Some(dt) = parse_rfc3339(trimmed) {
        return dt.format(CANONICAL_FORMAT).to_string();
    }

    raw.to_string()
}

/// Normalize an epoch expressed directly in milliseconds (e.g. Huobi's `ts`,
/// OKX's `ts`, Binance's `E`), skipping the string round-trip callers would
/// otherwise need.
pub fn normalize_epoch_millis(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.format(CANONICAL_FORMAT).to_string(),
        None => ms.to_string(),
    }
}

fn parse_epoch_millis(s: &str) -> Option<DateTime<Utc>> {
    let negative = s.starts_with('-');
    let digits = if negative { &s[1..] } else { s };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let ms: i64 = s.parse().ok()?;
    DateTime::<Utc>::from_timestamp_millis(ms)
}

/// Parses a string already in the canonical `normalize_timestamp` output
/// format back into a `DateTime<Utc>`. Used when reloading a rolling buffer
/// from disk, where only the canonical string survives.
pub fn parse_canonical(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, CANONICAL_PARSE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binance_epoch_millis() {
        assert_eq!(
            normalize_timestamp("1700000000000"),
            "2023-11-14 22:13:20.000000 UTC"
        );
    }

    #[test]
    fn coinbase_iso8601_with_millis() {
        assert_eq!(
            normalize_timestamp("2023-11-14T22:13:20.001Z"),
            "2023-11-14 22:13:20.001000 UTC"
        );
    }

    #[test]
    fn unparseable_input_passes_through() {
        assert_eq!(normalize_timestamp("not-a-timestamp"), "not-a-timestamp");
    }

    #[test]
    fn empty_input_passes_through() {
        assert_eq!(normalize_timestamp(""), "");
    }

    #[test]
    fn normalize_epoch_millis_matches_string_path() {
        assert_eq!(
            normalize_epoch_millis(1_700_000_000_000),
            normalize_timestamp("1700000000000")
        );
    }

    #[test]
    fn parse_canonical_round_trips_through_normalize() {
        let canonical = normalize_epoch_millis(1_700_000_000_000);
        let parsed = parse_canonical(&canonical).unwrap();
        assert_eq!(parsed.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn parse_canonical_rejects_garbage() {
        assert_eq!(parse_canonical("not a timestamp"), None);
    }
}
