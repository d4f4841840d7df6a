//! Datetime literals as the tracker emits them.
//!
//! The tracker is not consistent: search payloads carry
//! `2025-12-17T14:00:00.000+0000`, the agile API carries RFC 3339 with a
//! colon offset, and imported worklogs sometimes lack an offset entirely.
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

const OFFSET_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"];
const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Parse a tracker datetime, keeping its offset. Offset-less literals are
/// taken as UTC.
pub fn parse_tracker_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    for layout in OFFSET_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(raw, layout) {
            return Some(dt);
        }
    }
    let utc = FixedOffset::east_opt(0)?;
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return utc.from_local_datetime(&naive).single();
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| utc.from_local_datetime(&naive).single())
}

/// Same as [`parse_tracker_datetime`], normalized to UTC.
pub fn parse_tracker_utc(raw: &str) -> Option<DateTime<Utc>> {
    parse_tracker_datetime(raw).map(|dt| dt.with_timezone(&Utc))
}

/// First second through last second of the calendar month containing `now`.
pub fn month_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1).unwrap_or(now.date_naive());
    let next_first = if now.month() == 12 {
        NaiveDate::from_ymd_opt(now.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(now.year(), now.month() + 1, 1)
    };
    let last = next_first
        .and_then(|d| d.pred_opt())
        .unwrap_or(first);
    (day_start(first), day_end(last))
}

pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap_or_default())
}

pub fn day_end(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(23, 59, 59).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_layouts() {
        let a = parse_tracker_utc("2025-12-17T14:00:00.000+0000").unwrap();
        let b = parse_tracker_utc("2025-12-17T17:00:00+03:00").unwrap();
        let c = parse_tracker_utc("2025-12-17T14:00:00+0000").unwrap();
        let d = parse_tracker_utc("2025-12-17T14:00:00.000").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a, d);
        assert!(parse_tracker_utc("2025-12-17").is_some());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_tracker_utc("").is_none());
        assert!(parse_tracker_utc("yesterday").is_none());
        assert!(parse_tracker_utc("17.12.2025").is_none());
    }

    #[test]
    fn test_month_window_december() {
        let now = Utc.with_ymd_and_hms(2025, 12, 17, 10, 0, 0).unwrap();
        let (start, end) = month_window(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_month_window_february_leap() {
        let now = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        let (_, end) = month_window(now);
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap());
    }
}
