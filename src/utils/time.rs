//! Timestamp utilities: ISO-8601 rendering/parsing and the human display format.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};

/// "Never": the smallest representable timestamp, `0001-01-01T00:00:00`.
pub fn never() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Current UTC time, truncated to microseconds (storage precision).
pub fn now() -> NaiveDateTime {
    truncate_micros(Utc::now().naive_utc())
}

pub fn truncate_micros(ts: NaiveDateTime) -> NaiveDateTime {
    let micros = ts.nanosecond() / 1_000;
    ts.with_nanosecond(micros * 1_000).unwrap_or(ts)
}

/// Render as ISO-8601. The fraction is printed (6 digits) only when non-zero.
pub fn to_iso(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts `T` or space as separator, an optional fraction, an optional
/// minutes-only time and a bare date. Offsets are converted to UTC.
pub fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(truncate_micros(dt.with_timezone(&Utc).naive_utc()));
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(truncate_micros(ts));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `DD Mon HH:MM AM/PM`, e.g. `01 Jan 09:30 AM`.
pub fn to_display(ts: &NaiveDateTime) -> String {
    ts.format("%d %b %I:%M %p").to_string()
}
