//! Loose end-time parsing and remaining-time formatting.
//!
//! Parsing is kept apart from identity: identity always uses the raw
//! string, so parser changes can never affect deduplication.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// Naive layouts tried in order, interpreted in the host's local time zone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse a raw end time into epoch milliseconds.
///
/// Tries, in order: integer epoch milliseconds, RFC 3339 (`Z` or offset),
/// then the naive layouts in [`NAIVE_FORMATS`]. The first strictly positive
/// result wins. Blank or unrecognized input yields `None`.
#[must_use]
pub fn parse_end_time(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsers: [fn(&str) -> Option<i64>; 3] = [parse_epoch_millis, parse_rfc3339, parse_naive_local];
    parsers
        .iter()
        .filter_map(|parse| parse(trimmed))
        .find(|millis| *millis > 0)
}

fn parse_epoch_millis(s: &str) -> Option<i64> {
    s.parse::<i64>().ok()
}

fn parse_rfc3339(s: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

fn parse_naive_local(s: &str) -> Option<i64> {
    NAIVE_FORMATS.iter().find_map(|format| {
        let naive = NaiveDateTime::parse_from_str(s, format).ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp_millis())
    })
}

/// Format a remaining duration as a short label: `"1h 03m"`, `"5m 12s"`, `"42s"`.
///
/// Negative input clamps to `"0s"`.
#[must_use]
pub fn format_remaining(remaining_ms: i64) -> String {
    let total_secs = (remaining_ms / 1000).max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
