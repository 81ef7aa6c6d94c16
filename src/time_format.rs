//! Wall-clock formatting for provider timestamps.
//!
//! The provider reports instants as UTC epoch seconds and the location's
//! zone as a signed offset in seconds. Offsets are truncated to whole minutes;
//! dates are not tracked, so a shifted clock simply wraps around midnight.

use chrono::{DateTime, Utc};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Formats `unix` (UTC seconds) shifted by `offset_seconds` as `H:MM AM|PM`.
#[must_use]
pub fn format_clock(unix: i64, offset_seconds: i64) -> String {
    let utc_minutes = unix.rem_euclid(86_400) / 60;
    let local_minutes = (utc_minutes + offset_seconds / 60).rem_euclid(MINUTES_PER_DAY);

    let hours = local_minutes / 60;
    let minutes = local_minutes % 60;
    let ampm = if hours >= 12 { "PM" } else { "AM" };
    let display_hours = if hours % 12 == 0 { 12 } else { hours % 12 };

    format!("{display_hours}:{minutes:02} {ampm}")
}

/// Formats an offset in seconds as `GMT±HH:MM`.
#[must_use]
pub fn format_timezone(offset_seconds: i64) -> String {
    let sign = if offset_seconds >= 0 { '+' } else { '-' };
    let abs_offset = offset_seconds.unsigned_abs();
    let hours = abs_offset / 3600;
    let minutes = (abs_offset % 3600) / 60;

    format!("GMT{sign}{hours:02}:{minutes:02}")
}

/// Local clock for a location at the given UTC instant
#[must_use]
pub fn local_time_at(now: DateTime<Utc>, offset_seconds: i64) -> String {
    format_clock(now.timestamp(), offset_seconds)
}

/// Calendar date (`YYYY-MM-DD`) of `unix` in a zone `offset_seconds` from UTC.
/// `None` when the shifted instant is out of range.
#[must_use]
pub fn local_date(unix: i64, offset_seconds: i64) -> Option<String> {
    unix.checked_add(offset_seconds)
        .and_then(|shifted| DateTime::from_timestamp(shifted, 0))
        .map(|shifted| shifted.date_naive().format("%Y-%m-%d").to_string())
}
