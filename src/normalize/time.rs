//! Timestamp assembly for feeds that split date, UTC time and offset.

use chrono::{Duration, NaiveDate, NaiveTime};

/// Converts a UTC wall time on `date` into a local ISO 8601 timestamp.
///
/// `utc_time` is `HH:MM` (seconds ignored) and `offset` is `HH:MM`. The
/// rendered offset always carries a `+` sign, so negative offsets come out as
/// `+-5:00`. Inputs that do not parse fall back to
/// `{date}T{utc_time}:00+{offset}` without conversion.
#[must_use]
pub fn utc_to_local_iso(date: &str, utc_time: &str, offset: &str) -> String {
    convert(date, utc_time, offset)
        .unwrap_or_else(|| format!("{date}T{utc_time}:00+{offset}"))
}

fn convert(date: &str, utc_time: &str, offset: &str) -> Option<String> {
    let (offset_h, offset_m) = split_hours_minutes(offset)?;
    let (utc_h, utc_m) = split_hours_minutes(utc_time)?;

    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = NaiveTime::from_hms_opt(u32::try_from(utc_h).ok()?, u32::try_from(utc_m).ok()?, 0)?;
    let local = day.and_time(time) + Duration::hours(offset_h) + Duration::minutes(offset_m);

    Some(format!(
        "{}+{offset_h:02}:{offset_m:02}",
        local.format("%Y-%m-%dT%H:%M:%S")
    ))
}

fn split_hours_minutes(value: &str) -> Option<(i64, i64)> {
    let mut parts = value.split(':');
    let hours = parts.next()?.trim().parse::<i64>().ok()?;
    let minutes = match parts.next() {
        Some(part) => part.trim().parse::<i64>().ok()?,
        None => 0,
    };
    Some((hours, minutes))
}
