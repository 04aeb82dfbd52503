//! Time-related utilities

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current system time in seconds since UNIX epoch
pub fn system_time_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX epoch")
        .as_secs()
}

/// Parse an interval string (e.g. "90s", "30m", "2h", "1d").
///
/// A bare number is taken as seconds.
pub fn parse_interval(s: &str) -> Result<Duration> {
    let s = s.trim();

    let (value, unit_secs) = if let Some(num) = s.strip_suffix('s') {
        (num, 1)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, 60)
    } else if let Some(num) = s.strip_suffix('h') {
        (num, 3600)
    } else if let Some(num) = s.strip_suffix('d') {
        (num, 86_400)
    } else {
        (s, 1)
    };

    let value: i64 = value
        .parse()
        .map_err(|_| Error::Configuration(format!("invalid interval '{}'", s)))?;
    if value <= 0 {
        return Err(Error::Configuration(format!(
            "interval '{}' must be positive",
            s
        )));
    }
    Ok(Duration::seconds(value * unit_secs))
}

/// Parse a timestamp from the CLI.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`), a naive datetime
/// (`2024-01-01T00:00:00`, taken as UTC), or a bare date (`2024-01-01`,
/// midnight UTC).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(Error::Configuration(format!("invalid timestamp '{}'", s)))
}

/// Format a timestamp the way the server expects it in query strings
/// (RFC 3339 with a numeric offset, e.g. `2024-01-01T00:00:00+00:00`).
pub fn format_query_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, false)
}
