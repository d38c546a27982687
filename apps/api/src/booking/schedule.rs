//! Interview datetime parsing.
//!
//! Strings with explicit offset/zone information are taken as given.
//! Offset-less strings are interpreted as IST (+05:30) and converted to
//! UTC before storage. Candidates in other timezones must send an explicit
//! offset; see DESIGN.md on this default.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::errors::AppError;

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Parses an ISO-8601 datetime, normalizing to UTC.
pub fn parse_scheduled_at(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();

    // Offset-bearing forms, including a trailing 'Z'.
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Offset-less forms, 'T' or space separated.
    let naive = raw
        .parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .map_err(|_| {
            AppError::Validation("Invalid datetime format. Expected ISO format.".to_string())
        })?;

    let ist = FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST is a valid fixed offset");
    let local = ist.from_local_datetime(&naive).single().ok_or_else(|| {
        AppError::Validation("Invalid datetime format. Expected ISO format.".to_string())
    })?;
    Ok(local.with_timezone(&Utc))
}

/// The IST offset used for display formatting in notifications.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST is a valid fixed offset")
}
