//! Attendance timestamp display.
//!
//! The backend sends ISO-8601 strings. Some carry an offset (`Z`,
//! `+00:00`), older records do not. Naive timestamps are UTC. Everything is
//! shown in Indian Standard Time with the en-IN short date and medium time
//! layout, e.g. `01/03/24, 3:30:00 pm`.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// IST is UTC+05:30 all year.
pub const IST_OFFSET_MINUTES: i64 = 5 * 60 + 30;

/// en-IN `dateStyle: short`, `timeStyle: medium`.
const DISPLAY_FORMAT: &str = "%d/%m/%y, %-I:%M:%S %P";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized timestamp '{0}'")]
pub struct TimestampError(pub String);

/// Parse a backend timestamp. Strings without a zone marker are read as UTC.
pub fn parse_backend_time(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| TimestampError(raw.to_string()))
}

/// Render a UTC instant in IST.
pub fn format_ist(instant: DateTime<Utc>) -> String {
    let local = instant.naive_utc() + Duration::minutes(IST_OFFSET_MINUTES);
    local.format(DISPLAY_FORMAT).to_string()
}

/// Parse and render a backend timestamp, falling back to the raw text.
pub fn display_time(raw: &str) -> String {
    match parse_backend_time(raw) {
        Ok(instant) => format_ist(instant),
        Err(e) => {
            log::warn!("{}", e);
            raw.to_string()
        }
    }
}
