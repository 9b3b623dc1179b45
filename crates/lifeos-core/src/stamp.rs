//! Identifier and timestamp helpers shared by every backend.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::error::CoreError;

/// New record id: `<prefix>_<lowercase ulid>`, e.g. `tr_01j...`.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", ulid::Ulid::new().to_string().to_lowercase())
}

/// Current UTC time as RFC 3339.
pub fn now_rfc3339() -> String {
    format_rfc3339(OffsetDateTime::now_utc())
}

pub fn format_rfc3339(ts: OffsetDateTime) -> String {
    // Only years outside 0..=9999 fail to format.
    ts.to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// Strict `YYYY-MM-DD`.
pub fn parse_calendar_date(s: &str) -> Result<Date, CoreError> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map_err(|_| CoreError::InvalidDate(s.to_string()))
}

/// RFC 3339 timestamp, normalized to UTC.
pub fn parse_timestamp(s: &str) -> Result<OffsetDateTime, CoreError> {
    OffsetDateTime::parse(s, &Rfc3339)
        .map(|ts| ts.to_offset(UtcOffset::UTC))
        .map_err(|_| CoreError::InvalidTimestamp(s.to_string()))
}
