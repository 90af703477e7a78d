//! Conversions between chrono values and the TEXT columns they are stored in.

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use la_core::constants::{DATE_FORMAT, TIMESTAMP_FORMAT};
use la_core::error::{LaError, LaResult};

/// Current local wall-clock time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Format a timestamp for storage.
pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Accepts a missing seconds field and an ISO `T`.
pub fn parse_ts(s: &str) -> LaResult<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|e| LaError::Parse(format!("bad timestamp '{s}': {e}")))
}

/// Format a calendar date for storage.
pub fn format_date(d: &NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Parse a stored calendar date. A full timestamp is truncated to its date.
pub fn parse_date(s: &str) -> LaResult<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| parse_ts(s).map(|ts| ts.date()))
        .map_err(|e| LaError::Parse(format!("bad date '{s}': {e}")))
}
