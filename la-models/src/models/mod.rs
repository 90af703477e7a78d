//! Entity model definitions.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::Row;
use la_core::error::LaError;

use crate::time;

pub mod user;
pub mod reminder;
pub mod todo;
pub mod finance;
pub mod chat_log;
pub mod payment;

/// Wrap a parse failure so it can travel through a `from_row` closure.
pub(crate) fn conversion_error(row: &Row<'_>, column: &str, err: LaError) -> rusqlite::Error {
    let idx = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Read a required timestamp column.
pub(crate) fn ts_column(row: &Row<'_>, column: &str) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(column)?;
    time::parse_ts(&raw).map_err(|e| conversion_error(row, column, e))
}

/// Read a nullable timestamp column.
pub(crate) fn opt_ts_column(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(column)?;
    match raw {
        Some(s) if !s.trim().is_empty() => time::parse_ts(&s)
            .map(Some)
            .map_err(|e| conversion_error(row, column, e)),
        _ => Ok(None),
    }
}

/// Read a nullable date column.
pub(crate) fn opt_date_column(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(column)?;
    match raw {
        Some(s) if !s.trim().is_empty() => time::parse_date(&s)
            .map(Some)
            .map_err(|e| conversion_error(row, column, e)),
        _ => Ok(None),
    }
}
