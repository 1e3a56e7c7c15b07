//! Row conversion utilities for the `records` table.
//!
//! [`RecordRow`] mirrors the stored columns with primitive types;
//! [`build_record_from_row`] turns it into a [`Record`], rejecting values the
//! schema should never have let in.

use crate::models::{Record, RecordId, RecordType};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Column list shared by every record query, in [`RecordRow`] order.
pub const RECORD_COLUMNS: &str = "r.id, r.title, r.amount, r.type, r.created_at, r.deleted_at";

/// Internal representation of a record row from the database.
#[derive(Debug)]
pub struct RecordRow {
    /// Unique identifier.
    pub id: String,
    /// Display label.
    pub title: String,
    /// Stored magnitude.
    pub amount: f64,
    /// `income` or `expense`.
    pub record_type: String,
    /// RFC 3339 creation instant.
    pub created_at: String,
    /// RFC 3339 soft-delete instant.
    pub deleted_at: Option<String>,
}

impl RecordRow {
    /// Reads a row selected with [`RECORD_COLUMNS`].
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            amount: row.get(2)?,
            record_type: row.get(3)?,
            created_at: row.get(4)?,
            deleted_at: row.get(5)?,
        })
    }
}

/// Formats a timestamp for storage.
///
/// Always UTC with nine fractional digits and a `Z` suffix, so the text sorts
/// in time order and parses back to the identical instant.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parses a stored RFC 3339 timestamp.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the text is not RFC 3339.
pub fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::OperationFailed {
            operation: format!("parse_{column}"),
            cause: format!("'{value}': {e}"),
        })
}

/// Converts a [`RecordRow`] into a [`Record`].
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the type is not `income`/`expense`
/// or a timestamp is malformed. Unknown types are never coerced.
pub fn build_record_from_row(row: RecordRow) -> Result<Record> {
    let record_type = RecordType::parse(&row.record_type).ok_or_else(|| Error::OperationFailed {
        operation: "parse_record_type".to_string(),
        cause: format!("record '{}' has unknown type '{}'", row.id, row.record_type),
    })?;

    let created_at = parse_timestamp("created_at", &row.created_at)?;
    let deleted_at = row
        .deleted_at
        .as_deref()
        .map(|value| parse_timestamp("deleted_at", value))
        .transpose()?;

    Ok(Record {
        id: RecordId::new(row.id),
        title: row.title,
        amount: row.amount,
        record_type,
        created_at,
        deleted_at,
    })
}

/// Fetches a record by id, active or trashed.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the query fails or the row is corrupt.
pub fn fetch_record(conn: &Connection, id: &RecordId) -> Result<Option<Record>> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM records r WHERE r.id = ?1");
    let row = conn
        .query_row(&sql, params![id.as_str()], RecordRow::from_row)
        .optional()
        .map_err(|e| Error::OperationFailed {
            operation: "get_record".to_string(),
            cause: e.to_string(),
        })?;

    row.map(build_record_from_row).transpose()
}
