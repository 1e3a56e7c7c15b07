//! The record store: create, read, update, trash and restore ledger records.
//!
//! Each public operation is `async` and runs its `SQLite` work on tokio's
//! blocking pool while holding the handle's connection lock. Operations with
//! more than one statement run in a single immediate transaction.

use super::handle::{StoreHandle, global_handle};
use super::sqlite::{
    RECORD_COLUMNS, RecordRow, acquire_lock, build_filter_clause_numbered, build_record_from_row,
    fetch_record, format_timestamp, record_operation_metrics,
};
use crate::models::{Record, RecordCounts, RecordFilter, RecordId, RecordPatch, RecordStatus};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params, params_from_iter};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

const BACKEND: &str = "sqlite";

/// Async record store over a shared [`StoreHandle`].
#[derive(Debug, Clone)]
pub struct RecordStore {
    handle: Arc<StoreHandle>,
}

impl RecordStore {
    /// Creates a store over `handle`.
    ///
    /// The handle should already be initialized; operations against a store
    /// whose schema was never applied fail with [`Error::OperationFailed`].
    #[must_use]
    pub const fn new(handle: Arc<StoreHandle>) -> Self {
        Self { handle }
    }

    /// Creates a store over the process-wide handle.
    #[must_use]
    pub fn global() -> Self {
        Self::new(global_handle())
    }

    /// Returns the underlying handle.
    #[must_use]
    pub const fn handle(&self) -> &Arc<StoreHandle> {
        &self.handle
    }

    /// Inserts a new active record.
    ///
    /// Any `deleted_at` on the argument is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the id already exists, active or trashed.
    #[instrument(skip(self, record), fields(record_id = %record.id))]
    pub async fn create(&self, record: &Record) -> Result<()> {
        let record = record.clone();
        self.run("create", move |conn| insert_record(conn, &record))
            .await
    }

    /// Fetches a record by id, whether active or trashed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or the row is corrupt.
    #[instrument(skip(self), fields(record_id = %id))]
    pub async fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        let id = id.clone();
        self.run("get", move |conn| fetch_record(conn, &id)).await
    }

    /// Applies a partial update and returns the updated record.
    ///
    /// Only `title` and `amount` can change. Trashed records can be updated
    /// and stay trashed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id.
    #[instrument(skip(self, patch), fields(record_id = %id))]
    pub async fn update(&self, id: &RecordId, patch: RecordPatch) -> Result<Record> {
        let id = id.clone();
        self.run("update", move |conn| update_record(conn, &id, &patch))
            .await
    }

    /// Moves a record to the trash.
    ///
    /// Returns `false` without touching the row if it is already trashed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id.
    #[instrument(skip(self), fields(record_id = %id))]
    pub async fn soft_delete(&self, id: &RecordId) -> Result<bool> {
        let id = id.clone();
        let now = Utc::now();
        self.run("soft_delete", move |conn| soft_delete_record(conn, &id, now))
            .await
    }

    /// Takes a record out of the trash.
    ///
    /// Returns `false` without touching the row if it is already active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id.
    #[instrument(skip(self), fields(record_id = %id))]
    pub async fn restore(&self, id: &RecordId) -> Result<bool> {
        let id = id.clone();
        self.run("restore", move |conn| restore_record(conn, &id))
            .await
    }

    /// Lists active records matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a row is corrupt.
    #[instrument(skip(self, filter))]
    pub async fn list_active(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
        let filter = filter.clone();
        self.run("list_active", move |conn| {
            list_records(conn, &filter, RecordStatus::Active)
        })
        .await
    }

    /// Lists trashed records matching `filter`, newest created first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or a row is corrupt.
    #[instrument(skip(self, filter))]
    pub async fn list_trashed(&self, filter: &RecordFilter) -> Result<Vec<Record>> {
        let filter = filter.clone();
        self.run("list_trashed", move |conn| {
            list_records(conn, &filter, RecordStatus::Trashed)
        })
        .await
    }

    /// Counts active and trashed records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable.
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<RecordCounts> {
        self.run("count", |conn| count_records(conn)).await
    }

    /// Runs `f` against the locked connection on the blocking pool.
    async fn run<T, F>(&self, operation: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let start = Instant::now();
        let result = match self.handle.connection() {
            Ok(conn) => tokio::task::spawn_blocking(move || {
                let mut guard = acquire_lock(&conn);
                f(&mut guard)
            })
            .await
            .unwrap_or_else(|e| {
                Err(Error::OperationFailed {
                    operation: operation.to_string(),
                    cause: format!("blocking task failed: {e}"),
                })
            }),
            Err(e) => Err(e),
        };

        let status = if result.is_ok() { "success" } else { "error" };
        record_operation_metrics(BACKEND, operation, start, status);
        if let Err(e) = &result {
            tracing::debug!(operation, error = %e, "Record store operation failed");
        }
        result
    }
}

fn sql_error(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
    move |e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

fn insert_record(conn: &Connection, record: &Record) -> Result<()> {
    let changed = conn
        .execute(
            "INSERT INTO records (id, title, amount, type, created_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL)
             ON CONFLICT(id) DO NOTHING",
            params![
                record.id.as_str(),
                record.title,
                record.amount,
                record.record_type.as_str(),
                format_timestamp(&record.created_at),
            ],
        )
        .map_err(sql_error("insert_record"))?;

    if changed == 0 {
        return Err(Error::Conflict {
            id: record.id.to_string(),
        });
    }

    metrics::counter!("records_created_total", "type" => record.record_type.as_str())
        .increment(1);
    Ok(())
}

fn update_record(conn: &mut Connection, id: &RecordId, patch: &RecordPatch) -> Result<Record> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(sql_error("update_record_begin_tx"))?;

    let changed = tx
        .execute(
            "UPDATE records
             SET title = COALESCE(?2, title), amount = COALESCE(?3, amount)
             WHERE id = ?1",
            params![id.as_str(), patch.title, patch.amount],
        )
        .map_err(sql_error("update_record"))?;

    if changed == 0 {
        return Err(Error::NotFound { id: id.to_string() });
    }

    let record = fetch_record(&tx, id)?.ok_or_else(|| Error::NotFound { id: id.to_string() })?;
    tx.commit().map_err(sql_error("update_record_commit"))?;
    Ok(record)
}

/// Reads whether the row is active; `None` if it does not exist.
fn lookup_active(conn: &Connection, id: &RecordId) -> Result<Option<bool>> {
    conn.query_row(
        "SELECT deleted_at IS NULL FROM records WHERE id = ?1",
        params![id.as_str()],
        |row| row.get(0),
    )
    .optional()
    .map_err(sql_error("lookup_record"))
}

fn soft_delete_record(conn: &mut Connection, id: &RecordId, now: DateTime<Utc>) -> Result<bool> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(sql_error("soft_delete_begin_tx"))?;

    match lookup_active(&tx, id)? {
        None => return Err(Error::NotFound { id: id.to_string() }),
        Some(false) => return Ok(false),
        Some(true) => {},
    }

    // Clock skew must not produce deleted_at < created_at.
    tx.execute(
        "UPDATE records SET deleted_at = max(?2, created_at)
         WHERE id = ?1 AND deleted_at IS NULL",
        params![id.as_str(), format_timestamp(&now)],
    )
    .map_err(sql_error("soft_delete"))?;
    tx.commit().map_err(sql_error("soft_delete_commit"))?;

    metrics::counter!("record_soft_delete_total").increment(1);
    tracing::debug!(record_id = %id, "Record moved to trash");
    Ok(true)
}

fn restore_record(conn: &mut Connection, id: &RecordId) -> Result<bool> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(sql_error("restore_begin_tx"))?;

    match lookup_active(&tx, id)? {
        None => return Err(Error::NotFound { id: id.to_string() }),
        Some(true) => return Ok(false),
        Some(false) => {},
    }

    tx.execute(
        "UPDATE records SET deleted_at = NULL WHERE id = ?1 AND deleted_at IS NOT NULL",
        params![id.as_str()],
    )
    .map_err(sql_error("restore"))?;
    tx.commit().map_err(sql_error("restore_commit"))?;

    metrics::counter!("record_restore_total").increment(1);
    tracing::debug!(record_id = %id, "Record restored from trash");
    Ok(true)
}

fn list_records(
    conn: &Connection,
    filter: &RecordFilter,
    status: RecordStatus,
) -> Result<Vec<Record>> {
    let (where_clause, params, _) = build_filter_clause_numbered(filter, status, 1);
    let sql = format!(
        "SELECT {RECORD_COLUMNS} FROM records r{where_clause}
         ORDER BY r.created_at DESC, r.rowid DESC"
    );

    let mut stmt = conn.prepare(&sql).map_err(sql_error("list_records_prepare"))?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), RecordRow::from_row)
        .map_err(sql_error("list_records"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(sql_error("list_records_row"))?;

    rows.into_iter().map(build_record_from_row).collect()
}

fn count_records(conn: &Connection) -> Result<RecordCounts> {
    let (total, trashed): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), COUNT(deleted_at) FROM records",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(sql_error("count_records"))?;

    Ok(RecordCounts {
        active: u64::try_from(total - trashed).unwrap_or_default(),
        trashed: u64::try_from(trashed).unwrap_or_default(),
    })
}
