//! Connection handling for the `SQLite` record store.
//!
//! Lock acquisition with poison recovery, and per-connection pragmas.

use crate::{Error, Result};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Default time a writer waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Helper to acquire mutex lock with poison recovery.
///
/// If the mutex is poisoned (due to a panic in a previous critical section),
/// we recover the inner value and log a warning. Every store operation runs in
/// its own transaction, so a panic mid-operation leaves nothing half-applied.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a freshly opened connection.
///
/// # Configuration Applied
///
/// - **NORMAL synchronous**: balances durability with performance under WAL
/// - **`busy_timeout`**: waits for locks held by other connections instead of
///   failing immediately with `SQLITE_BUSY`
/// - **`foreign_keys`**: on, so future relations are enforced
///
/// Write-ahead logging is enabled separately by the schema manager, which
/// tolerates engines that refuse it.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if a pragma cannot be applied.
pub fn configure_connection(conn: &Connection, busy_timeout: Duration) -> Result<()> {
    conn.busy_timeout(busy_timeout)
        .map_err(|e| Error::OperationFailed {
            operation: "configure_busy_timeout".to_string(),
            cause: e.to_string(),
        })?;

    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|e| Error::OperationFailed {
            operation: "configure_synchronous".to_string(),
            cause: e.to_string(),
        })?;

    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| Error::OperationFailed {
            operation: "configure_foreign_keys".to_string(),
            cause: e.to_string(),
        })?;

    Ok(())
}
