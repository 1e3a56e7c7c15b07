//! Schema manager for the `records` table.
//!
//! [`ensure_schema`] is safe to call on every start, including against a store
//! that already holds data. It first asks for write-ahead logging (best
//! effort), then applies the versioned [`MIGRATIONS`].

use super::migrations::{Migration, MigrationRunner};
use crate::{Error, Result};
use rusqlite::Connection;

/// Name of the records table.
pub const RECORDS_TABLE: &str = "records";

/// Embedded schema migrations for the records table.
///
/// Version 1 declares the five record columns, the `id` primary key, the
/// `type` value-domain check and the three lookup indexes.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Create records table with lookup indexes",
    sql: "
        CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            amount REAL NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            created_at TEXT NOT NULL,
            deleted_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_created_at ON {table}(created_at);
        CREATE INDEX IF NOT EXISTS idx_{table}_deleted_at ON {table}(deleted_at);
        CREATE INDEX IF NOT EXISTS idx_{table}_type ON {table}(type);
    ",
}];

/// Brings the store to the expected shape.
///
/// # Errors
///
/// Returns [`Error::SchemaInitFailure`] if the tables cannot be created. A
/// refused journal mode is logged and ignored.
pub fn ensure_schema(conn: &mut Connection) -> Result<()> {
    enable_write_ahead_log(conn);

    let runner = MigrationRunner::new(RECORDS_TABLE);
    let applied = runner
        .run(conn, MIGRATIONS)
        .map_err(|e| Error::SchemaInitFailure {
            cause: e.to_string(),
        })?;

    tracing::debug!(
        table = RECORDS_TABLE,
        applied,
        "Record schema ready"
    );
    Ok(())
}

/// Switches the connection to WAL journal mode.
///
/// Returns whether WAL is now active. In-memory databases and some
/// filesystems refuse WAL; that only costs concurrency, so it is logged and
/// swallowed.
pub fn enable_write_ahead_log(conn: &Connection) -> bool {
    match conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
        row.get::<_, String>(0)
    }) {
        Ok(mode) if mode.eq_ignore_ascii_case("wal") => true,
        Ok(mode) => {
            tracing::warn!(journal_mode = %mode, "WAL mode not supported, continuing without it");
            false
        },
        Err(e) => {
            tracing::warn!(error = %e, "WAL mode not supported, continuing without it");
            false
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::max_version;
    use rusqlite::params;

    fn index_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'records' \
                 AND name LIKE 'idx_%' ORDER BY name",
            )
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .map(std::result::Result::unwrap)
            .collect()
    }

    #[test]
    fn test_ensure_schema_creates_table_and_indexes() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();

        assert_eq!(
            index_names(&conn),
            vec![
                "idx_records_created_at",
                "idx_records_deleted_at",
                "idx_records_type"
            ]
        );
        assert_eq!(
            MigrationRunner::new(RECORDS_TABLE)
                .current_version(&conn)
                .unwrap(),
            max_version(MIGRATIONS)
        );
    }

    #[test]
    fn test_ensure_schema_is_idempotent_with_data() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO records (id, title, amount, type, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params!["1", "Coffee", 35000.0, "expense", "2025-10-01T08:30:00.000000000Z"],
        )
        .unwrap();

        ensure_schema(&mut conn).unwrap();
        ensure_schema(&mut conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_type_check_rejects_unknown_values() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();

        let result = conn.execute(
            "INSERT INTO records (id, title, amount, type, created_at) VALUES ('2', 'Move', 1.0, 'transfer', '2025-10-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_id_is_unique() {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();

        let insert = "INSERT INTO records (id, title, amount, type, created_at) VALUES ('1', 'a', 1.0, 'income', '2025-10-01T00:00:00Z')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }

    #[test]
    fn test_wal_refused_in_memory_is_swallowed() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!enable_write_ahead_log(&conn));
    }

    #[test]
    fn test_wal_enabled_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = Connection::open(dir.path().join("tally.db")).unwrap();
        ensure_schema(&mut conn).unwrap();

        let mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_schema_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readonly.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE placeholder (x INTEGER)")
            .unwrap();
        let mut conn = Connection::open_with_flags(
            &path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )
        .unwrap();

        let err = ensure_schema(&mut conn).unwrap_err();
        assert!(matches!(err, Error::SchemaInitFailure { .. }));
    }
}
