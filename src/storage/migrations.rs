//! Versioned schema migrations for `SQLite`.
//!
//! Migrations are embedded at compile time and applied in order when the
//! store initializes. Applied versions are tracked in a
//! `{table}_schema_migrations` table, so running the same list again is a no-op.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tally::storage::migrations::{Migration, MigrationRunner};
//!
//! const MIGRATIONS: &[Migration] = &[
//!     Migration {
//!         version: 1,
//!         description: "Initial table",
//!         sql: "CREATE TABLE IF NOT EXISTS {table} (id TEXT PRIMARY KEY);",
//!     },
//! ];
//!
//! MigrationRunner::new("my_table").run(&mut conn, MIGRATIONS)?;
//! ```

use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

/// A single migration with version and SQL.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Migration version (sequential, starting at 1).
    pub version: i32,
    /// Human-readable description.
    pub description: &'static str,
    /// SQL to apply (may contain multiple statements separated by semicolons).
    /// Use `{table}` as a placeholder for the table name.
    pub sql: &'static str,
}

/// Runs migrations for one `SQLite` table.
pub struct MigrationRunner {
    table_name: String,
}

impl MigrationRunner {
    /// Creates a new migration runner.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Runs all pending migrations.
    ///
    /// Returns the number of migrations applied by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails. The failing migration is rolled
    /// back; migrations applied before it stay applied.
    pub fn run(&self, conn: &mut Connection, migrations: &[Migration]) -> Result<usize> {
        self.ensure_migrations_table(conn)?;
        let current_version = self.get_current_version(conn)?;

        let mut applied = 0;
        for migration in migrations {
            if migration.version > current_version {
                self.apply_migration(conn, migration)?;
                applied += 1;
            }
        }

        Ok(applied)
    }

    /// Returns the current schema version (0 if nothing has been applied).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be queried.
    pub fn current_version(&self, conn: &Connection) -> Result<i32> {
        let migrations_table = self.migrations_table_name();
        let exists = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![migrations_table],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| Error::OperationFailed {
                operation: "migration_table_exists".to_string(),
                cause: e.to_string(),
            })?
            .is_some();

        if !exists {
            return Ok(0);
        }

        self.get_current_version(conn)
    }

    /// Returns the name of the migrations tracking table.
    fn migrations_table_name(&self) -> String {
        format!("{}_schema_migrations", self.table_name)
    }

    /// Ensures the tracking table exists.
    fn ensure_migrations_table(&self, conn: &Connection) -> Result<()> {
        let migrations_table = self.migrations_table_name();

        let sql = format!(
            r"
            CREATE TABLE IF NOT EXISTS {migrations_table} (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )
            "
        );

        conn.execute(&sql, []).map_err(|e| Error::OperationFailed {
            operation: "create_migrations_table".to_string(),
            cause: e.to_string(),
        })?;

        Ok(())
    }

    /// Gets the current schema version.
    fn get_current_version(&self, conn: &Connection) -> Result<i32> {
        let migrations_table = self.migrations_table_name();
        let sql = format!("SELECT COALESCE(MAX(version), 0) FROM {migrations_table}");

        conn.query_row(&sql, [], |row| row.get(0))
            .map_err(|e| Error::OperationFailed {
                operation: "get_schema_version".to_string(),
                cause: e.to_string(),
            })
    }

    /// Applies a single migration within a transaction.
    ///
    /// The migration statements and its tracking row commit together, so a
    /// failure never leaves a half-applied schema behind.
    fn apply_migration(&self, conn: &mut Connection, migration: &Migration) -> Result<()> {
        let migrations_table = self.migrations_table_name();
        let sql = migration.sql.replace("{table}", &self.table_name);

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| Error::OperationFailed {
                operation: format!("migration_v{}_begin_tx", migration.version),
                cause: e.to_string(),
            })?;

        tx.execute_batch(&sql).map_err(|e| Error::OperationFailed {
            operation: format!(
                "migration_v{}: {}",
                migration.version, migration.description
            ),
            cause: e.to_string(),
        })?;

        let record_sql =
            format!("INSERT INTO {migrations_table} (version, description) VALUES (?1, ?2)");
        tx.execute(
            &record_sql,
            params![migration.version, migration.description],
        )
        .map_err(|e| Error::OperationFailed {
            operation: "record_migration".to_string(),
            cause: e.to_string(),
        })?;

        tx.commit().map_err(|e| Error::OperationFailed {
            operation: format!("migration_v{}_commit", migration.version),
            cause: e.to_string(),
        })?;

        tracing::info!(
            version = migration.version,
            description = migration.description,
            table = self.table_name,
            "Applied migration"
        );

        Ok(())
    }
}

/// Maximum version across a set of migrations.
#[must_use]
pub const fn max_version(migrations: &[Migration]) -> i32 {
    let mut max = 0;
    let mut i = 0;
    while i < migrations.len() {
        if migrations[i].version > max {
            max = migrations[i].version;
        }
        i += 1;
    }
    max
}
