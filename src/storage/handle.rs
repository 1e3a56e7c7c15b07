//! Store handle lifecycle.
//!
//! A [`StoreHandle`] owns at most one open `SQLite` connection. Opening is lazy
//! and happens at most once; concurrent first callers all observe the same
//! connection. Schema application is a separate, explicit step
//! ([`StoreHandle::initialize`]) that runs at most once per handle.
//!
//! Platforms without local persistence (and configurations that disable it)
//! produce an *unsupported* handle: initialization becomes a logged no-op and
//! every data operation fails with [`Error::StoreUnavailable`].

use super::schema::ensure_schema;
use super::sqlite::{acquire_lock, configure_connection, register_functions};
use crate::config::{StorageSettings, TallyConfig};
use crate::{Error, Result};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Where a store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A database file; parent directories are created on open.
    File(PathBuf),
    /// A private in-memory database, lost when the handle drops.
    InMemory,
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::InMemory => f.write_str(":memory:"),
        }
    }
}

/// Whether the current platform can host the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// Local persistence is available.
    Supported,
    /// Local persistence is not available.
    Unsupported {
        /// Human-readable reason.
        reason: String,
    },
}

impl Capability {
    /// Detects the capability for the running platform and settings.
    #[must_use]
    pub fn detect(settings: &StorageSettings) -> Self {
        if cfg!(target_family = "wasm") {
            return Self::Unsupported {
                reason: "local storage is not available on this platform".to_string(),
            };
        }
        if !settings.enabled {
            return Self::Unsupported {
                reason: "local storage is disabled by configuration".to_string(),
            };
        }
        Self::Supported
    }

    /// Returns true for [`Capability::Supported`].
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(self, Self::Supported)
    }
}

/// Shared handle to the record store's connection.
pub struct StoreHandle {
    location: StoreLocation,
    capability: Capability,
    busy_timeout: Duration,
    conn: OnceCell<Arc<Mutex<Connection>>>,
    schema_ready: OnceCell<()>,
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("location", &self.location)
            .field("capability", &self.capability)
            .field("opened", &self.conn.get().is_some())
            .field("schema_ready", &self.schema_ready.get().is_some())
            .finish()
    }
}

impl StoreHandle {
    const fn with_parts(
        location: StoreLocation,
        capability: Capability,
        busy_timeout: Duration,
    ) -> Self {
        Self {
            location,
            capability,
            busy_timeout,
            conn: OnceCell::new(),
            schema_ready: OnceCell::new(),
        }
    }

    /// Creates a handle for the database described by `config`.
    #[must_use]
    pub fn from_config(config: &TallyConfig) -> Self {
        Self::with_parts(
            StoreLocation::File(config.database_path()),
            Capability::detect(&config.storage),
            config.storage.busy_timeout,
        )
    }

    /// Creates a handle for a private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_parts(
            StoreLocation::InMemory,
            Capability::detect(&StorageSettings::default()),
            super::sqlite::DEFAULT_BUSY_TIMEOUT,
        )
    }

    /// Creates a handle for a database file at `path`.
    #[must_use]
    pub fn open_path(path: impl AsRef<Path>) -> Self {
        Self::with_parts(
            StoreLocation::File(path.as_ref().to_path_buf()),
            Capability::detect(&StorageSettings::default()),
            super::sqlite::DEFAULT_BUSY_TIMEOUT,
        )
    }

    /// Creates a handle that reports the store as unavailable.
    #[must_use]
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::with_parts(
            StoreLocation::InMemory,
            Capability::Unsupported {
                reason: reason.into(),
            },
            super::sqlite::DEFAULT_BUSY_TIMEOUT,
        )
    }

    /// Whether this handle can ever produce a connection.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.capability.is_supported()
    }

    /// Fails fast when local storage is not available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] with the detected reason.
    pub fn ensure_supported(&self) -> Result<()> {
        match &self.capability {
            Capability::Supported => Ok(()),
            Capability::Unsupported { reason } => Err(Error::StoreUnavailable {
                reason: reason.clone(),
            }),
        }
    }

    /// Returns the platform capability.
    #[must_use]
    pub const fn capability(&self) -> &Capability {
        &self.capability
    }

    /// Returns where data is stored.
    #[must_use]
    pub const fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Whether [`initialize`](Self::initialize) has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.schema_ready.get().is_some()
    }

    /// Prepares the store: opens the connection and applies the schema.
    ///
    /// Runs the schema at most once per handle; later calls return
    /// immediately. On an unsupported platform this logs a warning and returns
    /// `Ok(())`, leaving every data operation to fail with
    /// [`Error::StoreUnavailable`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaInitFailure`] if the schema cannot be applied,
    /// or [`Error::OperationFailed`] if the database cannot be opened.
    pub fn initialize(&self) -> Result<()> {
        if let Capability::Unsupported { reason } = &self.capability {
            tracing::warn!(%reason, "Record store unavailable, skipping schema initialization");
            return Ok(());
        }

        self.schema_ready.get_or_try_init(|| {
            let conn = self.connection()?;
            let mut guard = acquire_lock(&conn);
            ensure_schema(&mut guard)?;
            tracing::info!(location = %self.location, "Record store initialized");
            Ok::<(), Error>(())
        })?;
        Ok(())
    }

    /// Returns the shared connection, opening it on first use.
    ///
    /// Opening does not apply the schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] on an unsupported platform, or
    /// [`Error::OperationFailed`] if the database cannot be opened.
    pub fn connection(&self) -> Result<Arc<Mutex<Connection>>> {
        self.ensure_supported()?;
        self.conn
            .get_or_try_init(|| self.open().map(|conn| Arc::new(Mutex::new(conn))))
            .map(Arc::clone)
    }

    /// Returns the applied schema version (0 before initialization).
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or cannot be queried.
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.connection()?;
        let guard = acquire_lock(&conn);
        super::migrations::MigrationRunner::new(super::schema::RECORDS_TABLE)
            .current_version(&guard)
    }

    fn open(&self) -> Result<Connection> {
        let conn = match &self.location {
            StoreLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                        operation: "create_data_dir".to_string(),
                        cause: format!("{}: {e}", parent.display()),
                    })?;
                }
                Connection::open(path)
            },
            StoreLocation::InMemory => Connection::open_in_memory(),
        }
        .map_err(|e| Error::OperationFailed {
            operation: "open_database".to_string(),
            cause: format!("{}: {e}", self.location),
        })?;

        configure_connection(&conn, self.busy_timeout)?;
        register_functions(&conn)?;

        tracing::debug!(location = %self.location, "Opened record store connection");
        Ok(conn)
    }
}

static GLOBAL_HANDLE: OnceCell<Arc<StoreHandle>> = OnceCell::new();

/// Returns the process-wide store handle.
///
/// The first call builds it from [`TallyConfig::load_default`] unless
/// [`install_global`] ran earlier. Every caller receives the same handle.
#[must_use]
pub fn global_handle() -> Arc<StoreHandle> {
    Arc::clone(GLOBAL_HANDLE.get_or_init(|| {
        Arc::new(StoreHandle::from_config(&TallyConfig::load_default()))
    }))
}

/// Installs the process-wide handle from an explicit configuration.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if a global handle already exists.
pub fn install_global(config: &TallyConfig) -> Result<Arc<StoreHandle>> {
    let handle = Arc::new(StoreHandle::from_config(config));
    GLOBAL_HANDLE
        .set(Arc::clone(&handle))
        .map_err(|_| Error::OperationFailed {
            operation: "install_global_handle".to_string(),
            cause: "global store handle already initialized".to_string(),
        })?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_capability_detect() {
        assert!(Capability::detect(&StorageSettings::default()).is_supported());

        let disabled = StorageSettings {
            enabled: false,
            ..StorageSettings::default()
        };
        assert!(matches!(
            Capability::detect(&disabled),
            Capability::Unsupported { ref reason } if reason.contains("disabled")
        ));
    }

    #[test]
    fn test_connection_is_opened_once() {
        let handle = StoreHandle::in_memory();
        let first = handle.connection().unwrap();
        let second = handle.connection().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_first_use_shares_connection() {
        let handle = Arc::new(StoreHandle::in_memory());
        let conns: Vec<_> = (0..8)
            .map(|_| {
                let handle = Arc::clone(&handle);
                thread::spawn(move || handle.connection().unwrap())
            })
            .map(|t| t.join().unwrap())
            .collect();

        assert!(conns.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_connection_does_not_apply_schema() {
        let handle = StoreHandle::in_memory();
        assert_eq!(handle.schema_version().unwrap(), 0);
        assert!(!handle.is_initialized());

        handle.initialize().unwrap();
        assert!(handle.is_initialized());
        assert_eq!(handle.schema_version().unwrap(), 1);
    }

    #[test]
    fn test_initialize_twice_is_noop() {
        let handle = StoreHandle::in_memory();
        handle.initialize().unwrap();
        handle.initialize().unwrap();
        assert_eq!(handle.schema_version().unwrap(), 1);
    }

    #[test]
    fn test_unsupported_handle() {
        let handle = StoreHandle::unsupported("no local storage");
        assert!(!handle.is_supported());
        handle.initialize().unwrap();
        assert!(!handle.is_initialized());

        let err = handle.connection().unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable { ref reason } if reason == "no local storage"));
    }

    #[test]
    fn test_disabled_config_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let config = TallyConfig::default()
            .with_data_dir(dir.path())
            .with_storage_enabled(false);
        let handle = StoreHandle::from_config(&config);
        assert!(matches!(
            handle.connection(),
            Err(Error::StoreUnavailable { .. })
        ));
        assert!(!config.database_path().exists());
    }

    #[test]
    fn test_file_handle_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("tally.db");
        let handle = StoreHandle::open_path(&path);
        handle.initialize().unwrap();

        assert!(path.exists());
        assert_eq!(handle.location(), &StoreLocation::File(path));
    }

    #[test]
    fn test_location_display() {
        assert_eq!(StoreLocation::InMemory.to_string(), ":memory:");
        assert_eq!(
            StoreLocation::File(PathBuf::from("/tmp/tally.db")).to_string(),
            "/tmp/tally.db"
        );
    }
}
