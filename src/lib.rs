//! # Tally
//!
//! A personal ledger of income and expense records.
//!
//! Tally keeps every entry in a local `SQLite` store with a soft-delete
//! lifecycle: records are created active, can be moved to the trash, and can
//! be restored from it. Listing combines a free-text filter (title or rendered
//! amount) with newest-first ordering.
//!
//! ## Layout
//!
//! - [`models`]: records, identifiers, patches and the typed list filter
//! - [`storage`]: store handle lifecycle, schema manager and the record store
//! - [`config`]: TOML configuration discovery
//! - [`observability`]: structured logging setup
//! - [`cli`]: command handlers used by the `tally` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally::models::{Record, RecordFilter, RecordId, RecordType};
//! use tally::storage::{RecordStore, StoreHandle};
//!
//! let handle = Arc::new(StoreHandle::in_memory());
//! handle.initialize()?;
//! let store = RecordStore::new(handle);
//!
//! let record = Record::new(RecordId::generate(), "Coffee", 35000.0, RecordType::Expense, chrono::Utc::now());
//! store.create(&record).await?;
//! let active = store.list_active(&RecordFilter::parse(Some("coff"))).await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod models;
pub mod observability;
pub mod storage;

pub use config::TallyConfig;
pub use models::{Record, RecordFilter, RecordId, RecordPatch, RecordStatus, RecordType};
pub use storage::{RecordStore, StoreHandle};

/// Error type for tally operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `StoreUnavailable` | The platform cannot host a local store, or storage is disabled |
/// | `Conflict` | A record is created with an id that already exists (active or trashed) |
/// | `NotFound` | Update, soft-delete or restore targets an id with no row |
/// | `SchemaInitFailure` | The records table or its tracking table cannot be created |
/// | `InvalidInput` | Caller-side validation fails (empty title, non-positive amount, bad config) |
/// | `OperationFailed` | `SQLite` I/O errors, corrupted row values, blocking task failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Persistent local storage is not available.
    ///
    /// Fatal to the calling flow and not retryable. Callers should check
    /// [`StoreHandle::is_supported`] before driving anything that needs the store.
    #[error("store unavailable: {reason}")]
    StoreUnavailable {
        /// Why the store cannot be used.
        reason: String,
    },

    /// A record with the same id already exists.
    #[error("record '{id}' already exists")]
    Conflict {
        /// The colliding id.
        id: String,
    },

    /// The targeted record does not exist.
    #[error("record '{id}' not found")]
    NotFound {
        /// The missing id.
        id: String,
    },

    /// The schema could not be applied at startup.
    #[error("schema initialization failed: {cause}")]
    SchemaInitFailure {
        /// The underlying cause.
        cause: String,
    },

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A title is empty after trimming
    /// - An amount does not parse or is not positive
    /// - A record type string is neither `income` nor `expense`
    /// - A configuration file contains an unknown value
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` statements fail to prepare or execute
    /// - A stored row cannot be converted back into a record
    /// - The blocking task running a store operation panics or is cancelled
    /// - Configuration or log files cannot be read or created
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for tally operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("title is empty".to_string());
        assert_eq!(err.to_string(), "invalid input: title is empty");

        let err = Error::OperationFailed {
            operation: "insert_record".to_string(),
            cause: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'insert_record' failed: disk full");

        let err = Error::Conflict {
            id: "1".to_string(),
        };
        assert_eq!(err.to_string(), "record '1' already exists");

        let err = Error::NotFound {
            id: "missing-id".to_string(),
        };
        assert_eq!(err.to_string(), "record 'missing-id' not found");

        let err = Error::StoreUnavailable {
            reason: "disabled".to_string(),
        };
        assert_eq!(err.to_string(), "store unavailable: disabled");

        let err = Error::SchemaInitFailure {
            cause: "readonly database".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "schema initialization failed: readonly database"
        );
    }
}
