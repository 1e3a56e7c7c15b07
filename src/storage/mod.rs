//! Local persistence for ledger records.
//!
//! - [`handle`]: store handle lifecycle, platform capability and the
//!   process-wide singleton
//! - [`schema`]: the `records` table and its migrations
//! - [`migrations`]: generic versioned migration runner
//! - [`records`]: the async record store
//! - [`sqlite`]: shared `SQLite` helpers

pub mod handle;
pub mod migrations;
pub mod records;
pub mod schema;
pub mod sqlite;

pub use handle::{Capability, StoreHandle, StoreLocation, global_handle, install_global};
pub use records::RecordStore;
pub use schema::{RECORDS_TABLE, ensure_schema};
