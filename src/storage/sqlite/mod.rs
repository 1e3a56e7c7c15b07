//! Shared `SQLite` infrastructure for the record store.
//!
//! ## Module Structure
//!
//! - [`connection`]: lock acquisition and connection pragmas
//! - [`functions`]: SQL functions backing the list filter
//! - [`sql`]: WHERE clause building
//! - [`record_row`]: row conversion for [`Record`](crate::models::Record)
//! - [`metrics`]: operation metrics

mod connection;
mod functions;
mod metrics;
mod record_row;
mod sql;

pub use connection::{DEFAULT_BUSY_TIMEOUT, acquire_lock, configure_connection};
pub use functions::{FOLD_CASE_FN, RENDER_AMOUNT_FN, register_functions};
pub use metrics::record_operation_metrics;
pub use record_row::{
    RECORD_COLUMNS, RecordRow, build_record_from_row, fetch_record, format_timestamp,
    parse_timestamp,
};
pub use sql::build_filter_clause_numbered;
