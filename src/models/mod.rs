//! Data models for tally.
//!
//! Records, their identifiers and lifecycle states, partial updates, and the
//! typed filter used by the listing queries.

mod filter;
mod record;

pub use filter::{RecordFilter, fold_case, render_amount};
pub use record::{Record, RecordCounts, RecordId, RecordPatch, RecordStatus, RecordType};
