//! Scalar SQL functions registered on every store connection.
//!
//! They expose the filter's case folding and amount rendering to SQL, so the
//! listing queries match records exactly as [`RecordFilter::matches`] does.
//!
//! [`RecordFilter::matches`]: crate::models::RecordFilter::matches

use crate::models::{fold_case, render_amount};
use crate::{Error, Result};
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

/// SQL name of the case-folding function: `fold_case(text) -> text`.
pub const FOLD_CASE_FN: &str = "fold_case";

/// SQL name of the amount rendering function: `render_amount(real) -> text`.
pub const RENDER_AMOUNT_FN: &str = "render_amount";

/// Registers the filter functions on a connection.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if `SQLite` refuses a registration.
pub fn register_functions(conn: &Connection) -> Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function(FOLD_CASE_FN, 1, flags, |ctx| {
        let text: String = ctx.get(0)?;
        Ok(fold_case(&text))
    })
    .map_err(|e| Error::OperationFailed {
        operation: "register_fold_case".to_string(),
        cause: e.to_string(),
    })?;

    conn.create_scalar_function(RENDER_AMOUNT_FN, 1, flags, |ctx| {
        let amount: f64 = ctx.get(0)?;
        Ok(render_amount(amount))
    })
    .map_err(|e| Error::OperationFailed {
        operation: "register_render_amount".to_string(),
        cause: e.to_string(),
    })?;

    Ok(())
}
