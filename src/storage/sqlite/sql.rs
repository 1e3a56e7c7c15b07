//! SQL helper functions for the record store.
//!
//! Builds WHERE clauses with numbered parameters. User input never reaches the
//! SQL text; it is always bound as a parameter.
//!
//! Substring tests use `instr`, which is case-sensitive and has no wildcards,
//! so the bound token is matched literally.

use super::functions::{FOLD_CASE_FN, RENDER_AMOUNT_FN};
use crate::models::{RecordFilter, RecordStatus, fold_case};

/// Builds a WHERE clause for a listing with numbered parameters.
///
/// The lifecycle predicate always comes first. The text token becomes an OR of
/// a folded title match and an amount match; the type narrowing is AND-combined.
///
/// # Arguments
///
/// * `filter` - The record filter to convert
/// * `status` - Which side of the trash to list
/// * `start_param` - The starting parameter number (e.g., 1)
///
/// # Returns
///
/// A tuple containing:
/// - The WHERE clause string (prefixed with " WHERE ")
/// - Vector of parameter values (as strings)
/// - The next available parameter index
///
/// # Examples
///
/// ```
/// use tally::models::{RecordFilter, RecordStatus};
/// use tally::storage::sqlite::build_filter_clause_numbered;
///
/// let filter = RecordFilter::parse(Some("Coffee"));
/// let (clause, params, next_idx) =
///     build_filter_clause_numbered(&filter, RecordStatus::Active, 1);
/// assert!(clause.starts_with(" WHERE r.deleted_at IS NULL AND ("));
/// assert_eq!(params, vec!["coffee".to_string(), "Coffee".to_string()]);
/// assert_eq!(next_idx, 3);
/// ```
#[must_use]
pub fn build_filter_clause_numbered(
    filter: &RecordFilter,
    status: RecordStatus,
    start_param: usize,
) -> (String, Vec<String>, usize) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();
    let mut param_idx = start_param;

    conditions.push(
        match status {
            RecordStatus::Active => "r.deleted_at IS NULL",
            RecordStatus::Trashed => "r.deleted_at IS NOT NULL",
        }
        .to_string(),
    );

    if let Some(query) = filter.query() {
        let title_idx = param_idx;
        let amount_idx = param_idx + 1;
        param_idx += 2;
        conditions.push(format!(
            "(instr({FOLD_CASE_FN}(r.title), ?{title_idx}) > 0 \
             OR instr({RENDER_AMOUNT_FN}(r.amount), ?{amount_idx}) > 0)"
        ));
        params.push(fold_case(query));
        params.push(query.to_string());
    }

    if let Some(record_type) = filter.record_type() {
        conditions.push(format!("r.type = ?{param_idx}"));
        param_idx += 1;
        params.push(record_type.as_str().to_string());
    }

    let clause = format!(" WHERE {}", conditions.join(" AND "));
    (clause, params, param_idx)
}
