//! Typed filter for record listings.
//!
//! A filter holds an optional free-text token and an optional type. A record
//! matches the token when the case-folded token is a substring of the
//! case-folded title, or when the token is a substring of the amount's decimal
//! rendering. Amount matching is textual on purpose: `"500"` matches `500`,
//! `5000` and `1500000`.
//!
//! The same two helpers, [`fold_case`] and [`render_amount`], are registered as
//! `SQLite` functions so the SQL query and [`RecordFilter::matches`] agree.

use super::{Record, RecordType};

/// Case-folds text for title matching.
///
/// Folds one character at a time. `str::to_lowercase` maps a word-final `Σ`
/// to `ς`, which would make `"ΠΑΣ"` fold differently inside `"ΠΑΣΑ"` than on
/// its own.
#[must_use]
pub fn fold_case(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Renders an amount the way the amount filter sees it.
///
/// Whole amounts render without a fractional part (`500000`), others with the
/// shortest exact decimal (`99.5`).
#[must_use]
pub fn render_amount(amount: f64) -> String {
    amount.to_string()
}

/// Filter criteria for record listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    query: Option<String>,
    record_type: Option<RecordType>,
}

impl RecordFilter {
    /// Creates an empty filter (matches all).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            query: None,
            record_type: None,
        }
    }

    /// Builds a filter from an optional user-entered token.
    ///
    /// A missing, empty or all-whitespace token yields an empty filter.
    #[must_use]
    pub fn parse(query: Option<&str>) -> Self {
        query.map_or_else(Self::new, |q| Self::new().with_query(q))
    }

    /// Sets the free-text token. Surrounding whitespace is ignored.
    #[must_use]
    pub fn with_query(mut self, query: impl AsRef<str>) -> Self {
        let trimmed = query.as_ref().trim();
        self.query = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Narrows the listing to one record type.
    #[must_use]
    pub const fn with_type(mut self, record_type: RecordType) -> Self {
        self.record_type = Some(record_type);
        self
    }

    /// Narrows the listing to one record type, if given.
    #[must_use]
    pub const fn with_optional_type(mut self, record_type: Option<RecordType>) -> Self {
        self.record_type = record_type;
        self
    }

    /// The trimmed token, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The type narrowing, if any.
    #[must_use]
    pub const fn record_type(&self) -> Option<RecordType> {
        self.record_type
    }

    /// Returns true if the filter is empty (matches all).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.query.is_none() && self.record_type.is_none()
    }

    /// Evaluates the filter against a record in memory.
    ///
    /// Lifecycle state is not part of the filter; listings apply it separately.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(record_type) = self.record_type {
            if record.record_type != record_type {
                return false;
            }
        }

        self.query.as_deref().is_none_or(|query| {
            fold_case(&record.title).contains(&fold_case(query))
                || render_amount(record.amount).contains(query)
        })
    }
}
