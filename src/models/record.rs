//! Record types and identifiers.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a record.
///
/// Ids are opaque. They are minted by the caller-facing create path and never
/// by the store; a trashed record keeps its id, so ids are never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record id from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh, time-ordered id (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Whether a record adds to or subtracts from the ledger.
///
/// The stored amount is always a magnitude; the sign comes from the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl RecordType {
    /// Returns the type as stored in the `type` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses a type string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Sign used when displaying an amount of this type.
    #[must_use]
    pub const fn sign(&self) -> char {
        match self {
            Self::Income => '+',
            Self::Expense => '-',
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| {
            Error::InvalidInput(format!(
                "unknown record type '{s}' (expected 'income' or 'expense')"
            ))
        })
    }
}

/// Lifecycle state of a record, derived from `deleted_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// `deleted_at` is null.
    #[default]
    Active,
    /// `deleted_at` is set; recoverable with restore.
    Trashed,
}

impl RecordStatus {
    /// Returns the status as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trashed => "trashed",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier.
    pub id: RecordId,
    /// Display label.
    pub title: String,
    /// Positive monetary magnitude.
    pub amount: f64,
    /// Income or expense. Fixed at creation.
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Soft-delete instant; `None` while the record is active.
    ///
    /// Only the store writes this field.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Creates an active record.
    #[must_use]
    pub fn new(
        id: impl Into<RecordId>,
        title: impl Into<String>,
        amount: f64,
        record_type: RecordType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            amount,
            record_type,
            created_at,
            deleted_at: None,
        }
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn status(&self) -> RecordStatus {
        if self.deleted_at.is_some() {
            RecordStatus::Trashed
        } else {
            RecordStatus::Active
        }
    }

    /// Returns true if the record is not in the trash.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Partial update for a record.
///
/// Only the supplied fields change. The type is deliberately absent: it is
/// fixed at creation and no update can change it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    /// New title, if changing.
    pub title: Option<String>,
    /// New amount, if changing.
    pub amount: Option<f64>,
}

impl RecordPatch {
    /// Creates an empty patch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            title: None,
            amount: None,
        }
    }

    /// Sets the new title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the new amount.
    #[must_use]
    pub const fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Returns true if the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.amount.is_none()
    }
}

/// Number of records in each lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    /// Records not in the trash.
    pub active: u64,
    /// Records in the trash.
    pub trashed: u64,
}

impl RecordCounts {
    /// Total number of stored records.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.active + self.trashed
    }
}
