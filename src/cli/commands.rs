//! Record command handlers.
//!
//! Handlers validate user input, call the [`RecordStore`] and write their
//! result to the supplied writer. They never print directly, so the binary
//! decides where output goes.

use super::render::{
    OutputFormat, StatusReport, io_error, write_record, write_records, write_status,
};
use crate::models::{Record, RecordFilter, RecordId, RecordPatch, RecordType};
use crate::storage::{Capability, RecordStore};
use crate::{Error, Result};
use chrono::Utc;
use std::io::Write;

/// Validates a title: it must contain something besides whitespace.
///
/// Returns the trimmed title.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an empty or all-whitespace title.
pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("title must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Parses an amount: a finite decimal number greater than zero.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the text is not a number or not positive.
pub fn parse_amount(text: &str) -> Result<f64> {
    let amount: f64 = text
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("amount '{text}' is not a number")))?;

    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "amount must be greater than zero, got '{text}'"
        )));
    }
    Ok(amount)
}

/// Dispatches record commands against a store.
#[derive(Debug, Clone)]
pub struct RecordCommands {
    store: RecordStore,
    format: OutputFormat,
}

impl RecordCommands {
    /// Creates a handler set writing in `format`.
    #[must_use]
    pub const fn new(store: RecordStore, format: OutputFormat) -> Self {
        Self { store, format }
    }

    /// `tally add`: creates an active record stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a bad title or amount, or any store
    /// error.
    pub async fn add(
        &self,
        out: &mut dyn Write,
        title: &str,
        amount: &str,
        record_type: RecordType,
    ) -> Result<Record> {
        let title = validate_title(title)?;
        let amount = parse_amount(amount)?;

        let record = Record::new(RecordId::generate(), title, amount, record_type, Utc::now());
        self.store.create(&record).await?;
        tracing::info!(record_id = %record.id, record_type = %record.record_type, "Record added");

        write_record(out, self.format, &record)?;
        Ok(record)
    }

    /// `tally list`: active records, newest first.
    ///
    /// # Errors
    ///
    /// Returns any store error.
    pub async fn list(
        &self,
        out: &mut dyn Write,
        query: Option<&str>,
        record_type: Option<RecordType>,
    ) -> Result<Vec<Record>> {
        let filter = RecordFilter::parse(query).with_optional_type(record_type);
        let records = self.store.list_active(&filter).await?;
        write_records(out, self.format, &records)?;
        Ok(records)
    }

    /// `tally trash`: trashed records, newest created first.
    ///
    /// # Errors
    ///
    /// Returns any store error.
    pub async fn trash(
        &self,
        out: &mut dyn Write,
        query: Option<&str>,
        record_type: Option<RecordType>,
    ) -> Result<Vec<Record>> {
        let filter = RecordFilter::parse(query).with_optional_type(record_type);
        let records = self.store.list_trashed(&filter).await?;
        write_records(out, self.format, &records)?;
        Ok(records)
    }

    /// `tally show`: one record, active or trashed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id.
    pub async fn show(&self, out: &mut dyn Write, id: &str) -> Result<Record> {
        let id = RecordId::new(id);
        let record = self
            .store
            .get(&id)
            .await?
            .ok_or_else(|| Error::NotFound { id: id.to_string() })?;
        write_record(out, self.format, &record)?;
        Ok(record)
    }

    /// `tally edit`: changes title and/or amount.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if nothing is supplied or a value is
    /// invalid, and [`Error::NotFound`] if no record has this id.
    pub async fn edit(
        &self,
        out: &mut dyn Write,
        id: &str,
        title: Option<&str>,
        amount: Option<&str>,
    ) -> Result<Record> {
        let mut patch = RecordPatch::new();
        if let Some(title) = title {
            patch = patch.with_title(validate_title(title)?);
        }
        if let Some(amount) = amount {
            patch = patch.with_amount(parse_amount(amount)?);
        }
        if patch.is_empty() {
            return Err(Error::InvalidInput(
                "nothing to update: pass --title and/or --amount".to_string(),
            ));
        }

        let record = self.store.update(&RecordId::new(id), patch).await?;
        write_record(out, self.format, &record)?;
        Ok(record)
    }

    /// `tally delete`: moves a record to the trash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id.
    pub async fn delete(&self, out: &mut dyn Write, id: &str) -> Result<bool> {
        let changed = self.store.soft_delete(&RecordId::new(id)).await?;
        let message = if changed {
            format!("Moved {id} to trash.")
        } else {
            format!("{id} is already in the trash.")
        };
        self.write_message(out, &message, changed)?;
        Ok(changed)
    }

    /// `tally restore`: takes a record out of the trash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id.
    pub async fn restore(&self, out: &mut dyn Write, id: &str) -> Result<bool> {
        let changed = self.store.restore(&RecordId::new(id)).await?;
        let message = if changed {
            format!("Restored {id}.")
        } else {
            format!("{id} is not in the trash.")
        };
        self.write_message(out, &message, changed)?;
        Ok(changed)
    }

    /// `tally status`: storage location, schema version and record counts.
    ///
    /// Works on an unsupported platform too, reporting why storage is off.
    ///
    /// # Errors
    ///
    /// Returns any store error other than unavailability.
    pub async fn status(&self, out: &mut dyn Write) -> Result<StatusReport> {
        let handle = self.store.handle();
        let unavailable_reason = match handle.capability() {
            Capability::Supported => None,
            Capability::Unsupported { reason } => Some(reason.clone()),
        };

        let (schema_version, counts) = if unavailable_reason.is_none() {
            (handle.schema_version()?, self.store.count().await?)
        } else {
            (0, crate::models::RecordCounts::default())
        };

        let report = StatusReport {
            version: env!("CARGO_PKG_VERSION"),
            location: handle.location().to_string(),
            supported: unavailable_reason.is_none(),
            unavailable_reason,
            schema_version,
            counts,
        };
        write_status(out, self.format, &report)?;
        Ok(report)
    }

    fn write_message(&self, out: &mut dyn Write, message: &str, changed: bool) -> Result<()> {
        match self.format {
            OutputFormat::Table => writeln!(out, "{message}").map_err(|e| io_error(&e)),
            OutputFormat::Json => {
                let value = serde_json::json!({ "changed": changed, "message": message });
                writeln!(out, "{value}").map_err(|e| io_error(&e))
            },
        }
    }
}
