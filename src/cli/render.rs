//! Output rendering for CLI commands.

use crate::models::{Record, RecordCounts, render_amount};
use crate::{Error, Result};
use chrono::SecondsFormat;
use serde::Serialize;
use std::io::Write;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned plain-text table.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
}

/// Formats an amount with the sign its type implies: `+` income, `-` expense.
#[must_use]
pub fn signed_display(record: &Record) -> String {
    format!("{}{}", record.record_type.sign(), render_amount(record.amount))
}

pub(crate) fn io_error(e: &std::io::Error) -> Error {
    Error::OperationFailed {
        operation: "write_output".to_string(),
        cause: e.to_string(),
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(|e| Error::OperationFailed {
        operation: "serialize_output".to_string(),
        cause: e.to_string(),
    })?;
    writeln!(out).map_err(|e| io_error(&e))
}

/// Writes a list of records.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_records(out: &mut dyn Write, format: OutputFormat, records: &[Record]) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, records),
        OutputFormat::Table => {
            if records.is_empty() {
                return writeln!(out, "No records.").map_err(|e| io_error(&e));
            }

            let id_width = column_width(records.iter().map(|r| r.id.as_str().len()), "ID");
            let title_width = column_width(records.iter().map(|r| r.title.chars().count()), "TITLE");
            let amount_width =
                column_width(records.iter().map(|r| signed_display(r).len()), "AMOUNT");

            writeln!(
                out,
                "{:<id_width$}  {:<title_width$}  {:>amount_width$}  CREATED",
                "ID", "TITLE", "AMOUNT"
            )
            .map_err(|e| io_error(&e))?;
            for record in records {
                writeln!(
                    out,
                    "{:<id_width$}  {:<title_width$}  {:>amount_width$}  {}",
                    record.id.as_str(),
                    record.title,
                    signed_display(record),
                    record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                )
                .map_err(|e| io_error(&e))?;
            }
            Ok(())
        },
    }
}

fn column_width(lengths: impl Iterator<Item = usize>, header: &str) -> usize {
    lengths.max().unwrap_or(0).max(header.len())
}

/// Writes a single record.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_record(out: &mut dyn Write, format: OutputFormat, record: &Record) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, record),
        OutputFormat::Table => {
            let deleted = record.deleted_at.map_or_else(
                || "-".to_string(),
                |ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
            writeln!(out, "ID:      {}", record.id)
                .and_then(|()| writeln!(out, "Title:   {}", record.title))
                .and_then(|()| writeln!(out, "Amount:  {}", signed_display(record)))
                .and_then(|()| writeln!(out, "Type:    {}", record.record_type))
                .and_then(|()| writeln!(out, "Status:  {}", record.status().as_str()))
                .and_then(|()| {
                    writeln!(
                        out,
                        "Created: {}",
                        record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
                    )
                })
                .and_then(|()| writeln!(out, "Trashed: {deleted}"))
                .map_err(|e| io_error(&e))
        },
    }
}

/// Store status as reported by `tally status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Crate version.
    pub version: &'static str,
    /// Database location.
    pub location: String,
    /// Whether local storage is available.
    pub supported: bool,
    /// Why storage is unavailable, if it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
    /// Applied schema version.
    pub schema_version: i32,
    /// Record counts.
    pub counts: RecordCounts,
}

/// Writes a status report.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_status(out: &mut dyn Write, format: OutputFormat, report: &StatusReport) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(out, report),
        OutputFormat::Table => {
            let storage = report
                .unavailable_reason
                .as_deref()
                .map_or_else(|| "Available".to_string(), |reason| format!("Unavailable ({reason})"));
            writeln!(out, "Tally Status")
                .and_then(|()| writeln!(out, "============"))
                .and_then(|()| writeln!(out))
                .and_then(|()| writeln!(out, "Version: {}", report.version))
                .and_then(|()| writeln!(out, "Storage: {storage}"))
                .and_then(|()| writeln!(out, "  Path: {}", report.location))
                .and_then(|()| writeln!(out, "  Schema version: {}", report.schema_version))
                .and_then(|()| writeln!(out, "Records:"))
                .and_then(|()| writeln!(out, "  Active:  {}", report.counts.active))
                .and_then(|()| writeln!(out, "  Trashed: {}", report.counts.trashed))
                .map_err(|e| io_error(&e))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::models::RecordType;

    fn record(id: &str, title: &str, amount: f64, record_type: RecordType) -> Record {
        Record::new(
            id,
            title,
            amount,
            record_type,
            Utc.with_ymd_and_hms(2025, 10, 1, 8, 30, 0).unwrap(),
        )
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_signed_display() {
        assert_eq!(
            signed_display(&record("1", "Coffee", 35000.0, RecordType::Expense)),
            "-35000"
        );
        assert_eq!(
            signed_display(&record("2", "Salary", 99.5, RecordType::Income)),
            "+99.5"
        );
    }

    #[test]
    fn test_table_output() {
        let records = vec![
            record("1", "Coffee", 35000.0, RecordType::Expense),
            record("22", "Salary", 1_500_000.0, RecordType::Income),
        ];
        let text = render(|out| write_records(out, OutputFormat::Table, &records));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID  TITLE "));
        assert!(lines[1].contains("Coffee"));
        assert!(lines[1].contains("-35000"));
        assert!(lines[2].contains("+1500000"));
        assert!(lines[2].ends_with("2025-10-01T08:30:00Z"));
    }

    #[test]
    fn test_empty_table_output() {
        let text = render(|out| write_records(out, OutputFormat::Table, &[]));
        assert_eq!(text, "No records.\n");
    }

    #[test]
    fn test_json_output_uses_type_field() {
        let records = vec![record("1", "Coffee", 35000.0, RecordType::Expense)];
        let text = render(|out| write_records(out, OutputFormat::Json, &records));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value[0]["id"], "1");
        assert_eq!(value[0]["type"], "expense");
        assert_eq!(value[0]["amount"], 35000.0);
        assert!(value[0]["deleted_at"].is_null());
    }

    #[test]
    fn test_single_record_table() {
        let text = render(|out| {
            write_record(
                out,
                OutputFormat::Table,
                &record("1", "Coffee", 35000.0, RecordType::Expense),
            )
        });
        assert!(text.contains("Title:   Coffee"));
        assert!(text.contains("Status:  active"));
        assert!(text.contains("Trashed: -"));
    }

    #[test]
    fn test_status_table() {
        let report = StatusReport {
            version: "0.1.0",
            location: ":memory:".to_string(),
            supported: false,
            unavailable_reason: Some("disabled".to_string()),
            schema_version: 0,
            counts: RecordCounts::default(),
        };
        let text = render(|out| write_status(out, OutputFormat::Table, &report));
        assert!(text.contains("Storage: Unavailable (disabled)"));
        assert!(text.contains("Active:  0"));
    }
}
