//! Clipboard payloads and CSV file export for grid data.

use std::path::{Path, PathBuf};

use chrono::Local;
use eyre::{Context, Result};
use itertools::Itertools;

use super::model::{Column, Row};

/// Delimiter for the "copy all" payload and CSV files.
pub const CSV_DELIMITER: char = ';';

const UTF8_BOM: char = '\u{feff}';

/// Formats rows as tab-separated values for the clipboard, one line per
/// row, in display order. No header row. Tabs and newlines inside cell
/// values are replaced with spaces.
#[must_use]
pub fn format_rows_as_tsv(rows: &[&Row]) -> String {
    rows.iter()
        .map(|row| {
            row.values
                .iter()
                .map(|value| escape_cell(&value.display()))
                .join("\t")
        })
        .join("\n")
}

/// Formats the whole projection with a header line first, values joined
/// with the CSV delimiter.
#[must_use]
pub fn format_rows_with_header(columns: &[Column], rows: &[&Row]) -> String {
    let header = columns
        .iter()
        .map(|column| column.label.as_str())
        .join(&CSV_DELIMITER.to_string());

    let delimiter = CSV_DELIMITER.to_string();
    std::iter::once(header)
        .chain(rows.iter().map(|row| {
            row.values
                .iter()
                .map(|value| escape_cell(&value.display()))
                .join(&delimiter)
        }))
        .join("\n")
}

fn escape_cell(text: &str) -> String {
    text.replace(['\t', '\n'], " ")
}

/// Outcome of a CSV export attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Written(PathBuf),
    /// Zero rows: nothing was written
    NothingToExport,
}

/// Default filename offered for an export: `prefix_YYYYMMDD_HHMMSS.csv`.
#[must_use]
pub fn default_export_filename(prefix: &str) -> String {
    format!("{prefix}_{}.csv", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Writes the projection to `destination` as `;`-delimited text with a
/// UTF-8 byte-order mark. With zero rows nothing is written and
/// [`ExportStatus::NothingToExport`] is returned instead.
pub fn export_csv(columns: &[Column], rows: &[&Row], destination: &Path) -> Result<ExportStatus> {
    if rows.is_empty() {
        return Ok(ExportStatus::NothingToExport);
    }

    let mut content = String::new();
    content.push(UTF8_BOM);
    content.push_str(&format_rows_with_header(columns, rows));
    content.push('\n');

    std::fs::write(destination, content)
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    Ok(ExportStatus::Written(destination.to_path_buf()))
}
