// Row sources - turn extracted tables (or exported rows) into RawRows
//
// PDF table extraction itself happens upstream. This module takes what the
// extractor hands over: one table per page, header row first.

use crate::schema::RawRow;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// One extracted table: rows of optional cell text, header row first.
pub type Table = Vec<Vec<Option<String>>>;

/// Flatten per-page tables into one row sequence.
///
/// Header labels are trimmed; each following row is zipped with its page's
/// header. Cells past the header are dropped, missing cells are absent.
/// Pages without a table (`None`) or with only a header contribute nothing.
pub fn rows_from_tables(pages: &[Option<Table>]) -> Vec<RawRow> {
    let mut rows = Vec::new();

    for table in pages.iter().flatten() {
        let Some((header, body)) = table.split_first() else {
            continue;
        };

        let labels: Vec<String> = header
            .iter()
            .map(|h| h.as_deref().unwrap_or("").trim().to_string())
            .collect();

        for cells in body {
            let row = labels
                .iter()
                .enumerate()
                .map(|(i, label)| (label.clone(), cells.get(i).cloned().flatten()))
                .collect::<RawRow>();
            rows.push(row);
        }
    }

    debug!(pages = pages.len(), rows = rows.len(), "flattened extracted tables");
    rows
}

/// Row mapping as exported JSON: label → string, number or null.
pub fn row_from_json(object: &Map<String, Value>) -> RawRow {
    object
        .iter()
        .map(|(label, value)| {
            let cell = match value {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            };
            (label.trim().to_string(), cell)
        })
        .collect()
}

/// Inverse of [`row_from_json`]: label → string or null, in column order.
pub fn row_to_json(row: &RawRow) -> Map<String, Value> {
    row.cells()
        .map(|(label, cell)| {
            let value = cell.map_or(Value::Null, |c| Value::String(c.to_string()));
            (label.to_string(), value)
        })
        .collect()
}

/// What a caller can submit: per-page tables or already-flattened rows.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StatementInput {
    Pages { pages: Vec<Option<Table>> },
    Rows { rows: Vec<Map<String, Value>> },
    RowList(Vec<Map<String, Value>>),
}

impl StatementInput {
    pub fn into_rows(self) -> Vec<RawRow> {
        match self {
            StatementInput::Pages { pages } => rows_from_tables(&pages),
            StatementInput::Rows { rows } | StatementInput::RowList(rows) => {
                rows.iter().map(row_from_json).collect()
            }
        }
    }
}

/// Read rows from a JSON document (see [`StatementInput`]).
pub fn read_rows_json<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let input: StatementInput = serde_json::from_reader(reader)
        .context("JSON must be {\"pages\": [...]}, {\"rows\": [...]} or an array of row objects")?;
    Ok(input.into_rows())
}

pub fn load_rows_json(file_path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    read_rows_json(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON from {}", file_path.display()))
}

/// Read rows from CSV with a header row. Empty cells are absent.
pub fn read_rows_csv<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let labels: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        // +2: 1-indexed plus the header row
        let record = result.with_context(|| format!("Failed to parse CSV line {}", line_num + 2))?;

        let row = labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let cell = record.get(i).filter(|c| !c.is_empty()).map(str::to_string);
                (label.clone(), cell)
            })
            .collect::<RawRow>();
        rows.push(row);
    }

    Ok(rows)
}

pub fn load_rows_csv(file_path: &Path) -> Result<Vec<RawRow>> {
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    read_rows_csv(file).with_context(|| format!("Failed to parse CSV from {}", file_path.display()))
}

/// Load rows by extension: `.csv` as CSV, anything else as JSON.
pub fn load_rows(file_path: &Path) -> Result<Vec<RawRow>> {
    let is_csv = file_path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        load_rows_csv(file_path)
    } else {
        load_rows_json(file_path)
    }
}

// ============================================================================
// TESTS
// ============================================================================
