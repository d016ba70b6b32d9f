// 📐 Row Schema Adapter - per-bank column layout → canonical fields
//
// A missing column is a hard error: it means the wrong bank was picked or
// the statement layout changed, and defaulting would corrupt totals.

use crate::error::{Result, StatementError};
use serde::{Deserialize, Serialize};

// ============================================================================
// RAW ROW
// ============================================================================

/// One extracted table row: column label → cell text, in column order.
///
/// A cell can be absent (`None`) when the extractor found the column but
/// no text under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    cells: Vec<(String, Option<String>)>,
}

impl RawRow {
    pub fn new() -> Self {
        RawRow { cells: Vec::new() }
    }

    /// Builder pattern: append a cell
    pub fn with_cell(mut self, label: impl Into<String>, value: Option<&str>) -> Self {
        self.push(label, value.map(str::to_string));
        self
    }

    /// Append a cell. A repeated label overwrites the earlier value in place,
    /// the way a header zip into a map would.
    pub fn push(&mut self, label: impl Into<String>, value: Option<String>) {
        let label = label.into();
        match self.cells.iter_mut().find(|(l, _)| *l == label) {
            Some(existing) => existing.1 = value,
            None => self.cells.push((label, value)),
        }
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    /// Cell under `label`; the outer `None` means the column is missing.
    pub fn get(&self, label: &str) -> Option<Option<&str>> {
        self.position(label)
            .map(|idx| self.cells[idx].1.as_deref())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(l, _)| l.as_str())
    }

    /// (label, cell) pairs in column order
    pub fn cells(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.cells.iter().map(|(l, v)| (l.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn position(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        self.cells.iter().position(|(l, _)| l.trim() == label)
    }

    /// Cell under `label`, failing with a schema error if the column is
    /// missing. `row` is the row's position, used in the error.
    pub fn require(&self, label: &str, row: usize) -> Result<Option<&str>> {
        self.get(label).ok_or_else(|| StatementError::Schema {
            column: label.to_string(),
            row,
        })
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<Option<String>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (label, value) in iter {
            row.push(label, value.into());
        }
        row
    }
}

// ============================================================================
// COLUMN MAP
// ============================================================================

/// Which columns hold debit, credit and description for one bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub debit: String,
    pub credit: String,
    pub description: String,
}

/// Canonical cell texts of one row, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptedRow<'a> {
    pub debit: Option<&'a str>,
    pub credit: Option<&'a str>,
    pub description: Option<&'a str>,
}

impl ColumnMap {
    pub fn new(debit: &str, credit: &str, description: &str) -> Self {
        ColumnMap {
            debit: debit.to_string(),
            credit: credit.to_string(),
            description: description.to_string(),
        }
    }

    /// Map `raw` onto the canonical fields. `row` is its position in the
    /// statement and only feeds the error.
    pub fn adapt<'a>(&self, raw: &'a RawRow, row: usize) -> Result<AdaptedRow<'a>> {
        Ok(AdaptedRow {
            debit: raw.require(&self.debit, row)?,
            credit: raw.require(&self.credit, row)?,
            description: raw.require(&self.description, row)?,
        })
    }

    /// True when every column this map needs appears in `labels`.
    pub fn matches_headers<'h>(&self, labels: impl IntoIterator<Item = &'h str>) -> bool {
        let labels: Vec<&str> = labels.into_iter().map(str::trim).collect();
        [&self.debit, &self.credit, &self.description]
            .iter()
            .all(|needed| labels.contains(&needed.as_str()))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sbi_columns() -> ColumnMap {
        ColumnMap::new("Debit", "Credit", "Details")
    }

    #[test]
    fn test_adapt_reads_mapped_columns() {
        let raw = RawRow::new()
            .with_cell("Txn Date", Some("01 Apr 2024"))
            .with_cell("Details", Some("UPI/DR/1/ABC"))
            .with_cell("Debit", Some("1,000.00"))
            .with_cell("Credit", None);

        let adapted = sbi_columns().adapt(&raw, 0).unwrap();
        assert_eq!(adapted.debit, Some("1,000.00"));
        assert_eq!(adapted.credit, None);
        assert_eq!(adapted.description, Some("UPI/DR/1/ABC"));
    }

    #[test]
    fn test_adapt_missing_column_is_schema_error() {
        let raw = RawRow::new()
            .with_cell("Details", Some("x"))
            .with_cell("Debit", Some("1"));

        let err = sbi_columns().adapt(&raw, 3).unwrap_err();
        assert_eq!(
            err,
            StatementError::Schema {
                column: "Credit".to_string(),
                row: 3
            }
        );
    }

    #[test]
    fn test_labels_are_trimmed_on_lookup() {
        let raw = RawRow::new().with_cell(" Debit ", Some("5"));
        assert!(raw.has_column("Debit"));
        assert_eq!(raw.get("Debit"), Some(Some("5")));
    }

    #[test]
    fn test_repeated_label_overwrites_in_place() {
        let raw: RawRow = vec![("A", Some("1".to_string())), ("B", None), ("A", Some("2".to_string()))]
            .into_iter()
            .collect();
        assert_eq!(raw.len(), 2);
        assert!(!raw.is_empty());
        assert!(RawRow::new().is_empty());
        assert_eq!(raw.get("A"), Some(Some("2")));
        assert_eq!(raw.labels().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_matches_headers() {
        let columns = sbi_columns();
        assert!(columns.matches_headers(["Txn Date", "Details", "Debit", "Credit", "Balance"]));
        assert!(!columns.matches_headers(["Particulars", "Withdrawal", "Deposit"]));
    }
}
