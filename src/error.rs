// Statement Errors - Failure taxonomy of the parsing pipeline
//
// Numeric parse failures are NOT here: the normalizer absorbs them as zero.

use thiserror::Error;

/// Errors surfaced by the statement pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatementError {
    /// No rows came out of table extraction.
    #[error("No tables found in PDF")]
    EmptyDocument,

    /// A column the bank's layout requires is missing from a row.
    /// Usually the wrong bank was selected or the layout changed.
    #[error("missing required column '{column}' in row {row}")]
    Schema { column: String, row: usize },

    /// Positional totals need more rows than the statement has.
    #[error("positional totals need at least {required} rows, statement has {found}")]
    TotalsExtraction { required: usize, found: usize },

    /// Summing the statement's amounts left the representable range.
    #[error("amount total out of range while summing {field}")]
    AmountOverflow { field: &'static str },

    #[error("unknown bank variant: {0}")]
    UnknownVariant(String),

    #[error("statement has {found} rows, limit is {limit}")]
    TooManyRows { limit: usize, found: usize },

    #[error("parse cancelled")]
    Cancelled,

    #[error("parse exceeded its time budget")]
    TimedOut,
}

impl StatementError {
    /// Recoverable errors become a structured response for the caller.
    /// The rest indicate misconfiguration or resource limits.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StatementError::EmptyDocument
                | StatementError::Schema { .. }
                | StatementError::AmountOverflow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StatementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_message() {
        assert_eq!(StatementError::EmptyDocument.to_string(), "No tables found in PDF");
    }

    #[test]
    fn test_recoverable_split() {
        assert!(StatementError::EmptyDocument.is_recoverable());
        assert!(StatementError::Schema { column: "Debit".into(), row: 0 }.is_recoverable());
        assert!(StatementError::AmountOverflow { field: "debit" }.is_recoverable());
        assert!(!StatementError::TotalsExtraction { required: 4, found: 2 }.is_recoverable());
        assert!(!StatementError::UnknownVariant("hdfc".into()).is_recoverable());
        assert!(!StatementError::TimedOut.is_recoverable());
    }

    #[test]
    fn test_schema_message_names_column() {
        let err = StatementError::Schema { column: "Withdrawal".into(), row: 7 };
        assert_eq!(err.to_string(), "missing required column 'Withdrawal' in row 7");
    }
}
