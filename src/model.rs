// Statement model - normalized transactions and the summary built from them

use crate::error::{Result, StatementError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A normalized statement line.
///
/// Usually only one of debit/credit is non-zero, but both are normalized
/// independently and nothing enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(with = "rust_decimal::serde::float")]
    pub debit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub credit: Decimal,
    pub description: String,
    pub identifier: Option<String>,
}

impl Transaction {
    pub fn new(debit: Decimal, credit: Decimal, description: impl Into<String>) -> Self {
        Transaction {
            debit,
            credit,
            description: description.into(),
            identifier: None,
        }
    }

    /// Builder pattern: attach the extracted identifier
    pub fn with_identifier(mut self, identifier: Option<String>) -> Self {
        self.identifier = identifier;
        self
    }
}

/// Transactions sharing one identifier. `identifier: None` is the catch-all
/// group for descriptions no pattern matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionGroup {
    #[serde(rename = "UPI")]
    pub identifier: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_debited: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_credited: Decimal,
    pub transactions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_debited: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_credited: Decimal,
}

impl OverallTotals {
    /// Sum of debits and credits over `transactions`.
    pub fn of(transactions: &[Transaction]) -> Result<Self> {
        transactions
            .iter()
            .try_fold(OverallTotals::default(), |acc, tx| acc.add(tx.debit, tx.credit))
    }

    /// Add one line's amounts, failing instead of wrapping past `Decimal::MAX`.
    pub fn add(self, debit: Decimal, credit: Decimal) -> Result<Self> {
        Ok(OverallTotals {
            total_debited: checked_sum(self.total_debited, debit, "debit")?,
            total_credited: checked_sum(self.total_credited, credit, "credit")?,
        })
    }
}

pub(crate) fn checked_sum(total: Decimal, amount: Decimal, field: &'static str) -> Result<Decimal> {
    total
        .checked_add(amount)
        .ok_or(StatementError::AmountOverflow { field })
}

/// Result of parsing one statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub upi_summary: Vec<TransactionGroup>,
    pub overall_totals: OverallTotals,
}

impl StatementSummary {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn transaction_count(&self) -> usize {
        self.upi_summary.iter().map(|g| g.transactions.len()).sum()
    }
}
