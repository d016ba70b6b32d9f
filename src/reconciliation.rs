// ⚖️ Totals Reconciler - Decide the statement's authoritative totals
//
// Two strategies:
//   Computed   → sum the transactions
//   Positional → read the bank-stated totals from summary rows at fixed
//                offsets from the end of the table
//
// Bank-stated totals can cover lines outside the extracted window
// (pagination, carry-forward), so a Positional result may differ from the
// transaction sum. That difference is reported, never "fixed".

use crate::error::{Result, StatementError};
use crate::model::{OverallTotals, Transaction};
use crate::normalize::normalize_amount;
use crate::schema::RawRow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TOTALS STRATEGY
// ============================================================================

/// A summary cell: `offset_from_end` rows back from the end (1 = last row),
/// under `column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCell {
    pub offset_from_end: usize,
    pub column: String,
}

impl SummaryCell {
    pub fn new(offset_from_end: usize, column: &str) -> Self {
        SummaryCell {
            offset_from_end,
            column: column.to_string(),
        }
    }

    /// Normalized amount of this cell.
    fn read(&self, rows: &[RawRow]) -> Result<Decimal> {
        let index = rows
            .len()
            .checked_sub(self.offset_from_end)
            .filter(|_| self.offset_from_end > 0)
            .ok_or(StatementError::TotalsExtraction {
                required: self.offset_from_end.max(1),
                found: rows.len(),
            })?;
        let cell = rows[index].require(&self.column, index)?;
        Ok(normalize_amount(cell))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotalsStrategy {
    /// The statement has no summary rows; totals are the transaction sums.
    Computed,

    /// The statement states its own totals in trailing summary rows.
    Positional { debit: SummaryCell, credit: SummaryCell },
}

impl TotalsStrategy {
    /// Minimum rows the strategy needs (0 for Computed).
    pub fn min_rows(&self) -> usize {
        match self {
            TotalsStrategy::Computed => 0,
            TotalsStrategy::Positional { debit, credit } => {
                debit.offset_from_end.max(credit.offset_from_end)
            }
        }
    }

    /// Overall totals for a statement.
    ///
    /// `rows` is the full raw row sequence in statement order;
    /// `transactions` are the normalized rows.
    pub fn reconcile(&self, rows: &[RawRow], transactions: &[Transaction]) -> Result<OverallTotals> {
        match self {
            TotalsStrategy::Computed => OverallTotals::of(transactions),
            TotalsStrategy::Positional { debit, credit } => {
                let required = self.min_rows().max(1);
                if rows.len() < required {
                    return Err(StatementError::TotalsExtraction {
                        required,
                        found: rows.len(),
                    });
                }

                Ok(OverallTotals {
                    total_debited: debit.read(rows)?,
                    total_credited: credit.read(rows)?,
                })
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TotalsStrategy::Computed => "computed",
            TotalsStrategy::Positional { .. } => "positional",
        }
    }
}

// ============================================================================
// RECONCILIATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconciliationResult {
    /// Stated and computed agree within tolerance
    Balanced { amount: Decimal },

    /// Off by less than the major threshold
    MinorDiscrepancy {
        stated: Decimal,
        computed: Decimal,
        difference: Decimal,
    },

    /// Off by the major threshold or more
    MajorDiscrepancy {
        stated: Decimal,
        computed: Decimal,
        difference: Decimal,
    },
}

impl ReconciliationResult {
    pub fn is_balanced(&self) -> bool {
        matches!(self, ReconciliationResult::Balanced { .. })
    }

    pub fn difference(&self) -> Decimal {
        match self {
            ReconciliationResult::Balanced { .. } => Decimal::ZERO,
            ReconciliationResult::MinorDiscrepancy { difference, .. } => *difference,
            ReconciliationResult::MajorDiscrepancy { difference, .. } => *difference,
        }
    }
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub strategy: String,
    pub transaction_count: usize,
    pub stated: OverallTotals,
    pub computed: OverallTotals,
    pub debit: ReconciliationResult,
    pub credit: ReconciliationResult,
}

impl ReconciliationReport {
    pub fn is_balanced(&self) -> bool {
        self.debit.is_balanced() && self.credit.is_balanced()
    }

    pub fn summary(&self) -> String {
        format!(
            "Reconciliation ({}): {} transactions, debited stated {} vs computed {} (diff {}), credited stated {} vs computed {} (diff {})",
            self.strategy,
            self.transaction_count,
            self.stated.total_debited,
            self.computed.total_debited,
            self.debit.difference(),
            self.stated.total_credited,
            self.computed.total_credited,
            self.credit.difference(),
        )
    }
}

impl fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

/// Compares stated totals against transaction sums. Informational only:
/// the summary keeps the stated totals either way.
pub struct ReconciliationEngine {
    /// Differences below this are rounding (default: 0.01)
    pub tolerance: Decimal,

    /// Threshold for minor vs major discrepancy (default: 10.00)
    pub major_discrepancy_threshold: Decimal,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine {
            tolerance: Decimal::new(1, 2),
            major_discrepancy_threshold: Decimal::new(10, 0),
        }
    }

    pub fn compare(
        &self,
        strategy: &TotalsStrategy,
        stated: OverallTotals,
        transactions: &[Transaction],
    ) -> Result<ReconciliationReport> {
        let computed = OverallTotals::of(transactions)?;

        Ok(ReconciliationReport {
            strategy: strategy.name().to_string(),
            transaction_count: transactions.len(),
            stated,
            computed,
            debit: self.classify(stated.total_debited, computed.total_debited, "debit")?,
            credit: self.classify(stated.total_credited, computed.total_credited, "credit")?,
        })
    }

    fn classify(
        &self,
        stated: Decimal,
        computed: Decimal,
        field: &'static str,
    ) -> Result<ReconciliationResult> {
        let difference = stated
            .checked_sub(computed)
            .ok_or(StatementError::AmountOverflow { field })?
            .abs();

        let result = if difference < self.tolerance {
            ReconciliationResult::Balanced { amount: stated }
        } else if difference < self.major_discrepancy_threshold {
            ReconciliationResult::MinorDiscrepancy {
                stated,
                computed,
                difference,
            }
        } else {
            ReconciliationResult::MajorDiscrepancy {
                stated,
                computed,
                difference,
            }
        };
        Ok(result)
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn union_strategy() -> TotalsStrategy {
        TotalsStrategy::Positional {
            debit: SummaryCell::new(4, "Withdrawal"),
            credit: SummaryCell::new(3, "Withdrawal"),
        }
    }

    fn row(withdrawal: &str) -> RawRow {
        RawRow::new()
            .with_cell("Particulars", Some("x"))
            .with_cell("Withdrawal", Some(withdrawal))
            .with_cell("Deposit", Some(""))
    }

    #[test]
    fn test_computed_sums_transactions() {
        let txs = vec![
            Transaction::new(dec!(100), Decimal::ZERO, "a"),
            Transaction::new(Decimal::ZERO, dec!(50), "b"),
        ];
        let totals = TotalsStrategy::Computed.reconcile(&[], &txs).unwrap();
        assert_eq!(totals.total_debited, dec!(100));
        assert_eq!(totals.total_credited, dec!(50));
    }

    #[test]
    fn test_positional_reads_offsets_from_end() {
        let rows = vec![
            row("10.00"),
            row("20.00"),
            row("1,530.00"), // N-4: stated debit total
            row("2,000.50"), // N-3: stated credit total
            row("closing"),
            row(""),
        ];
        let totals = union_strategy().reconcile(&rows, &[]).unwrap();
        assert_eq!(totals.total_debited, dec!(1530));
        assert_eq!(totals.total_credited, dec!(2000.50));
    }

    #[test]
    fn test_positional_exactly_min_rows() {
        let rows = vec![row("7"), row("8"), row("9"), row("10")];
        let totals = union_strategy().reconcile(&rows, &[]).unwrap();
        assert_eq!(totals.total_debited, dec!(7));
        assert_eq!(totals.total_credited, dec!(8));
    }

    #[test]
    fn test_positional_too_few_rows() {
        let rows = vec![row("1"), row("2"), row("3")];
        let err = union_strategy().reconcile(&rows, &[]).unwrap_err();
        assert_eq!(err, StatementError::TotalsExtraction { required: 4, found: 3 });
    }

    #[test]
    fn test_positional_summary_row_without_column() {
        let rows = vec![
            RawRow::new().with_cell("Balance", Some("1")),
            row("2"),
            row("3"),
            row("4"),
        ];
        let err = union_strategy().reconcile(&rows, &[]).unwrap_err();
        assert_eq!(
            err,
            StatementError::Schema {
                column: "Withdrawal".to_string(),
                row: 0
            }
        );
    }

    #[test]
    fn test_min_rows() {
        assert_eq!(TotalsStrategy::Computed.min_rows(), 0);
        assert_eq!(union_strategy().min_rows(), 4);
    }

    #[test]
    fn test_report_balanced() {
        let engine = ReconciliationEngine::new();
        let txs = vec![Transaction::new(dec!(100), dec!(40), "a")];
        let stated = OverallTotals {
            total_debited: dec!(100.00),
            total_credited: dec!(40.001),
        };
        let report = engine.compare(&union_strategy(), stated, &txs).unwrap();
        assert!(report.is_balanced());
        assert_eq!(report.strategy, "positional");
    }

    #[test]
    fn test_report_minor_and_major() {
        let engine = ReconciliationEngine::new();
        let txs = vec![Transaction::new(dec!(100), dec!(40), "a")];
        let stated = OverallTotals {
            total_debited: dec!(105),
            total_credited: dec!(140),
        };
        let report = engine.compare(&union_strategy(), stated, &txs).unwrap();

        assert!(!report.is_balanced());
        assert!(matches!(report.debit, ReconciliationResult::MinorDiscrepancy { .. }));
        assert!(!report.debit.is_balanced());
        assert_eq!(report.debit.difference(), dec!(5));
        assert!(matches!(report.credit, ReconciliationResult::MajorDiscrepancy { .. }));
        assert_eq!(report.credit.difference(), dec!(100));
        assert!(report.summary().contains("1 transactions"));
    }

    #[test]
    fn test_tighter_thresholds() {
        let engine = ReconciliationEngine {
            tolerance: dec!(0.001),
            major_discrepancy_threshold: dec!(1),
        };
        let txs = vec![Transaction::new(dec!(100), Decimal::ZERO, "a")];
        let stated = OverallTotals {
            total_debited: dec!(102),
            total_credited: Decimal::ZERO,
        };
        let report = engine.compare(&TotalsStrategy::Computed, stated, &txs).unwrap();
        assert!(matches!(report.debit, ReconciliationResult::MajorDiscrepancy { .. }));
        assert!(report.credit.is_balanced());
    }
}
