// Aggregator - group transactions by UPI identifier
//
// Output order is fixed so the same statement always serializes the same:
// identifiers ascending, then the no-identifier group last.

use crate::error::Result;
use crate::model::{checked_sum, Transaction, TransactionGroup};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

#[derive(Default)]
struct GroupAccumulator {
    total_debited: Decimal,
    total_credited: Decimal,
    transactions: Vec<String>,
}

impl GroupAccumulator {
    fn add(&mut self, tx: &Transaction) -> Result<()> {
        self.total_debited = checked_sum(self.total_debited, tx.debit, "debit")?;
        self.total_credited = checked_sum(self.total_credited, tx.credit, "credit")?;
        self.transactions.push(tx.description.clone());
        Ok(())
    }

    fn finish(self, identifier: Option<String>) -> TransactionGroup {
        TransactionGroup {
            identifier,
            total_debited: self.total_debited,
            total_credited: self.total_credited,
            transactions: self.transactions,
        }
    }
}

/// Group `transactions` by identifier.
///
/// Every transaction lands in exactly one group; descriptions keep the
/// order they were encountered in. Fails if a group's total overflows.
pub fn aggregate(transactions: &[Transaction]) -> Result<Vec<TransactionGroup>> {
    let mut by_identifier: BTreeMap<&str, GroupAccumulator> = BTreeMap::new();
    let mut unidentified: Option<GroupAccumulator> = None;

    for tx in transactions {
        match tx.identifier.as_deref() {
            Some(id) => by_identifier.entry(id).or_default().add(tx)?,
            None => unidentified.get_or_insert_with(GroupAccumulator::default).add(tx)?,
        }
    }

    let mut groups: Vec<TransactionGroup> = by_identifier
        .into_iter()
        .map(|(id, acc)| acc.finish(Some(id.to_string())))
        .collect();

    if let Some(acc) = unidentified {
        groups.push(acc.finish(None));
    }

    Ok(groups)
}
