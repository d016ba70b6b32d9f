// Statement pipeline
//
//   rows → non-empty check → adapt → normalize → extract identifier
//        → reconcile totals (over raw rows) → aggregate → StatementSummary
//
// Strictly linear; nothing survives between calls.

use crate::aggregate::aggregate;
use crate::error::{Result, StatementError};
use crate::model::{StatementSummary, Transaction};
use crate::normalize::normalize_amount;
use crate::parser::{BankParser, InstitutionVariant, ParserRegistry};
use crate::reconciliation::{ReconciliationEngine, ReconciliationReport};
use crate::schema::RawRow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

// ============================================================================
// PARSE LIMITS
// ============================================================================

/// Bounds for one parse: row cap, deadline and a cancel flag the caller
/// can raise from another thread.
#[derive(Debug, Clone, Default)]
pub struct ParseLimits {
    pub max_rows: Option<usize>,
    pub deadline: Option<Instant>,
    cancel: Arc<AtomicBool>,
}

impl ParseLimits {
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Builder pattern: cap the row count
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Builder pattern: stop once `deadline` passes
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Handle that cancels every parse sharing these limits.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Raise the cancel flag; the parse stops at its next checkpoint.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    fn check_size(&self, rows: usize) -> Result<()> {
        match self.max_rows {
            Some(limit) if rows > limit => Err(StatementError::TooManyRows { limit, found: rows }),
            _ => Ok(()),
        }
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(StatementError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(StatementError::TimedOut);
        }
        Ok(())
    }
}

// Rows between cancel/deadline checks
const CHECK_EVERY: usize = 1024;

// ============================================================================
// PIPELINE
// ============================================================================

/// Normalize every row into a transaction using `parser`'s conventions.
pub fn normalize_rows(
    rows: &[RawRow],
    parser: &dyn BankParser,
    limits: &ParseLimits,
) -> Result<Vec<Transaction>> {
    let columns = parser.columns();
    let pattern = parser.identifier_pattern();

    let mut transactions = Vec::with_capacity(rows.len());
    for (idx, raw) in rows.iter().enumerate() {
        if idx % CHECK_EVERY == 0 {
            limits.checkpoint()?;
        }

        let adapted = columns.adapt(raw, idx)?;
        let description = adapted.description.unwrap_or("");

        let tx = Transaction::new(
            normalize_amount(adapted.debit),
            normalize_amount(adapted.credit),
            description,
        )
        .with_identifier(pattern.extract(description));

        transactions.push(tx);
    }

    Ok(transactions)
}

/// Parse one statement's rows with an already-resolved parser.
pub fn parse_with(
    rows: &[RawRow],
    parser: &dyn BankParser,
    limits: &ParseLimits,
) -> Result<StatementSummary> {
    parse_detailed(rows, parser, limits).map(|(summary, _)| summary)
}

/// Like [`parse_with`], also returning the stated-vs-computed report.
pub fn parse_detailed(
    rows: &[RawRow],
    parser: &dyn BankParser,
    limits: &ParseLimits,
) -> Result<(StatementSummary, ReconciliationReport)> {
    if rows.is_empty() {
        return Err(StatementError::EmptyDocument);
    }
    limits.check_size(rows.len())?;

    let transactions = normalize_rows(rows, parser, limits)?;
    debug!(
        bank = %parser.variant(),
        parser_version = parser.version(),
        transactions = transactions.len(),
        "normalized rows"
    );

    let strategy = parser.totals_strategy();
    let overall_totals = strategy.reconcile(rows, &transactions)?;

    let report = ReconciliationEngine::new().compare(strategy, overall_totals, &transactions)?;
    if report.is_balanced() {
        debug!(strategy = strategy.name(), "stated totals match transactions");
    } else {
        warn!(bank = %parser.variant(), "{}", report.summary());
    }

    limits.checkpoint()?;
    let upi_summary = aggregate(&transactions)?;
    debug!(groups = upi_summary.len(), "aggregated transactions");

    Ok((
        StatementSummary {
            upi_summary,
            overall_totals,
        },
        report,
    ))
}

/// Resolve `variant` in `registry` and parse `rows` without limits.
pub fn parse_rows(
    rows: &[RawRow],
    variant: InstitutionVariant,
    registry: &ParserRegistry,
) -> Result<StatementSummary> {
    let parser = registry.resolve(variant)?;
    parse_with(rows, parser, &ParseLimits::unlimited())
}

// ============================================================================
// TESTS
// ============================================================================
