// 🏗️ Parser Framework - per-bank statement conventions
// Polymorphic parser system: one parser per bank, resolved through a registry

use crate::error::{Result, StatementError};
use crate::identifier::{IdentifierPattern, UPI_HANDLE_PATTERN, UPI_PATH_PATTERN};
use crate::reconciliation::{SummaryCell, TotalsStrategy};
use crate::schema::ColumnMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ============================================================================
// CORE TYPES
// ============================================================================

/// InstitutionVariant - which bank issued the statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstitutionVariant {
    Sbi,
    UnionBank,
}

impl InstitutionVariant {
    pub const ALL: [InstitutionVariant; 2] = [InstitutionVariant::Sbi, InstitutionVariant::UnionBank];

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            InstitutionVariant::Sbi => "State Bank of India",
            InstitutionVariant::UnionBank => "Union Bank of India",
        }
    }

    /// Short code, also the URL segment
    pub fn code(&self) -> &'static str {
        match self {
            InstitutionVariant::Sbi => "sbi",
            InstitutionVariant::UnionBank => "union",
        }
    }
}

impl fmt::Display for InstitutionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for InstitutionVariant {
    type Err = StatementError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "sbi" | "state_bank" | "state_bank_of_india" => Ok(InstitutionVariant::Sbi),
            "union" | "union_bank" | "union_bank_of_india" | "ubi" => Ok(InstitutionVariant::UnionBank),
            _ => Err(StatementError::UnknownVariant(s.to_string())),
        }
    }
}

// ============================================================================
// BANK PARSER TRAIT
// ============================================================================

/// BankParser - everything that differs between banks
///
/// Adding a bank means implementing this trait and registering it;
/// the pipeline itself never changes.
pub trait BankParser: Send + Sync {
    fn variant(&self) -> InstitutionVariant;

    /// Where debit, credit and description live in this bank's rows
    fn columns(&self) -> &ColumnMap;

    /// How to find the UPI identifier in a description
    fn identifier_pattern(&self) -> &IdentifierPattern;

    /// Where the statement's overall totals come from
    fn totals_strategy(&self) -> &TotalsStrategy;

    /// Parser version (for provenance in logs)
    fn version(&self) -> &str {
        "1.0.0"
    }
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Detect bank from a statement filename
///
/// # Examples:
/// ```
/// use std::path::Path;
/// use upi_summary::{detect_variant_from_filename, InstitutionVariant};
///
/// let variant = detect_variant_from_filename(Path::new("sbi_march_2024.pdf")).unwrap();
/// assert_eq!(variant, InstitutionVariant::Sbi);
/// ```
pub fn detect_variant_from_filename(file_path: &Path) -> Result<InstitutionVariant> {
    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let filename_lower = filename.to_lowercase();

    if filename_lower.contains("sbi") || filename_lower.contains("state_bank") {
        return Ok(InstitutionVariant::Sbi);
    }

    if filename_lower.contains("union") || filename_lower.contains("ubi") {
        return Ok(InstitutionVariant::UnionBank);
    }

    Err(StatementError::UnknownVariant(filename.to_string()))
}

/// Get the parser for a bank
pub fn get_parser(variant: InstitutionVariant) -> Box<dyn BankParser> {
    match variant {
        InstitutionVariant::Sbi => Box::new(SbiParser::new()),
        InstitutionVariant::UnionBank => Box::new(UnionBankParser::new()),
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Variant → parser lookup, resolved once per request.
pub struct ParserRegistry {
    parsers: HashMap<InstitutionVariant, Box<dyn BankParser>>,
}

impl ParserRegistry {
    /// Empty registry
    pub fn new() -> Self {
        ParserRegistry {
            parsers: HashMap::new(),
        }
    }

    /// Registry with every bank this crate knows
    pub fn builtin() -> Self {
        let mut registry = ParserRegistry::new();
        for variant in InstitutionVariant::ALL {
            registry.register(get_parser(variant));
        }
        registry
    }

    /// Register a parser under its own variant, replacing any earlier one.
    pub fn register(&mut self, parser: Box<dyn BankParser>) {
        self.parsers.insert(parser.variant(), parser);
    }

    pub fn resolve(&self, variant: InstitutionVariant) -> Result<&dyn BankParser> {
        self.parsers
            .get(&variant)
            .map(|p| &**p)
            .ok_or_else(|| StatementError::UnknownVariant(variant.code().to_string()))
    }

    /// Registered variants in a stable order
    pub fn variants(&self) -> Vec<InstitutionVariant> {
        let mut variants: Vec<_> = self.parsers.keys().copied().collect();
        variants.sort();
        variants
    }

    /// Pick the registered bank whose columns all appear in `labels`.
    ///
    /// Ambiguous or unmatched headers give `None`.
    pub fn detect_from_headers<'h>(&self, labels: &[&'h str]) -> Option<InstitutionVariant> {
        let mut matches = self
            .variants()
            .into_iter()
            .filter(|v| self.parsers[v].columns().matches_headers(labels.iter().copied()));

        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// PARSERS
// ============================================================================

// Both patterns are literals covered by tests; failing to compile them is a
// programming error.
fn builtin_pattern(pattern: &str) -> IdentifierPattern {
    IdentifierPattern::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

/// State Bank of India
///
/// Columns: Txn Date, Value Date, Details, Ref No./Cheque No., Debit, Credit, Balance
/// No summary rows at the end, so totals are computed.
pub struct SbiParser {
    columns: ColumnMap,
    pattern: IdentifierPattern,
    totals: TotalsStrategy,
}

impl SbiParser {
    pub fn new() -> Self {
        SbiParser {
            columns: ColumnMap::new("Debit", "Credit", "Details"),
            // "UPI/DR/412345678901/MERCHANT" style tokens only
            pattern: builtin_pattern(UPI_PATH_PATTERN),
            totals: TotalsStrategy::Computed,
        }
    }
}

impl Default for SbiParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BankParser for SbiParser {
    fn variant(&self) -> InstitutionVariant {
        InstitutionVariant::Sbi
    }

    fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    fn identifier_pattern(&self) -> &IdentifierPattern {
        &self.pattern
    }

    fn totals_strategy(&self) -> &TotalsStrategy {
        &self.totals
    }
}

/// Union Bank of India
///
/// Columns: Date, Particulars, Chq No, Withdrawal, Deposit, Balance
/// The table ends with summary rows: total withdrawals 4th from last and
/// total deposits 3rd from last, both printed in the Withdrawal column.
pub struct UnionBankParser {
    columns: ColumnMap,
    pattern: IdentifierPattern,
    totals: TotalsStrategy,
}

impl UnionBankParser {
    pub fn new() -> Self {
        UnionBankParser {
            columns: ColumnMap::new("Withdrawal", "Deposit", "Particulars"),
            pattern: builtin_pattern(UPI_HANDLE_PATTERN),
            totals: TotalsStrategy::Positional {
                debit: SummaryCell::new(4, "Withdrawal"),
                credit: SummaryCell::new(3, "Withdrawal"),
            },
        }
    }
}

impl Default for UnionBankParser {
    fn default() -> Self {
        Self::new()
    }
}

impl BankParser for UnionBankParser {
    fn variant(&self) -> InstitutionVariant {
        InstitutionVariant::UnionBank
    }

    fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    fn identifier_pattern(&self) -> &IdentifierPattern {
        &self.pattern
    }

    fn totals_strategy(&self) -> &TotalsStrategy {
        &self.totals
    }
}

// ============================================================================
// TESTS
// ============================================================================
