// UPI Summary - Core Library
// Bank statement rows → transactions grouped by UPI identifier, with totals.
// Used by the CLI, the API server, and tests.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod extract;
pub mod identifier;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod reconciliation;
pub mod schema;

// Re-export commonly used types
pub use aggregate::aggregate;
pub use config::{Config, ServerSection};
pub use error::{Result, StatementError};
pub use extract::{load_rows, rows_from_tables, StatementInput, Table};
pub use identifier::IdentifierPattern;
pub use model::{OverallTotals, StatementSummary, Transaction, TransactionGroup};
pub use normalize::normalize_amount;
pub use parser::{
    BankParser, InstitutionVariant, ParserRegistry,
    SbiParser, UnionBankParser,
    detect_variant_from_filename, get_parser,
};
pub use pipeline::{parse_detailed, parse_rows, parse_with, ParseLimits};
pub use reconciliation::{
    ReconciliationEngine, ReconciliationReport, ReconciliationResult,
    SummaryCell, TotalsStrategy,
};
pub use schema::{AdaptedRow, ColumnMap, RawRow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
