// Numeric Normalizer - statement cell text → Decimal
//
// Soft-failure policy: anything unparseable becomes zero so one bad cell
// cannot abort a whole statement.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Normalize a monetary cell into a non-negative amount.
///
/// Thousands separators and whitespace are dropped before parsing.
/// Absent, empty and non-numeric cells give zero. Parenthesized negatives
/// like `(12.00)` are not recognised and also give zero. A leading minus
/// is accepted and its magnitude kept; the column already says which
/// direction the money moved.
pub fn normalize_amount(cell: Option<&str>) -> Decimal {
    let Some(text) = cell else {
        return Decimal::ZERO;
    };

    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map(|amount| amount.abs().normalize())
        .unwrap_or(Decimal::ZERO)
}
