use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use upi_summary::{
    parse_detailed, parse_rows, rows_from_tables, InstitutionVariant, ParseLimits, ParserRegistry,
    RawRow, StatementError, Table, UnionBankParser,
};

fn sbi_row(details: &str, debit: &str, credit: &str) -> RawRow {
    RawRow::new()
        .with_cell("Txn Date", Some("02 Apr 2024"))
        .with_cell("Details", Some(details))
        .with_cell("Debit", Some(debit))
        .with_cell("Credit", Some(credit))
        .with_cell("Balance", Some("9,999.00"))
}

fn union_row(particulars: &str, withdrawal: &str, deposit: &str) -> RawRow {
    RawRow::new()
        .with_cell("Date", Some("02-04-2024"))
        .with_cell("Particulars", Some(particulars))
        .with_cell("Withdrawal", Some(withdrawal))
        .with_cell("Deposit", Some(deposit))
}

#[test]
fn test_two_transactions_same_identifier() {
    let registry = ParserRegistry::builtin();
    let rows = vec![
        sbi_row("to UPI/A/1/X", "100.00", "0"),
        sbi_row("to UPI/A/1/X", "0", "50.00"),
    ];

    let summary = parse_rows(&rows, InstitutionVariant::Sbi, &registry).unwrap();

    assert_eq!(summary.upi_summary.len(), 1);
    let group = &summary.upi_summary[0];
    assert_eq!(group.identifier.as_deref(), Some("UPI/A/1/X"));
    assert_eq!(group.total_debited, dec!(100.00));
    assert_eq!(group.total_credited, dec!(50.00));
    assert_eq!(group.transactions, vec!["to UPI/A/1/X", "to UPI/A/1/X"]);
    assert_eq!(summary.overall_totals.total_debited, dec!(100.00));
    assert_eq!(summary.overall_totals.total_credited, dec!(50.00));
}

#[test]
fn test_computed_totals_equal_group_sums() {
    let registry = ParserRegistry::builtin();
    let rows = vec![
        sbi_row("TO TRANSFER-UPI/DR/410/ZOMATO--", "1,234.56", ""),
        sbi_row("BY TRANSFER-UPI/CR/411/RAHUL--", "", "2,000.00"),
        sbi_row("ATM WDL", "500", ""),
        sbi_row("TO TRANSFER-UPI/DR/410/ZOMATO--", "65.44", ""),
        sbi_row("INTEREST CREDIT", "", "12.03"),
        sbi_row("garbage amounts", "n/a", "(3.00)"),
    ];

    let summary = parse_rows(&rows, InstitutionVariant::Sbi, &registry).unwrap();

    let debited: Decimal = summary.upi_summary.iter().map(|g| g.total_debited).sum();
    let credited: Decimal = summary.upi_summary.iter().map(|g| g.total_credited).sum();
    assert_eq!(summary.overall_totals.total_debited, debited);
    assert_eq!(summary.overall_totals.total_credited, credited);
    assert_eq!(debited, dec!(1800));
    assert_eq!(credited, dec!(2012.03));

    let ids: Vec<Option<&str>> = summary.upi_summary.iter().map(|g| g.identifier.as_deref()).collect();
    assert_eq!(ids, vec![Some("UPI/CR/411/RAHUL"), Some("UPI/DR/410/ZOMATO"), None]);
    assert_eq!(summary.upi_summary[2].transactions, vec!["ATM WDL", "INTEREST CREDIT", "garbage amounts"]);
}

#[test]
fn test_union_positional_totals_from_summary_rows() {
    let registry = ParserRegistry::builtin();
    let rows = vec![
        union_row("rahul@okaxis UPI payment", "250.00", ""),
        union_row("shop.pay@ybl groceries", "1,000.00", ""),
        union_row("rahul@okaxis refund", "", "100.00"),
        union_row("Total Withdrawals", "5,250.00", ""),
        union_row("Total Deposits", "700.00", ""),
        union_row("Closing Balance", "", ""),
        union_row("End of statement", "", ""),
    ];

    let summary = parse_rows(&rows, InstitutionVariant::UnionBank, &registry).unwrap();

    // Bank-stated totals win even though they differ from the visible rows
    assert_eq!(summary.overall_totals.total_debited, dec!(5250));
    assert_eq!(summary.overall_totals.total_credited, dec!(700));

    let rahul = summary
        .upi_summary
        .iter()
        .find(|g| g.identifier.as_deref() == Some("rahul@"))
        .unwrap();
    assert_eq!(rahul.total_debited, dec!(250));
    assert_eq!(rahul.total_credited, dec!(100));
    assert_eq!(rahul.transactions.len(), 2);
}

#[test]
fn test_union_positional_divergence_is_reported_not_fixed() {
    let rows = vec![
        union_row("a@", "10", ""),
        union_row("Total", "99", ""),
        union_row("Total", "0", ""),
        union_row("x", "", ""),
        union_row("y", "", ""),
    ];

    let (summary, report) =
        parse_detailed(&rows, &UnionBankParser::new(), &ParseLimits::unlimited()).unwrap();

    assert_eq!(summary.overall_totals.total_debited, dec!(99));
    assert!(!report.is_balanced());
    assert_eq!(report.strategy, "positional");
}

#[test]
fn test_union_too_few_rows() {
    let registry = ParserRegistry::builtin();
    let rows = vec![union_row("a", "1", ""), union_row("b", "2", ""), union_row("c", "3", "")];

    let err = parse_rows(&rows, InstitutionVariant::UnionBank, &registry).unwrap_err();
    assert_eq!(err, StatementError::TotalsExtraction { required: 4, found: 3 });
}

#[test]
fn test_wrong_bank_is_schema_error() {
    let registry = ParserRegistry::builtin();
    let rows = vec![union_row("a", "1", "")];

    let err = parse_rows(&rows, InstitutionVariant::Sbi, &registry).unwrap_err();
    assert!(matches!(err, StatementError::Schema { ref column, row: 0 } if column == "Debit"));
    assert!(err.is_recoverable());
}

#[test]
fn test_empty_document() {
    let registry = ParserRegistry::builtin();
    let err = parse_rows(&rows_from_tables(&[None, None]), InstitutionVariant::Sbi, &registry).unwrap_err();

    assert_eq!(err, StatementError::EmptyDocument);
    assert_eq!(json!({ "error": err.to_string() }), json!({ "error": "No tables found in PDF" }));
}

#[test]
fn test_parsing_is_idempotent() {
    let registry = ParserRegistry::builtin();
    let rows = vec![
        sbi_row("UPI/DR/3/C", "3", ""),
        sbi_row("UPI/DR/1/A", "1", ""),
        sbi_row("cash", "7", ""),
        sbi_row("UPI/DR/2/B", "2", ""),
        sbi_row("UPI/DR/1/A", "", "1"),
    ];

    let first = parse_rows(&rows, InstitutionVariant::Sbi, &registry).unwrap().to_json().unwrap();
    let second = parse_rows(&rows, InstitutionVariant::Sbi, &registry).unwrap().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_json_output_shape() {
    let registry = ParserRegistry::builtin();
    let page: Table = vec![
        vec![Some("Details".into()), Some("Debit".into()), Some("Credit".into())],
        vec![Some("to UPI/A/1/X".into()), Some("100.00".into()), None],
        vec![Some("cash deposit".into()), None, Some("20.5".into())],
    ];
    let rows = rows_from_tables(&[Some(page)]);

    let summary = parse_rows(&rows, InstitutionVariant::Sbi, &registry).unwrap();
    let value = serde_json::to_value(&summary).unwrap();

    assert_eq!(
        value,
        json!({
            "upi_summary": [
                {
                    "UPI": "UPI/A/1/X",
                    "total_debited": 100.0,
                    "total_credited": 0.0,
                    "transactions": ["to UPI/A/1/X"]
                },
                {
                    "UPI": null,
                    "total_debited": 0.0,
                    "total_credited": 20.5,
                    "transactions": ["cash deposit"]
                }
            ],
            "overall_totals": { "total_debited": 100.0, "total_credited": 20.5 }
        })
    );
}

#[test]
fn test_unregistered_bank() {
    let registry = ParserRegistry::new();
    let err = parse_rows(&[sbi_row("a", "1", "")], InstitutionVariant::Sbi, &registry).unwrap_err();
    assert_eq!(err, StatementError::UnknownVariant("sbi".to_string()));
}

#[test]
fn test_overflowing_totals_are_a_structured_error() {
    let registry = ParserRegistry::builtin();
    let huge = "50,000,000,000,000,000,000,000,000,000";
    let rows = vec![sbi_row("cash", huge, ""), sbi_row("cash", huge, "")];

    let err = parse_rows(&rows, InstitutionVariant::Sbi, &registry).unwrap_err();
    assert_eq!(err, StatementError::AmountOverflow { field: "debit" });
}
