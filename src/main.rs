use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use upi_summary::{
    detect_variant_from_filename, load_rows, parse_detailed, InstitutionVariant, ParseLimits,
    ParserRegistry, RawRow, StatementError,
};

#[derive(Parser, Debug)]
#[command(name = "upi-summary", version, about = "Group bank statement transactions by UPI identifier")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize extracted statement rows (JSON or CSV)
    Summarize {
        /// Rows file: .csv with a header row, or JSON pages/rows
        file: PathBuf,

        /// Bank code (sbi, union) or "auto" to detect from filename/headers
        #[arg(long, default_value = "auto")]
        bank: String,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Print the stated-vs-computed totals report to stderr
        #[arg(long)]
        reconcile: bool,

        /// Reject statements with more rows than this
        #[arg(long)]
        max_rows: Option<usize>,
    },

    /// List supported banks
    Banks,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = ParserRegistry::builtin();

    match cli.command {
        Command::Summarize {
            file,
            bank,
            pretty,
            reconcile,
            max_rows,
        } => run_summarize(&registry, &file, &bank, pretty, reconcile, max_rows),
        Command::Banks => {
            for variant in registry.variants() {
                println!("{:<6} {}", variant.code(), variant.name());
            }
            Ok(())
        }
    }
}

fn run_summarize(
    registry: &ParserRegistry,
    file: &Path,
    bank: &str,
    pretty: bool,
    reconcile: bool,
    max_rows: Option<usize>,
) -> Result<()> {
    let rows = load_rows(file)?;
    let variant = resolve_variant(registry, bank, file, &rows)?;
    let parser = registry.resolve(variant)?;

    info!(bank = %variant, rows = rows.len(), file = %file.display(), "summarizing statement");

    let mut limits = ParseLimits::unlimited();
    if let Some(max) = max_rows {
        limits = limits.with_max_rows(max);
    }

    match parse_detailed(&rows, parser, &limits) {
        Ok((summary, report)) => {
            if reconcile {
                eprintln!("{}", report.summary());
            }
            let json = if pretty {
                summary.to_json_pretty()?
            } else {
                summary.to_json()?
            };
            println!("{json}");
            Ok(())
        }
        Err(e @ StatementError::EmptyDocument) => {
            // Same payload the API returns for an empty statement
            println!("{}", serde_json::json!({ "error": e.to_string() }));
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to summarize {}", file.display())),
    }
}

fn resolve_variant(
    registry: &ParserRegistry,
    bank: &str,
    file: &Path,
    rows: &[RawRow],
) -> Result<InstitutionVariant> {
    if !bank.eq_ignore_ascii_case("auto") {
        return Ok(bank.parse()?);
    }

    if let Ok(variant) = detect_variant_from_filename(file) {
        return Ok(variant);
    }

    let labels: Vec<&str> = rows.first().map(|r| r.labels().collect()).unwrap_or_default();
    match registry.detect_from_headers(&labels) {
        Some(variant) => Ok(variant),
        None => bail!(
            "Could not detect bank for {}; pass --bank {}",
            file.display(),
            registry
                .variants()
                .iter()
                .map(|v| v.code())
                .collect::<Vec<_>>()
                .join("|")
        ),
    }
}
