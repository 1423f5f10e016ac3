//! Shared implementation for the herd-balance binary.

use crate::cmd::common::{self, OutputFormat};
use crate::report;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use herdbook_engine::{balance_detail, BalanceDetail};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Compute the replayed head count for a herd on a date.
#[derive(Parser, Debug)]
#[command(name = "herd-balance")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// SQLite ledger database
    #[arg(long, value_name = "PATH")]
    pub db: PathBuf,

    /// Property name (case-insensitive substring, must match exactly one)
    #[arg(value_name = "PROPERTY")]
    pub property: String,

    /// Category name (exact)
    #[arg(value_name = "CATEGORY")]
    pub category: String,

    /// Date the balance is computed for [default: today]
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,

    /// Show the replay breakdown (snapshot, credits, debits)
    #[arg(long)]
    pub detail: bool,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output (just use exit code)
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
struct JsonBalance<'a> {
    property: &'a str,
    category: &'a str,
    as_of: NaiveDate,
    balance: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a BalanceDetail>,
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();

    let store = common::open_store(&args.db)?;
    let property = common::resolve_property(&store, &args.property)?;
    let category = common::resolve_category(&store, &args.category)?;
    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let detail = balance_detail(&store, property.id, category.id, as_of)?;

    match args.format {
        OutputFormat::Json => {
            let output = JsonBalance {
                property: &property.name,
                category: &category.name,
                as_of,
                balance: detail.closing,
                detail: args.detail.then_some(&detail),
            };
            writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Text if !args.quiet => {
            if args.detail {
                report::print_balance(&property.name, &category.name, as_of, &detail, &mut stdout)?;
            } else {
                writeln!(stdout, "{}", detail.closing)?;
            }
        }
        OutputFormat::Text => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the balance command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    common::init_tracing(args.verbose);

    match run(&args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::parse_from([
            "herd-balance",
            "--db",
            "herd.db",
            "girassol",
            "Boi Gordo",
        ]);
        assert_eq!(args.property, "girassol");
        assert_eq!(args.category, "Boi Gordo");
        assert!(args.as_of.is_none());
        assert!(!args.detail);
    }

    #[test]
    fn as_of_parses_iso_dates() {
        let args = Args::parse_from([
            "herd-balance",
            "--db",
            "herd.db",
            "girassol",
            "Boi Gordo",
            "--as-of",
            "2023-06-15",
        ]);
        assert_eq!(
            args.as_of,
            Some(NaiveDate::from_ymd_opt(2023, 6, 15).unwrap())
        );
    }
}
