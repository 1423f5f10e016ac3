//! Shared implementation for the herd-reprice binary.

use crate::cmd::common::{self, OutputFormat};
use crate::report;
use anyhow::{Context, Result};
use clap::Parser;
use herdbook_engine::{reprice_sales, run_batch, PriceTable, RepriceOutcome, RetryPolicy};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Rewrite the values of scheduled sales from a per-year price table.
///
/// Quantities and dates are left alone; only the monetary fields of each
/// sale (and its movement) change. Years not named in the table keep
/// their prices.
#[derive(Parser, Debug)]
#[command(name = "herd-reprice")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// SQLite ledger database
    #[arg(long, value_name = "PATH")]
    pub db: PathBuf,

    /// Property name (case-insensitive substring)
    #[arg(value_name = "PROPERTY")]
    pub property: String,

    /// Category the sales belong to (exact name)
    #[arg(value_name = "CATEGORY")]
    pub category: String,

    /// New value per head for a year; repeatable
    #[arg(long = "price", value_name = "YEAR=VALUE", required = true)]
    pub prices: Vec<String>,

    /// Plan id the sales belong to [default: the current plan]
    #[arg(long, value_name = "ID", conflicts_with = "no_plan")]
    pub plan: Option<i64>,

    /// Reprice the no-plan bucket instead of the current plan
    #[arg(long)]
    pub no_plan: bool,

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
struct JsonReprice<'a> {
    property: &'a str,
    category: &'a str,
    #[serde(flatten)]
    outcome: &'a RepriceOutcome,
}

/// Parses one `YEAR=VALUE` pair, e.g. `2023=3200.00`.
fn parse_price(pair: &str) -> Result<(i32, Decimal)> {
    let (year, value) = pair
        .split_once('=')
        .with_context(|| format!("expected YEAR=VALUE, got {pair:?}"))?;
    let year: i32 = year
        .trim()
        .parse()
        .with_context(|| format!("invalid year in {pair:?}"))?;
    let value: Decimal = value
        .trim()
        .parse()
        .with_context(|| format!("invalid value in {pair:?}"))?;
    Ok((year, value))
}

fn price_table(pairs: &[String]) -> Result<PriceTable> {
    pairs
        .iter()
        .map(|pair| parse_price(pair))
        .collect::<Result<PriceTable>>()
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();

    let table = price_table(&args.prices)?;
    let mut store = common::open_store(&args.db)?;
    let property = common::resolve_property(&store, &args.property)?;
    let category = common::resolve_category(&store, &args.category)?;
    let plan = common::resolve_plan(&store, args.plan, args.no_plan)?;

    let mut policy = RetryPolicy::default();
    let outcome = run_batch(&mut store, &mut policy, |s| {
        reprice_sales(s, property.id, category.id, &table, plan)
    })?;

    match args.format {
        OutputFormat::Json => {
            let output = JsonReprice {
                property: &property.name,
                category: &category.name,
                outcome: &outcome,
            };
            writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Text if !args.quiet => {
            let mut total = 0u32;
            for (year, count) in &outcome.updated {
                let noun = if *count == 1 { "sale" } else { "sales" };
                writeln!(stdout, "  {year}: {count} {noun} repriced")?;
                total += count;
            }
            if outcome.skipped_zero_weight > 0 {
                report::print_warning(
                    &format!(
                        "{} skipped: weight assumption is zero",
                        outcome.skipped_zero_weight
                    ),
                    &mut stdout,
                )?;
            }
            report::print_ok(&format!("{total} repriced"), &mut stdout)?;
        }
        OutputFormat::Text => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the reprice command.
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
    use rust_decimal_macros::dec;

    #[test]
    fn price_pairs_parse() {
        assert_eq!(parse_price("2023=3200.00").unwrap(), (2023, dec!(3200.00)));
        assert_eq!(parse_price(" 2024 = 3500 ").unwrap(), (2024, dec!(3500)));
        assert!(parse_price("2023").is_err());
        assert!(parse_price("year=3200").is_err());
        assert!(parse_price("2023=lots").is_err());
    }

    #[test]
    fn table_collects_every_pair() {
        let table =
            price_table(&["2023=3200.00".to_string(), "2024=3500.00".to_string()]).unwrap();
        assert_eq!(table.get(2023), Some(dec!(3200.00)));
        assert_eq!(table.get(2024), Some(dec!(3500.00)));
        assert_eq!(table.get(2025), None);
    }

    #[test]
    fn at_least_one_price_is_required() {
        let result = Args::try_parse_from(["herd-reprice", "--db", "herd.db", "g", "Boi Gordo"]);
        assert!(result.is_err());
    }
}
