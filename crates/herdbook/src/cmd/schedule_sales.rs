//! Shared implementation for the herd-schedule-sales binary.

use crate::cmd::common::{self, OutputFormat};
use crate::report;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use herdbook_core::Pricing;
use herdbook_engine::{run_batch, schedule_sales, RetryPolicy, SaleOutcome, SalePlanning};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Rebuild the monthly sale program for a herd under a plan.
///
/// Previously scheduled sales in the scope are cleared first, so the
/// program can be re-run after balances change without stacking lots.
#[derive(Parser, Debug)]
#[command(name = "herd-schedule-sales")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// SQLite ledger database
    #[arg(long, value_name = "PATH")]
    pub db: PathBuf,

    /// Property name (case-insensitive substring)
    #[arg(value_name = "PROPERTY")]
    pub property: String,

    /// Category to sell from (exact name)
    #[arg(value_name = "CATEGORY")]
    pub category: String,

    /// First sale date; later lots step month by month from it
    #[arg(long, value_name = "DATE")]
    pub start: NaiveDate,

    /// Total head to sell
    #[arg(long, value_name = "N")]
    pub target: u32,

    /// Most head a single monthly lot may carry
    #[arg(long, value_name = "N")]
    pub monthly_cap: u32,

    /// Last year lots may land in [default: the start year]
    #[arg(long, value_name = "YEAR")]
    pub year_ceiling: Option<i32>,

    /// Assumed live weight per head in kg [default: the category's average]
    #[arg(long, value_name = "KG")]
    pub weight: Option<Decimal>,

    /// Price per kg live weight
    #[arg(long, value_name = "PRICE")]
    pub price_per_kg: Decimal,

    /// Days between sale and expected receipt
    #[arg(long, value_name = "DAYS", default_value_t = 30)]
    pub payment_term: u32,

    /// Buyer name [default: "A definir"]
    #[arg(long, value_name = "NAME")]
    pub customer: Option<String>,

    /// Plan id the sales belong to [default: the current plan]
    #[arg(long, value_name = "ID", conflicts_with = "no_plan")]
    pub plan: Option<i64>,

    /// Write into the no-plan bucket instead of the current plan
    #[arg(long)]
    pub no_plan: bool,

    /// Add a terminal sale on December 31 of the ceiling year that zeroes
    /// whatever balance the program leaves behind
    #[arg(long)]
    pub zero_year_end: bool,

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
struct JsonSales<'a> {
    property: &'a str,
    category: &'a str,
    start: NaiveDate,
    target: u32,
    #[serde(flatten)]
    outcome: &'a SaleOutcome,
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();

    let mut store = common::open_store(&args.db)?;
    let property = common::resolve_property(&store, &args.property)?;
    let category = common::resolve_category(&store, &args.category)?;
    let plan = common::resolve_plan(&store, args.plan, args.no_plan)?;

    let weight = match args.weight.or(category.avg_weight_kg) {
        Some(kg) => kg,
        None => anyhow::bail!(
            "category {:?} has no average weight; pass --weight",
            category.name
        ),
    };
    let pricing = Pricing::new(weight, args.price_per_kg).with_payment_term(args.payment_term);

    let mut planning = SalePlanning::new(
        property.id,
        category.id,
        args.start,
        args.target,
        args.monthly_cap,
        pricing,
    );
    if let Some(customer) = &args.customer {
        planning = planning.with_customer(customer.clone());
    }
    if let Some(year) = args.year_ceiling {
        planning = planning.with_year_ceiling(year);
    }
    if let Some(id) = plan {
        planning = planning.with_plan(id);
    }
    if args.zero_year_end {
        planning = planning.with_zero_year_end();
    }

    let mut policy = RetryPolicy::default();
    let outcome = run_batch(&mut store, &mut policy, |s| schedule_sales(s, &planning))?;

    match args.format {
        OutputFormat::Json => {
            let output = JsonSales {
                property: &property.name,
                category: &category.name,
                start: args.start,
                target: args.target,
                outcome: &outcome,
            };
            writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Text if !args.quiet => {
            report::print_sale_outcome(&outcome, &mut stdout)?;
        }
        OutputFormat::Text => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the schedule-sales command.
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

    fn base_args() -> Vec<&'static str> {
        vec![
            "herd-schedule-sales",
            "--db",
            "herd.db",
            "girassol",
            "Boi Gordo",
            "--start",
            "2022-02-01",
            "--target",
            "512",
            "--monthly-cap",
            "80",
            "--price-per-kg",
            "5.625",
        ]
    }

    #[test]
    fn pricing_flags_parse_as_decimals() {
        let args = Args::parse_from(base_args());
        assert_eq!(args.price_per_kg, dec!(5.625));
        assert_eq!(args.payment_term, 30);
        assert!(args.weight.is_none());
        assert!(!args.zero_year_end);
    }

    #[test]
    fn ceiling_and_zeroing_are_opt_in() {
        let mut argv = base_args();
        argv.extend(["--year-ceiling", "2023", "--zero-year-end"]);
        let args = Args::parse_from(argv);
        assert_eq!(args.year_ceiling, Some(2023));
        assert!(args.zero_year_end);
    }
}
