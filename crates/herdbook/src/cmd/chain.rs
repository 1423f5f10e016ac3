//! Shared implementation for the herd-chain binary.

use crate::cmd::common::{self, OutputFormat};
use crate::report;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use herdbook_engine::{run_batch, run_chain, ChainOutcome, ChainSpec, RetryPolicy, TransferRoute};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Run a periodic transfer chain between two herds up to a horizon year.
///
/// Each period moves up to the requested quantity, clamped to what the
/// source holds on the period date. Periods already written keep their
/// rows; a re-run only fills the gaps.
#[derive(Parser, Debug)]
#[command(name = "herd-chain")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// SQLite ledger database
    #[arg(long, value_name = "PATH")]
    pub db: PathBuf,

    /// Source property name (case-insensitive substring)
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Destination property name (case-insensitive substring)
    #[arg(value_name = "DESTINATION")]
    pub destination: String,

    /// Category the animals leave from (exact name)
    #[arg(long, value_name = "NAME")]
    pub category: String,

    /// Category the animals arrive into [default: same as --category]
    #[arg(long, value_name = "NAME")]
    pub to_category: Option<String>,

    /// First period date
    #[arg(long, value_name = "DATE")]
    pub start: NaiveDate,

    /// Months between periods
    #[arg(long, value_name = "MONTHS")]
    pub step_months: u32,

    /// Last year periods may land in
    #[arg(long, value_name = "YEAR")]
    pub horizon: i32,

    /// Head to move each period (clamped to the source balance)
    #[arg(long, value_name = "N")]
    pub quantity: u32,

    /// Value per head to price both sides with
    #[arg(long, value_name = "PRICE")]
    pub value_per_head: Option<Decimal>,

    /// Plan id the movements belong to [default: the current plan]
    #[arg(long, value_name = "ID", conflicts_with = "no_plan")]
    pub plan: Option<i64>,

    /// Write into the no-plan bucket instead of the current plan
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
struct JsonChain<'a> {
    source: &'a str,
    destination: &'a str,
    start: NaiveDate,
    step_months: u32,
    horizon: i32,
    #[serde(flatten)]
    outcome: &'a ChainOutcome,
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();

    let mut store = common::open_store(&args.db)?;
    let source = common::resolve_property(&store, &args.source)?;
    let destination = common::resolve_property(&store, &args.destination)?;
    let from_category = common::resolve_category(&store, &args.category)?;
    let to_category = match &args.to_category {
        Some(name) => common::resolve_category(&store, name)?,
        None => from_category.clone(),
    };
    let plan = common::resolve_plan(&store, args.plan, args.no_plan)?;

    let route = TransferRoute {
        source: source.id,
        destination: destination.id,
        from_category: from_category.id,
        to_category: to_category.id,
    };
    let mut spec = ChainSpec::new(route, args.start, args.step_months, args.horizon, args.quantity);
    if let Some(value) = args.value_per_head {
        spec = spec.with_value_per_head(value);
    }
    if let Some(id) = plan {
        spec = spec.with_plan(id);
    }

    let mut policy = RetryPolicy::default();
    let outcome = run_batch(&mut store, &mut policy, |s| run_chain(s, &spec))?;

    match args.format {
        OutputFormat::Json => {
            let output = JsonChain {
                source: &source.name,
                destination: &destination.name,
                start: args.start,
                step_months: args.step_months,
                horizon: args.horizon,
                outcome: &outcome,
            };
            writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Text if !args.quiet => {
            report::print_chain_outcome(&outcome, &mut stdout)?;
        }
        OutputFormat::Text => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the chain command.
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
    fn args_cover_the_route_and_cadence() {
        let args = Args::parse_from([
            "herd-chain",
            "--db",
            "herd.db",
            "girassol",
            "favo",
            "--category",
            "Garrote",
            "--start",
            "2023-03-10",
            "--step-months",
            "6",
            "--horizon",
            "2024",
            "--quantity",
            "60",
        ]);
        assert_eq!(args.step_months, 6);
        assert_eq!(args.horizon, 2024);
        assert!(args.value_per_head.is_none());
    }
}
