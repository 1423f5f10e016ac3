//! Shared implementation for the herd-evolve binary.

use crate::cmd::common::{self, OutputFormat};
use crate::report;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use herdbook_engine::{
    run_batch, schedule_evolution, EvolutionOutcome, EvolutionSpec, RetryPolicy,
    DEFAULT_OFFSET_MONTHS,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Schedule a category promotion for a cohort.
///
/// A cohort counted in one category on a date is promoted into the next
/// category a fixed number of months later, clamped to what the category
/// actually holds on the promotion date.
#[derive(Parser, Debug)]
#[command(name = "herd-evolve")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// SQLite ledger database
    #[arg(long, value_name = "PATH")]
    pub db: PathBuf,

    /// Property name (case-insensitive substring)
    #[arg(value_name = "PROPERTY")]
    pub property: String,

    /// Category the cohort ages out of (exact name)
    #[arg(long, value_name = "NAME")]
    pub from_category: String,

    /// Category the cohort ages into (exact name)
    #[arg(long, value_name = "NAME")]
    pub to_category: String,

    /// Date the cohort was counted (promotion lands offset months later)
    #[arg(long, value_name = "DATE")]
    pub date: NaiveDate,

    /// Cohort size in head
    #[arg(long, value_name = "N")]
    pub quantity: u32,

    /// Months between the count and the promotion
    #[arg(long, value_name = "MONTHS", default_value_t = DEFAULT_OFFSET_MONTHS)]
    pub offset_months: u32,

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
struct JsonEvolve<'a> {
    property: &'a str,
    from_category: &'a str,
    to_category: &'a str,
    cohort_date: NaiveDate,
    #[serde(flatten)]
    outcome: &'a EvolutionOutcome,
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();

    let mut store = common::open_store(&args.db)?;
    let property = common::resolve_property(&store, &args.property)?;
    let from_category = common::resolve_category(&store, &args.from_category)?;
    let to_category = common::resolve_category(&store, &args.to_category)?;
    let plan = common::resolve_plan(&store, args.plan, args.no_plan)?;

    let mut spec = EvolutionSpec::new(
        property.id,
        from_category.id,
        to_category.id,
        args.date,
        args.quantity,
    )
    .with_offset_months(args.offset_months);
    if let Some(id) = plan {
        spec = spec.with_plan(id);
    }

    let mut policy = RetryPolicy::default();
    let outcome = run_batch(&mut store, &mut policy, |s| schedule_evolution(s, &spec))?;

    match args.format {
        OutputFormat::Json => {
            let output = JsonEvolve {
                property: &property.name,
                from_category: &from_category.name,
                to_category: &to_category.name,
                cohort_date: args.date,
                outcome: &outcome,
            };
            writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Text if !args.quiet => {
            match outcome {
                EvolutionOutcome::Scheduled {
                    date,
                    quantity,
                    clamped,
                    ..
                } => {
                    if clamped {
                        writeln!(
                            stdout,
                            "promoted {quantity} head on {date} (clamped to balance)"
                        )?;
                    } else {
                        writeln!(stdout, "promoted {quantity} head on {date}")?;
                    }
                    report::print_summary(1, 0, &mut stdout)?;
                }
                EvolutionOutcome::AlreadyScheduled { date } => {
                    writeln!(stdout, "a promotion already exists on {date}")?;
                    report::print_summary(0, 1, &mut stdout)?;
                }
                EvolutionOutcome::SkippedZeroBalance { date } => {
                    writeln!(stdout, "nothing to promote on {date}; category is empty")?;
                    report::print_summary(0, 1, &mut stdout)?;
                }
            }
        }
        OutputFormat::Text => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the evolve command.
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
