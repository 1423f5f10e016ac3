//! Shared implementation for the herd-reconcile binary.

use crate::cmd::check::window;
use crate::cmd::common::{self, OutputFormat};
use crate::report;
use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use herdbook_engine::{
    create_missing_pairs, run_batch, ReconcileOutcome, RetryPolicy, TransferRoute,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Create the missing entrada for every unpaired transfer saída.
#[derive(Parser, Debug)]
#[command(name = "herd-reconcile")]
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

    /// Start of the window [default: January 1 of the through year]
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// End of the window, inclusive [default: today]
    #[arg(long, value_name = "DATE")]
    pub through: Option<NaiveDate>,

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
struct JsonReconcile<'a> {
    source: &'a str,
    destination: &'a str,
    from: NaiveDate,
    through: NaiveDate,
    #[serde(flatten)]
    outcome: &'a ReconcileOutcome,
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
    let (from, through) = window(args.from, args.through);

    let route = TransferRoute {
        source: source.id,
        destination: destination.id,
        from_category: from_category.id,
        to_category: to_category.id,
    };
    let mut policy = RetryPolicy::default();
    let outcome = run_batch(&mut store, &mut policy, |s| {
        create_missing_pairs(s, &route, from, through)
    })?;

    match args.format {
        OutputFormat::Json => {
            let output = JsonReconcile {
                source: &source.name,
                destination: &destination.name,
                from,
                through,
                outcome: &outcome,
            };
            writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Text if !args.quiet => {
            report::print_movements(&outcome.created, &mut stdout)?;
            report::print_summary(outcome.created.len(), outcome.already_paired, &mut stdout)?;
        }
        OutputFormat::Text => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the reconcile command.
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
