//! Shared implementation for the herd-check binary.
//!
//! Checking never writes. Every `TRANSFERENCIA_SAIDA` from the source herd
//! in the window is looked up on the destination side; the ones with no
//! matching entrada are reported, and the binary exits 1 so a cron job can
//! page on findings. `herd-reconcile` is the writing counterpart.

use crate::cmd::common::{self, OutputFormat};
use crate::report;
use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use clap::Parser;
use herdbook_core::{year_start, Movement};
use herdbook_engine::{find_unpaired, TransferRoute};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Report transfer saídas that have no matching entrada.
#[derive(Parser, Debug)]
#[command(name = "herd-check")]
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
struct JsonCheck<'a> {
    source: &'a str,
    destination: &'a str,
    from: NaiveDate,
    through: NaiveDate,
    unpaired: &'a [Movement],
    count: usize,
}

/// The window the flags select: `--through` defaults to today, `--from`
/// to the start of that year.
pub fn window(from: Option<NaiveDate>, through: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
    let through = through.unwrap_or_else(|| Utc::now().date_naive());
    let from = from.unwrap_or_else(|| year_start(through.year()));
    (from, through)
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();

    let store = common::open_store(&args.db)?;
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
    let unpaired = find_unpaired(&store, &route, from, through)?;

    match args.format {
        OutputFormat::Json => {
            let output = JsonCheck {
                source: &source.name,
                destination: &destination.name,
                from,
                through,
                unpaired: &unpaired,
                count: unpaired.len(),
            };
            writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Text if !args.quiet => {
            report::print_movements(&unpaired, &mut stdout)?;
            report::print_check_summary(unpaired.len(), &mut stdout)?;
        }
        OutputFormat::Text => {}
    }

    if unpaired.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Main entry point for the check command.
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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_defaults_to_the_current_year() {
        let (from, through) = window(None, Some(date(2023, 8, 20)));
        assert_eq!(from, date(2023, 1, 1));
        assert_eq!(through, date(2023, 8, 20));

        let (from, through) = window(Some(date(2022, 6, 1)), Some(date(2023, 8, 20)));
        assert_eq!(from, date(2022, 6, 1));
        assert_eq!(through, date(2023, 8, 20));
    }

    #[test]
    fn args_default_to_same_category() {
        let args = Args::parse_from([
            "herd-check",
            "--db",
            "herd.db",
            "girassol",
            "favo de mel",
            "--category",
            "Boi Gordo",
        ]);
        assert_eq!(args.source, "girassol");
        assert_eq!(args.destination, "favo de mel");
        assert!(args.to_category.is_none());
    }
}
