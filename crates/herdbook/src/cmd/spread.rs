//! Shared implementation for the herd-spread binary.

use crate::cmd::common::{self, OutputFormat};
use crate::report;
use anyhow::Result;
use clap::Parser;
use herdbook_engine::{seasonal_weights, spread, SpreadParams};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Write};
use std::process::ExitCode;

/// Split an annual amount into jittered periodic values that sum back
/// exactly.
///
/// This is a pure calculation; no database is involved. The same seed,
/// target and weights always print the same split.
#[derive(Parser, Debug)]
#[command(name = "herd-spread")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Amount to split
    #[arg(long, value_name = "AMOUNT")]
    pub target: Decimal,

    /// Period weights [default: twelve seasonal months, light first half]
    #[arg(long, value_name = "W1,W2,...", value_delimiter = ',')]
    pub weights: Vec<Decimal>,

    /// Jitter amplitude in percent
    #[arg(long, value_name = "PCT", default_value_t = 12)]
    pub jitter: u32,

    /// RNG seed; a fresh one is drawn (and reported) when omitted
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

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
struct JsonSpread {
    target: Decimal,
    jitter_pct: u32,
    seed: u64,
    values: Vec<Decimal>,
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();

    let weights = if args.weights.is_empty() {
        seasonal_weights()
    } else {
        args.weights.clone()
    };
    let params = SpreadParams::new(args.target, weights).with_jitter_pct(args.jitter);

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let values = spread(&params, &mut rng)?;

    match args.format {
        OutputFormat::Json => {
            let output = JsonSpread {
                target: args.target,
                jitter_pct: args.jitter,
                seed,
                values,
            };
            writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Text if !args.quiet => {
            if args.seed.is_none() {
                writeln!(stdout, "seed: {seed}")?;
            }
            report::print_spread(&values, &mut stdout)?;
        }
        OutputFormat::Text => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// Main entry point for the spread command.
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
    fn weights_split_on_commas() {
        let args = Args::parse_from([
            "herd-spread",
            "--target",
            "120000.00",
            "--weights",
            "0.85,1.0,1.15",
        ]);
        assert_eq!(args.weights, vec![dec!(0.85), dec!(1.0), dec!(1.15)]);
        assert_eq!(args.jitter, 12);
    }

    #[test]
    fn seed_is_optional() {
        let args = Args::parse_from(["herd-spread", "--target", "1000.00", "--seed", "42"]);
        assert_eq!(args.seed, Some(42));
        assert!(args.weights.is_empty());
    }
}
