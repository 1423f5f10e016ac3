//! Text reports for the herdbook binaries.
//!
//! Every helper writes to a caller-supplied writer, so reports are
//! testable without capturing stdout. Summary lines carry the same
//! colored glyphs on every binary: green check for a clean run, red
//! cross for findings, yellow sign for warnings.

use herdbook_core::{Movement, NaiveDate};
use herdbook_engine::{BalanceDetail, ChainOutcome, PeriodStatus, SaleOutcome, StopReason};
use rust_decimal::Decimal;
use std::io::{self, Write};

/// Print the replay breakdown behind a balance.
pub fn print_balance<W: Write>(
    property: &str,
    category: &str,
    as_of: NaiveDate,
    detail: &BalanceDetail,
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "{property} / {category} @ {as_of}")?;
    match detail.snapshot_date {
        Some(date) => writeln!(writer, "  opening  {:>7}  (snapshot {date})", detail.opening)?,
        None => writeln!(writer, "  opening  {:>7}  (no snapshot)", detail.opening)?,
    }
    writeln!(writer, "  credits  {:>7}", format!("+{}", detail.credits))?;
    if detail.clamped {
        writeln!(
            writer,
            "  debits   {:>7}  (floored at zero)",
            format!("-{}", detail.debits)
        )?;
    } else {
        writeln!(writer, "  debits   {:>7}", format!("-{}", detail.debits))?;
    }
    writeln!(
        writer,
        "  closing  {:>7}  ({} movements)",
        detail.closing, detail.movements
    )
}

/// Print movements as an aligned table, one line each.
pub fn print_movements<W: Write>(movements: &[Movement], writer: &mut W) -> io::Result<()> {
    for m in movements {
        match &m.note {
            Some(note) => writeln!(
                writer,
                "  {}  {:<21}  {:>6}  {note}",
                m.date,
                m.kind.code(),
                m.quantity
            )?,
            None => writeln!(
                writer,
                "  {}  {:<21}  {:>6}",
                m.date,
                m.kind.code(),
                m.quantity
            )?,
        }
    }
    Ok(())
}

/// Print the check verdict: green when every saída has its entrada.
pub fn print_check_summary<W: Write>(unpaired: usize, writer: &mut W) -> io::Result<()> {
    if unpaired == 0 {
        writeln!(writer, "\x1b[32m\u{2713}\x1b[0m No unpaired transfers")
    } else {
        let noun = if unpaired == 1 { "transfer" } else { "transfers" };
        writeln!(writer, "\x1b[31m\u{2717}\x1b[0m {unpaired} unpaired {noun}")
    }
}

/// Print the created/skipped footer a maintenance run ends with.
///
/// A failing run never reaches this line; its batch rolls back and the
/// binary exits with the error instead.
pub fn print_summary<W: Write>(created: usize, skipped: usize, writer: &mut W) -> io::Result<()> {
    if created == 0 && skipped == 0 {
        writeln!(writer, "\x1b[32m\u{2713}\x1b[0m nothing to do")
    } else {
        writeln!(
            writer,
            "\x1b[32m\u{2713}\x1b[0m {created} created, {skipped} skipped"
        )
    }
}

/// Print a yellow warning line.
pub fn print_warning<W: Write>(message: &str, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "\x1b[33m\u{26A0}\x1b[0m {message}")
}

/// Print a green all-clear line.
pub fn print_ok<W: Write>(message: &str, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "\x1b[32m\u{2713}\x1b[0m {message}")
}

/// Print what a sale scheduling run did, lot by lot.
pub fn print_sale_outcome<W: Write>(outcome: &SaleOutcome, writer: &mut W) -> io::Result<()> {
    if outcome.cleared > 0 {
        let noun = if outcome.cleared == 1 { "sale" } else { "sales" };
        writeln!(
            writer,
            "cleared {} previously scheduled {noun}",
            outcome.cleared
        )?;
    }
    for (i, lot) in outcome.created.iter().enumerate() {
        writeln!(writer, "  {}  {:>6}  Lote {}", lot.date, lot.quantity, i + 1)?;
    }
    let reason = match outcome.stopped {
        StopReason::TargetReached => "target reached",
        StopReason::Exhausted => "balance exhausted",
        StopReason::YearCeiling => "year ceiling reached",
    };
    writeln!(
        writer,
        "stopped: {reason}; sold {}, remaining {}",
        outcome.total_sold, outcome.remaining
    )?;
    if let Some(z) = &outcome.zeroed {
        writeln!(writer, "  {}  {:>6}  final zeroing sale", z.date, z.quantity)?;
    }
    let created = outcome.created.len() + usize::from(outcome.zeroed.is_some());
    print_summary(created, 0, writer)
}

/// Print a transfer chain run, period by period.
pub fn print_chain_outcome<W: Write>(outcome: &ChainOutcome, writer: &mut W) -> io::Result<()> {
    for period in &outcome.periods {
        match period.status {
            PeriodStatus::Created {
                quantity,
                clamped: false,
            } => writeln!(writer, "  {}  moved {:>6}", period.date, quantity)?,
            PeriodStatus::Created {
                quantity,
                clamped: true,
            } => writeln!(writer, "  {}  moved {:>6}  (clamped)", period.date, quantity)?,
            PeriodStatus::SkippedZeroBalance => {
                writeln!(writer, "  {}  skipped (source empty)", period.date)?;
            }
            PeriodStatus::AlreadyExists => {
                writeln!(writer, "  {}  already scheduled", period.date)?;
            }
        }
    }
    writeln!(writer, "total moved: {}", outcome.total_moved)?;
    print_summary(outcome.created, outcome.skipped + outcome.existing, writer)
}

/// Print a spread as an aligned period/value table with a sum line.
pub fn print_spread<W: Write>(values: &[Decimal], writer: &mut W) -> io::Result<()> {
    for (i, value) in values.iter().enumerate() {
        writeln!(writer, "{:>4}  {value:>12}", i + 1)?;
    }
    let total: Decimal = values.iter().sum();
    writeln!(writer, "{:>4}  {total:>12}", "sum")
}
