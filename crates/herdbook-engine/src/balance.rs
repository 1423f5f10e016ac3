//! Balance replay: the one true way to count a herd.

use crate::Result;
use chrono::NaiveDate;
use herdbook_core::{CategoryId, PropertyId};
use herdbook_store::LedgerRead;
use serde::Serialize;

/// How a balance came to be, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceDetail {
    /// Date of the baseline snapshot, if one existed.
    pub snapshot_date: Option<NaiveDate>,
    /// Baseline count (same-date snapshots summed), 0 without a snapshot.
    pub opening: u32,
    /// Sum of credit quantities replayed.
    pub credits: u32,
    /// Sum of debit quantities replayed, before any clamping.
    pub debits: u32,
    /// Whether any debit was floored at zero during replay.
    pub clamped: bool,
    /// Movements replayed.
    pub movements: usize,
    /// The resulting count.
    pub closing: u32,
}

/// Replays the ledger and returns the head count as of `as_of`.
///
/// The baseline is the latest snapshot dated at or before `as_of`; several
/// snapshots on that same date sum. Movements strictly after the snapshot
/// date and at or before `as_of` are folded in `(date, id)` order: credits
/// add, debits subtract with the count floored at zero after every
/// subtraction. Movements on the snapshot date itself are excluded; the
/// snapshot already counted them.
pub fn balance<S>(
    store: &S,
    property: PropertyId,
    category: CategoryId,
    as_of: NaiveDate,
) -> Result<u32>
where
    S: LedgerRead + ?Sized,
{
    balance_detail(store, property, category, as_of).map(|d| d.closing)
}

/// Like [`balance`], but keeps the replay's intermediate sums for reports.
pub fn balance_detail<S>(
    store: &S,
    property: PropertyId,
    category: CategoryId,
    as_of: NaiveDate,
) -> Result<BalanceDetail>
where
    S: LedgerRead + ?Sized,
{
    let snapshots = store.snapshots_through(property, category, as_of)?;
    let snapshot_date = snapshots.last().map(|s| s.date);
    let opening: u32 = match snapshot_date {
        Some(latest) => snapshots
            .iter()
            .filter(|s| s.date == latest)
            .map(|s| s.quantity)
            .sum(),
        None => 0,
    };

    let movements = store.movements_in(property, category, snapshot_date, as_of)?;
    let mut closing = opening;
    let mut credits = 0u32;
    let mut debits = 0u32;
    let mut clamped = false;
    for movement in &movements {
        if movement.kind.is_credit() {
            credits = credits.saturating_add(movement.quantity);
            closing = closing.saturating_add(movement.quantity);
        } else {
            debits = debits.saturating_add(movement.quantity);
            if movement.quantity > closing {
                clamped = true;
            }
            closing = closing.saturating_sub(movement.quantity);
        }
    }

    Ok(BalanceDetail {
        snapshot_date,
        opening,
        credits,
        debits,
        clamped,
        movements: movements.len(),
        closing,
    })
}
