//! Sale scheduling: turning a standing herd into a monthly sale program.
//!
//! A plan names a target head count, a monthly cap and pricing
//! assumptions. The scheduler walks month by month from the start date,
//! selling `min(cap, remaining target, available balance)` each month,
//! and records every lot as a priced `VENDA` movement plus its sale
//! detail row.
//!
//! Corrections are delete-and-recreate: each run first clears the
//! previously scheduled sales for the scope, then rebuilds the program
//! from the current ledger. Re-running an unchanged plan rebuilds the
//! identical schedule.

use crate::{balance, EngineError, Result};
use chrono::{Datelike, NaiveDate};
use herdbook_core::{
    add_months, year_end, CategoryId, Movement, MovementId, MovementKind, PlanId, Pricing,
    PropertyId, Sale, SaleId,
};
use herdbook_store::LedgerWrite;
use serde::Serialize;
use tracing::info;

/// A monthly sale program for one (property, category).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlanning {
    /// Property selling.
    pub property: PropertyId,
    /// Category sold.
    pub category: CategoryId,
    /// Date of the first lot; later lots land on the same day of each
    /// following month, clamped at month end.
    pub start: NaiveDate,
    /// Total heads the program should sell.
    pub target_total: u32,
    /// Most heads any single month may sell.
    pub monthly_cap: u32,
    /// Last calendar year lots may land in.
    pub year_ceiling: i32,
    /// Pricing assumptions for every lot.
    pub pricing: Pricing,
    /// Buyer recorded on the sale rows.
    pub customer: String,
    /// Plan the program belongs to.
    pub plan: Option<PlanId>,
    /// Sell whatever is left on Dec 31 of the ceiling year, so the year
    /// closes at zero.
    pub zero_year_end: bool,
}

impl SalePlanning {
    /// A program confined to the start year, buyer still to be named.
    #[must_use]
    pub fn new(
        property: PropertyId,
        category: CategoryId,
        start: NaiveDate,
        target_total: u32,
        monthly_cap: u32,
        pricing: Pricing,
    ) -> Self {
        Self {
            property,
            category,
            start,
            target_total,
            monthly_cap,
            year_ceiling: start.year(),
            pricing,
            customer: "A definir".to_string(),
            plan: None,
            zero_year_end: false,
        }
    }

    /// Names the buyer.
    #[must_use]
    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = customer.into();
        self
    }

    /// Lets the program run past the start year.
    #[must_use]
    pub const fn with_year_ceiling(mut self, year: i32) -> Self {
        self.year_ceiling = year;
        self
    }

    /// Attaches the program to a plan.
    #[must_use]
    pub const fn with_plan(mut self, plan: PlanId) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Adds the terminal zeroing sale on Dec 31 of the ceiling year.
    #[must_use]
    pub const fn with_zero_year_end(mut self) -> Self {
        self.zero_year_end = true;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.monthly_cap == 0 {
            return Err(EngineError::Invalid(
                "monthly sale cap must be positive".into(),
            ));
        }
        if self.year_ceiling < self.start.year() {
            return Err(EngineError::Invalid(
                "sale window ends before it starts".into(),
            ));
        }
        Ok(())
    }
}

/// Why the scheduler stopped placing lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The full target was scheduled.
    TargetReached,
    /// The balance ran out before the target.
    Exhausted,
    /// The next lot would land past the ceiling year.
    YearCeiling,
}

/// One scheduled lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledLot {
    /// Sale date.
    pub date: NaiveDate,
    /// Heads sold.
    pub quantity: u32,
    /// The `VENDA` movement written.
    pub movement: MovementId,
    /// Its sale detail row.
    pub sale: SaleId,
}

/// What a scheduling run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleOutcome {
    /// Previously scheduled sale movements removed before rebuilding.
    pub cleared: u32,
    /// Lots written, in date order.
    pub created: Vec<ScheduledLot>,
    /// Heads across all lots, terminal sale excluded.
    pub total_sold: u32,
    /// Target heads left unscheduled.
    pub remaining: u32,
    /// Why the monthly loop ended.
    pub stopped: StopReason,
    /// The terminal zeroing sale, when one was requested and needed.
    pub zeroed: Option<ScheduledLot>,
}

/// Removes scheduled `VENDA` movements (and their sale rows) for the scope,
/// one plan bucket at a time, across an inclusive span of years.
pub fn clear_scheduled_sales<S>(
    store: &mut S,
    property: PropertyId,
    category: CategoryId,
    first_year: i32,
    last_year: i32,
    plan: Option<PlanId>,
) -> Result<u32>
where
    S: LedgerWrite + ?Sized,
{
    let mut cleared = 0;
    for year in first_year..=last_year {
        cleared += store.delete_sales_in_year(property, category, year, plan)?;
    }
    Ok(cleared)
}

/// Rebuilds the monthly sale program for a plan.
///
/// The balance is recomputed fresh for every month, so each scheduled lot
/// depletes the ones after it. Running out of animals stops the program
/// cleanly; it is the transfer reconciler, not the scheduler, that treats
/// a short balance as an error.
pub fn schedule_sales<S>(store: &mut S, planning: &SalePlanning) -> Result<SaleOutcome>
where
    S: LedgerWrite + ?Sized,
{
    planning.validate()?;
    let cleared = clear_scheduled_sales(
        store,
        planning.property,
        planning.category,
        planning.start.year(),
        planning.year_ceiling,
        planning.plan,
    )?;
    if cleared > 0 {
        info!(cleared, "removed previously scheduled sales");
    }

    let mut created = Vec::new();
    let mut remaining = planning.target_total;
    let mut month = 0u32;
    let stopped = loop {
        if remaining == 0 {
            break StopReason::TargetReached;
        }
        let date = add_months(planning.start, month);
        if date.year() > planning.year_ceiling {
            break StopReason::YearCeiling;
        }
        let available = balance(store, planning.property, planning.category, date)?;
        if available == 0 {
            break StopReason::Exhausted;
        }

        let quantity = planning.monthly_cap.min(remaining).min(available);
        let lot = write_lot(
            store,
            planning,
            date,
            quantity,
            format!("Lote {}", created.len() + 1),
        )?;
        created.push(lot);
        remaining -= quantity;
        month += 1;
    };

    let total_sold = planning.target_total - remaining;
    let zeroed = if planning.zero_year_end {
        zero_out_year(store, planning)?
    } else {
        None
    };
    Ok(SaleOutcome {
        cleared,
        created,
        total_sold,
        remaining,
        stopped,
        zeroed,
    })
}

/// Sells whatever the category still holds on Dec 31 of the ceiling year,
/// so the year closes at zero. A zero balance writes nothing.
pub fn zero_out_year<S>(store: &mut S, planning: &SalePlanning) -> Result<Option<ScheduledLot>>
where
    S: LedgerWrite + ?Sized,
{
    let date = year_end(planning.year_ceiling);
    let leftover = balance(store, planning.property, planning.category, date)?;
    if leftover == 0 {
        info!(date = %date, "nothing left to zero out");
        return Ok(None);
    }
    let lot = write_lot(
        store,
        planning,
        date,
        leftover,
        "Venda final para zerar saldo".to_string(),
    )?;
    Ok(Some(lot))
}

fn write_lot<S>(
    store: &mut S,
    planning: &SalePlanning,
    date: NaiveDate,
    quantity: u32,
    note: String,
) -> Result<ScheduledLot>
where
    S: LedgerWrite + ?Sized,
{
    let mut movement = Movement::new(
        planning.property,
        planning.category,
        MovementKind::Sale,
        date,
        quantity,
    )
    .with_value_per_head(planning.pricing.value_per_head())
    .with_note(note);
    if let Some(plan) = planning.plan {
        movement = movement.with_plan(plan);
    }
    movement.id = store.insert_movement(&movement)?;
    let sale = Sale::for_movement(&movement, &planning.pricing, planning.customer.clone());
    let sale_id = store.insert_sale(&sale)?;
    Ok(ScheduledLot {
        date,
        quantity,
        movement: movement.id,
        sale: sale_id,
    })
}
