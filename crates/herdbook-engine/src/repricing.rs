//! Re-valuing already-scheduled sales from a per-year price table.
//!
//! Quantities in the ledger are append-only, but the money on a projected
//! sale is an assumption, and assumptions get revised. Repricing rewrites
//! the monetary detail of existing sale rows in place: the per-head value
//! comes from the table, the per-kilogram price is re-derived from the
//! sale's own weight assumption, and totals rescale by head count. Dates,
//! quantities and weights stay untouched.

use crate::Result;
use herdbook_core::{CategoryId, PlanId, PropertyId, Sale};
use herdbook_store::LedgerWrite;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Per-year value of one head, in the ledger currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriceTable {
    by_year: BTreeMap<i32, Decimal>,
}

impl PriceTable {
    /// An empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            by_year: BTreeMap::new(),
        }
    }

    /// Sets the per-head value for a year.
    #[must_use]
    pub fn set(mut self, year: i32, value_per_head: Decimal) -> Self {
        self.by_year.insert(year, value_per_head);
        self
    }

    /// The per-head value for a year, when the table has one.
    #[must_use]
    pub fn get(&self, year: i32) -> Option<Decimal> {
        self.by_year.get(&year).copied()
    }

    /// Years the table prices, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.by_year.keys().copied()
    }

    /// True when the table prices nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_year.is_empty()
    }
}

impl FromIterator<(i32, Decimal)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (i32, Decimal)>>(iter: I) -> Self {
        Self {
            by_year: iter.into_iter().collect(),
        }
    }
}

/// What a repricing run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepriceOutcome {
    /// Sales rewritten, per table year.
    pub updated: BTreeMap<i32, u32>,
    /// Rows left alone because their weight assumption is zero and no
    /// per-kilogram price can be derived.
    pub skipped_zero_weight: u32,
}

/// Rewrites the monetary fields of every scheduled sale in the scope
/// whose year the table prices. Sale years absent from the table are left
/// alone.
pub fn reprice_sales<S>(
    store: &mut S,
    property: PropertyId,
    category: CategoryId,
    table: &PriceTable,
    plan: Option<PlanId>,
) -> Result<RepriceOutcome>
where
    S: LedgerWrite + ?Sized,
{
    let mut outcome = RepriceOutcome::default();
    for (&year, &value_per_head) in &table.by_year {
        let mut updated = 0u32;
        for (movement, sale) in store.sales_in_year(property, category, year, plan)? {
            if sale.avg_weight_kg == Decimal::ZERO {
                warn!(sale = %sale.id, date = %movement.date, "weight assumption is zero; skipping");
                outcome.skipped_zero_weight += 1;
                continue;
            }
            let price_per_kg = (value_per_head / sale.avg_weight_kg)
                .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
            let repriced = Sale {
                price_per_kg,
                value_per_head,
                total_value: value_per_head * Decimal::from(movement.quantity),
                ..sale
            };
            store.update_sale_values(&repriced)?;
            updated += 1;
        }
        outcome.updated.insert(year, updated);
    }
    Ok(outcome)
}
