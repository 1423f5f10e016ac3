//! Projected herd movements and the idempotency key that deduplicates them.

use crate::{CategoryId, MovementId, MovementKind, PlanId, PropertyId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One projected movement of whole animals.
///
/// Movements are append-only: a correction deletes and recreates rows, it
/// never mutates quantity, date or kind in place. The store assigns `id` on
/// insert; a freshly built movement carries `MovementId(0)` until stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Store-assigned row id; insertion-ordered.
    pub id: MovementId,
    /// Property the movement applies to.
    pub property: PropertyId,
    /// Category the movement applies to.
    pub category: CategoryId,
    /// Credit or debit kind.
    pub kind: MovementKind,
    /// Date the movement takes effect.
    pub date: NaiveDate,
    /// Whole head count, always positive.
    pub quantity: u32,
    /// Monetary value per head, when priced.
    pub value_per_head: Option<Decimal>,
    /// `value_per_head * quantity`, when priced.
    pub total_value: Option<Decimal>,
    /// Free-form note (lot numbers, source property, and the like).
    pub note: Option<String>,
    /// Owning plan; `None` for movements outside any projection.
    pub plan: Option<PlanId>,
}

impl Movement {
    /// Builds an unpriced, unsaved movement.
    #[must_use]
    pub fn new(
        property: PropertyId,
        category: CategoryId,
        kind: MovementKind,
        date: NaiveDate,
        quantity: u32,
    ) -> Self {
        Self {
            id: MovementId(0),
            property,
            category,
            kind,
            date,
            quantity,
            value_per_head: None,
            total_value: None,
            note: None,
            plan: None,
        }
    }

    /// Sets the per-head value and derives the total from the quantity.
    #[must_use]
    pub fn with_value_per_head(mut self, value: Decimal) -> Self {
        self.total_value = Some(value * Decimal::from(self.quantity));
        self.value_per_head = Some(value);
        self
    }

    /// Attaches a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Assigns the movement to a plan.
    #[must_use]
    pub const fn with_plan(mut self, plan: PlanId) -> Self {
        self.plan = Some(plan);
        self
    }

    /// The idempotency key of this movement.
    #[must_use]
    pub const fn key(&self) -> MovementKey {
        MovementKey {
            property: self.property,
            category: self.category,
            kind: self.kind,
            date: self.date,
            quantity: self.quantity,
            plan: self.plan,
        }
    }
}

/// Identity of a movement for duplicate detection.
///
/// Two movements with the same key are the same logical entry; stores
/// enforce at most one row per key and report the second insert as already
/// existing. `plan: None` is a single bucket, not a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementKey {
    /// Property the movement applies to.
    pub property: PropertyId,
    /// Category the movement applies to.
    pub category: CategoryId,
    /// Credit or debit kind.
    pub kind: MovementKind,
    /// Effective date.
    pub date: NaiveDate,
    /// Head count.
    pub quantity: u32,
    /// Owning plan, if any.
    pub plan: Option<PlanId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pricing_derives_total_from_quantity() {
        let m = Movement::new(
            PropertyId(1),
            CategoryId(2),
            MovementKind::Sale,
            date(2023, 2, 1),
            30,
        )
        .with_value_per_head(dec!(2925.00));
        assert_eq!(m.value_per_head, Some(dec!(2925.00)));
        assert_eq!(m.total_value, Some(dec!(87750.00)));
    }

    #[test]
    fn key_ignores_value_and_note() {
        let base = Movement::new(
            PropertyId(1),
            CategoryId(2),
            MovementKind::TransferOut,
            date(2023, 6, 1),
            512,
        )
        .with_plan(PlanId(7));
        let priced = base.clone().with_value_per_head(dec!(1.00)).with_note("x");
        assert_eq!(base.key(), priced.key());
    }

    #[test]
    fn key_distinguishes_planless_from_planned() {
        let planless = Movement::new(
            PropertyId(1),
            CategoryId(2),
            MovementKind::Birth,
            date(2024, 1, 1),
            10,
        );
        let planned = planless.clone().with_plan(PlanId(1));
        assert_ne!(planless.key(), planned.key());
    }
}
