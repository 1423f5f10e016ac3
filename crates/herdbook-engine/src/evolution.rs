//! Category evolution: aging a cohort into the next bracket.
//!
//! A cohort born or purchased on some date leaves its category after a
//! fixed number of months. The promotion is a movement pair on the same
//! date: `PROMOCAO_SAIDA` in the old category and `PROMOCAO_ENTRADA` in
//! the new one, so both running balances stay consistent.

use crate::{balance, plan_bucket, EngineError, Result};
use chrono::NaiveDate;
use herdbook_core::{
    add_months, CategoryId, Movement, MovementId, MovementKind, PlanId, PropertyId,
};
use herdbook_store::LedgerWrite;
use serde::Serialize;
use tracing::info;

/// Months a cohort stays in its category before promotion.
pub const DEFAULT_OFFSET_MONTHS: u32 = 12;

/// A cohort due to age out of its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolutionSpec {
    /// Property holding the cohort.
    pub property: PropertyId,
    /// Category the cohort leaves.
    pub from_category: CategoryId,
    /// Category the cohort enters.
    pub to_category: CategoryId,
    /// Date the cohort entered `from_category`.
    pub cohort_date: NaiveDate,
    /// Heads to promote, before clamping to the balance on the day.
    pub quantity: u32,
    /// Months between `cohort_date` and the promotion.
    pub offset_months: u32,
    /// Plan the promotion pair belongs to.
    pub plan: Option<PlanId>,
}

impl EvolutionSpec {
    /// A spec with the standard twelve-month bracket and no plan.
    #[must_use]
    pub const fn new(
        property: PropertyId,
        from_category: CategoryId,
        to_category: CategoryId,
        cohort_date: NaiveDate,
        quantity: u32,
    ) -> Self {
        Self {
            property,
            from_category,
            to_category,
            cohort_date,
            quantity,
            offset_months: DEFAULT_OFFSET_MONTHS,
            plan: None,
        }
    }

    /// Overrides the bracket length.
    #[must_use]
    pub const fn with_offset_months(mut self, months: u32) -> Self {
        self.offset_months = months;
        self
    }

    /// Attaches the promotion to a plan.
    #[must_use]
    pub const fn with_plan(mut self, plan: PlanId) -> Self {
        self.plan = Some(plan);
        self
    }

    /// The date the promotion pair lands on.
    #[must_use]
    pub fn promotion_date(&self) -> NaiveDate {
        add_months(self.cohort_date, self.offset_months)
    }
}

/// What scheduling a promotion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum EvolutionOutcome {
    /// The pair was written.
    Scheduled {
        /// Promotion date.
        date: NaiveDate,
        /// Heads promoted after clamping.
        quantity: u32,
        /// True when the balance held fewer than requested.
        clamped: bool,
        /// Id of the saída in the old category.
        outbound: MovementId,
        /// Id of the entrada in the new category.
        inbound: MovementId,
    },
    /// A promotion out of the category already exists on the date for the
    /// same plan; nothing was written.
    AlreadyScheduled {
        /// Promotion date.
        date: NaiveDate,
    },
    /// The category held no animals on the date; nothing was written.
    SkippedZeroBalance {
        /// Promotion date.
        date: NaiveDate,
    },
}

/// Writes the promotion pair for a cohort, clamped to what the category
/// actually holds on the promotion date.
///
/// The existence check looks for any `PROMOCAO_SAIDA` on the date under
/// the same plan, whatever its quantity. A re-run therefore skips even
/// when the balance has changed since the pair was first written, instead
/// of stacking a second promotion beside a clamped one.
pub fn schedule_evolution<S>(store: &mut S, spec: &EvolutionSpec) -> Result<EvolutionOutcome>
where
    S: LedgerWrite + ?Sized,
{
    if spec.quantity == 0 {
        return Err(EngineError::Invalid("quantity must be positive".into()));
    }
    if spec.from_category == spec.to_category {
        return Err(EngineError::Invalid(
            "promotion must change the category".into(),
        ));
    }

    let date = spec.promotion_date();
    let existing = store.movements_of_kind(
        spec.property,
        MovementKind::PromotionOut,
        Some(spec.from_category),
        date,
        date,
    )?;
    if existing
        .iter()
        .any(|m| plan_bucket(m.plan) == plan_bucket(spec.plan))
    {
        info!(date = %date, "promotion already scheduled; skipping");
        return Ok(EvolutionOutcome::AlreadyScheduled { date });
    }

    let available = balance(store, spec.property, spec.from_category, date)?;
    let quantity = spec.quantity.min(available);
    if quantity == 0 {
        info!(date = %date, "category empty on promotion date; skipping");
        return Ok(EvolutionOutcome::SkippedZeroBalance { date });
    }

    let category_name = |id: CategoryId| -> Result<String> {
        Ok(store.category(id)?.map_or_else(|| id.to_string(), |c| c.name))
    };
    let to_name = category_name(spec.to_category)?;
    let from_name = category_name(spec.from_category)?;

    let mut saida = Movement::new(
        spec.property,
        spec.from_category,
        MovementKind::PromotionOut,
        date,
        quantity,
    )
    .with_note(format!("Evolução para {to_name}"));
    let mut entrada = Movement::new(
        spec.property,
        spec.to_category,
        MovementKind::PromotionIn,
        date,
        quantity,
    )
    .with_note(format!("Evolução de {from_name}"));
    if let Some(plan) = spec.plan {
        saida = saida.with_plan(plan);
        entrada = entrada.with_plan(plan);
    }

    let outbound = store.upsert_movement(&saida)?.id();
    let inbound = store.upsert_movement(&entrada)?.id();
    Ok(EvolutionOutcome::Scheduled {
        date,
        quantity,
        clamped: quantity < spec.quantity,
        outbound,
        inbound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use herdbook_core::{Category, Property, Sex, Snapshot};
    use herdbook_store::{LedgerRead, MemoryStore};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Farm {
        store: MemoryStore,
        property: PropertyId,
        bezerro: CategoryId,
        garrote: CategoryId,
    }

    fn farm() -> Farm {
        let mut store = MemoryStore::new();
        let property = store
            .insert_property(&Property::new("Fazenda Girassol"))
            .unwrap();
        let bezerro = store
            .insert_category(&Category::new("Bezerro", Sex::Male))
            .unwrap();
        let garrote = store
            .insert_category(&Category::new("Garrote", Sex::Male))
            .unwrap();
        Farm {
            store,
            property,
            bezerro,
            garrote,
        }
    }

    #[test]
    fn promotes_a_cohort_one_year_later() {
        let mut f = farm();
        f.store
            .insert_snapshot(&Snapshot::new(f.property, f.bezerro, date(2022, 1, 1), 200))
            .unwrap();

        let spec = EvolutionSpec::new(f.property, f.bezerro, f.garrote, date(2022, 3, 15), 150);
        let outcome = schedule_evolution(&mut f.store, &spec).unwrap();

        match outcome {
            EvolutionOutcome::Scheduled {
                date: d,
                quantity,
                clamped,
                ..
            } => {
                assert_eq!(d, date(2023, 3, 15));
                assert_eq!(quantity, 150);
                assert!(!clamped);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            balance(&f.store, f.property, f.bezerro, date(2023, 3, 15)).unwrap(),
            50
        );
        assert_eq!(
            balance(&f.store, f.property, f.garrote, date(2023, 3, 15)).unwrap(),
            150
        );
    }

    #[test]
    fn clamps_to_what_the_category_holds() {
        let mut f = farm();
        f.store
            .insert_snapshot(&Snapshot::new(f.property, f.bezerro, date(2022, 1, 1), 90))
            .unwrap();

        let spec = EvolutionSpec::new(f.property, f.bezerro, f.garrote, date(2022, 3, 15), 150);
        let outcome = schedule_evolution(&mut f.store, &spec).unwrap();

        match outcome {
            EvolutionOutcome::Scheduled {
                quantity, clamped, ..
            } => {
                assert_eq!(quantity, 90);
                assert!(clamped);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn rerun_skips_even_after_the_balance_changed() {
        let mut f = farm();
        f.store
            .insert_snapshot(&Snapshot::new(f.property, f.bezerro, date(2022, 1, 1), 90))
            .unwrap();

        let spec = EvolutionSpec::new(f.property, f.bezerro, f.garrote, date(2022, 3, 15), 150);
        schedule_evolution(&mut f.store, &spec).unwrap();

        // More calves arrive before the promotion date. The clamped pair
        // stays as written; a re-run must not stack a second one.
        f.store
            .insert_movement(&Movement::new(
                f.property,
                f.bezerro,
                MovementKind::Purchase,
                date(2022, 6, 1),
                60,
            ))
            .unwrap();

        let outcome = schedule_evolution(&mut f.store, &spec).unwrap();
        assert_eq!(
            outcome,
            EvolutionOutcome::AlreadyScheduled {
                date: date(2023, 3, 15)
            }
        );
        let saidas = f
            .store
            .movements_of_kind(
                f.property,
                MovementKind::PromotionOut,
                Some(f.bezerro),
                date(2023, 3, 15),
                date(2023, 3, 15),
            )
            .unwrap();
        assert_eq!(saidas.len(), 1);
        assert_eq!(saidas[0].quantity, 90);
    }

    #[test]
    fn empty_category_is_skipped() {
        let mut f = farm();
        let spec = EvolutionSpec::new(f.property, f.bezerro, f.garrote, date(2022, 3, 15), 150);
        let outcome = schedule_evolution(&mut f.store, &spec).unwrap();
        assert_eq!(
            outcome,
            EvolutionOutcome::SkippedZeroBalance {
                date: date(2023, 3, 15)
            }
        );
        assert!(f
            .store
            .movements_in(f.property, f.bezerro, None, date(2023, 12, 31))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn promotion_date_clamps_to_month_end() {
        let spec = EvolutionSpec::new(
            PropertyId(1),
            CategoryId(1),
            CategoryId(2),
            date(2022, 8, 31),
            10,
        )
        .with_offset_months(6);
        assert_eq!(spec.promotion_date(), date(2023, 2, 28));
    }

    #[test]
    fn plans_keep_separate_promotions() {
        let mut f = farm();
        f.store
            .insert_snapshot(&Snapshot::new(f.property, f.bezerro, date(2022, 1, 1), 200))
            .unwrap();

        let base = EvolutionSpec::new(f.property, f.bezerro, f.garrote, date(2022, 3, 15), 40);
        let first = schedule_evolution(&mut f.store, &base.with_plan(PlanId(1))).unwrap();
        let second = schedule_evolution(&mut f.store, &base.with_plan(PlanId(2))).unwrap();

        assert!(matches!(first, EvolutionOutcome::Scheduled { .. }));
        assert!(matches!(second, EvolutionOutcome::Scheduled { .. }));
        assert_eq!(
            balance(&f.store, f.property, f.garrote, date(2023, 3, 15)).unwrap(),
            80
        );
    }

    #[test]
    fn same_category_is_rejected() {
        let mut f = farm();
        let spec = EvolutionSpec::new(f.property, f.bezerro, f.bezerro, date(2022, 3, 15), 10);
        let err = schedule_evolution(&mut f.store, &spec).unwrap_err();
        assert!(matches!(err, EngineError::Invalid(_)));
    }
}
