//! Standing transfer orders.
//!
//! A chain is the instruction "move this many head along this route every
//! N months until the horizon year". Each period is handled on its own:
//! already-recorded periods are left alone, an empty source skips the
//! period without stopping the chain, and the rest get a freshly written
//! transfer pair clamped to the source's balance on the day.

use crate::reconcile::{paired_movements, TransferRoute};
use crate::{balance, plan_bucket, EngineError, Result};
use chrono::{Datelike, NaiveDate};
use herdbook_core::{add_months, MovementKind, PlanId};
use herdbook_store::LedgerWrite;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// A periodic transfer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainSpec {
    /// Route every period runs along.
    pub route: TransferRoute,
    /// Date of the first period.
    pub start: NaiveDate,
    /// Months between periods.
    pub step_months: u32,
    /// Last calendar year periods may land in.
    pub horizon_year: i32,
    /// Heads per period, before clamping.
    pub quantity: u32,
    /// Per-head value stamped on both sides, when priced.
    pub value_per_head: Option<Decimal>,
    /// Plan the chain belongs to.
    pub plan: Option<PlanId>,
}

impl ChainSpec {
    /// An unpriced chain outside any plan.
    #[must_use]
    pub const fn new(
        route: TransferRoute,
        start: NaiveDate,
        step_months: u32,
        horizon_year: i32,
        quantity: u32,
    ) -> Self {
        Self {
            route,
            start,
            step_months,
            horizon_year,
            quantity,
            value_per_head: None,
            plan: None,
        }
    }

    /// Prices both sides of every pair.
    #[must_use]
    pub const fn with_value_per_head(mut self, value: Decimal) -> Self {
        self.value_per_head = Some(value);
        self
    }

    /// Attaches the chain to a plan.
    #[must_use]
    pub const fn with_plan(mut self, plan: PlanId) -> Self {
        self.plan = Some(plan);
        self
    }
}

/// What happened to one period of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum PeriodStatus {
    /// A transfer pair was written.
    Created {
        /// Heads moved after clamping.
        quantity: u32,
        /// True when the source held fewer than the order quantity.
        clamped: bool,
    },
    /// The source held nothing on the date; the chain continues.
    SkippedZeroBalance,
    /// A transfer out already exists on the date for the same plan.
    AlreadyExists,
}

/// One period of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainPeriod {
    /// The period's date.
    pub date: NaiveDate,
    /// What was done for it.
    pub status: PeriodStatus,
}

/// What running a chain did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainOutcome {
    /// Every period visited, in date order.
    pub periods: Vec<ChainPeriod>,
    /// Periods that got a new pair.
    pub created: usize,
    /// Periods skipped for an empty source.
    pub skipped: usize,
    /// Periods already recorded.
    pub existing: usize,
    /// Heads moved across all created periods.
    pub total_moved: u32,
}

/// Walks the chain from its start to the horizon year, writing one
/// transfer pair per period that needs one.
pub fn run_chain<S>(store: &mut S, spec: &ChainSpec) -> Result<ChainOutcome>
where
    S: LedgerWrite + ?Sized,
{
    if spec.quantity == 0 {
        return Err(EngineError::Invalid("quantity must be positive".into()));
    }
    if spec.step_months == 0 {
        return Err(EngineError::Invalid(
            "step must be at least one month".into(),
        ));
    }
    if spec.horizon_year < spec.start.year() {
        return Err(EngineError::Invalid(
            "horizon year precedes the start".into(),
        ));
    }

    let mut outcome = ChainOutcome {
        periods: Vec::new(),
        created: 0,
        skipped: 0,
        existing: 0,
        total_moved: 0,
    };
    let mut months = 0u32;
    loop {
        let date = add_months(spec.start, months);
        if date.year() > spec.horizon_year {
            break;
        }
        let status = run_period(store, spec, date)?;
        match status {
            PeriodStatus::Created { quantity, .. } => {
                outcome.created += 1;
                outcome.total_moved += quantity;
            }
            PeriodStatus::SkippedZeroBalance => outcome.skipped += 1,
            PeriodStatus::AlreadyExists => outcome.existing += 1,
        }
        outcome.periods.push(ChainPeriod { date, status });
        months += spec.step_months;
    }
    Ok(outcome)
}

fn run_period<S>(store: &mut S, spec: &ChainSpec, date: NaiveDate) -> Result<PeriodStatus>
where
    S: LedgerWrite + ?Sized,
{
    let existing = store.movements_of_kind(
        spec.route.source,
        MovementKind::TransferOut,
        Some(spec.route.from_category),
        date,
        date,
    )?;
    if existing
        .iter()
        .any(|m| plan_bucket(m.plan) == plan_bucket(spec.plan))
    {
        info!(date = %date, "period already recorded; skipping");
        return Ok(PeriodStatus::AlreadyExists);
    }

    let available = balance(store, spec.route.source, spec.route.from_category, date)?;
    let quantity = spec.quantity.min(available);
    if quantity == 0 {
        info!(date = %date, "source empty for the period; skipping");
        return Ok(PeriodStatus::SkippedZeroBalance);
    }

    let (mut saida, mut entrada) = paired_movements(store, &spec.route, date, quantity)?;
    if let Some(value) = spec.value_per_head {
        saida = saida.with_value_per_head(value);
        entrada = entrada.with_value_per_head(value);
    }
    if let Some(plan) = spec.plan {
        saida = saida.with_plan(plan);
        entrada = entrada.with_plan(plan);
    }
    store.upsert_movement(&saida)?;
    store.upsert_movement(&entrada)?;
    Ok(PeriodStatus::Created {
        quantity,
        clamped: quantity < spec.quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use herdbook_core::{Category, CategoryId, Property, PropertyId, Sex, Snapshot};
    use herdbook_store::{LedgerRead, MemoryStore};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Farm {
        store: MemoryStore,
        route: TransferRoute,
    }

    fn farm_with(head: u32) -> Farm {
        let mut store = MemoryStore::new();
        let source = store
            .insert_property(&Property::new("Fazenda Girassol"))
            .unwrap();
        let destination = store
            .insert_property(&Property::new("Favo de Mel"))
            .unwrap();
        let category = store
            .insert_category(&Category::new("Boi Magro", Sex::Male))
            .unwrap();
        store
            .insert_snapshot(&Snapshot::new(source, category, date(2023, 1, 1), head))
            .unwrap();
        Farm {
            store,
            route: TransferRoute::same_category(source, destination, category),
        }
    }

    #[test]
    fn quarterly_order_runs_to_the_horizon() {
        let mut f = farm_with(1000);
        let spec = ChainSpec::new(f.route, date(2023, 3, 10), 3, 2024, 60);
        let outcome = run_chain(&mut f.store, &spec).unwrap();

        assert_eq!(outcome.periods.len(), 8);
        assert_eq!(outcome.created, 8);
        assert_eq!(outcome.total_moved, 480);
        assert_eq!(outcome.periods[0].date, date(2023, 3, 10));
        assert_eq!(outcome.periods[7].date, date(2024, 12, 10));
        assert_eq!(
            balance(&f.store, f.route.destination, f.route.to_category, date(2024, 12, 31))
                .unwrap(),
            480
        );
        assert_eq!(
            balance(&f.store, f.route.source, f.route.from_category, date(2024, 12, 31)).unwrap(),
            520
        );
    }

    #[test]
    fn clamps_then_skips_once_the_source_runs_dry() {
        let mut f = farm_with(150);
        let spec = ChainSpec::new(f.route, date(2023, 3, 10), 3, 2023, 60);
        let outcome = run_chain(&mut f.store, &spec).unwrap();

        let statuses: Vec<PeriodStatus> = outcome.periods.iter().map(|p| p.status).collect();
        assert_eq!(
            statuses,
            [
                PeriodStatus::Created {
                    quantity: 60,
                    clamped: false
                },
                PeriodStatus::Created {
                    quantity: 60,
                    clamped: false
                },
                PeriodStatus::Created {
                    quantity: 30,
                    clamped: true
                },
                PeriodStatus::SkippedZeroBalance,
            ]
        );
        assert_eq!(outcome.total_moved, 150);
    }

    #[test]
    fn rerun_leaves_the_ledger_unchanged() {
        let mut f = farm_with(150);
        let spec = ChainSpec::new(f.route, date(2023, 3, 10), 3, 2023, 60);
        run_chain(&mut f.store, &spec).unwrap();
        let second = run_chain(&mut f.store, &spec).unwrap();

        assert_eq!(second.created, 0);
        assert_eq!(second.existing, 3);
        assert_eq!(second.skipped, 1);
        assert_eq!(
            f.store
                .movements_in(f.route.destination, f.route.to_category, None, date(2023, 12, 31))
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn zero_step_is_rejected() {
        let mut f = farm_with(100);
        let spec = ChainSpec::new(f.route, date(2023, 3, 10), 0, 2023, 60);
        assert!(matches!(
            run_chain(&mut f.store, &spec).unwrap_err(),
            EngineError::Invalid(_)
        ));
    }
}
