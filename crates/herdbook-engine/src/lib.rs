//! Herdbook projection engine.
//!
//! This crate provides:
//! - Balance replay over snapshots and movements ([`balance`])
//! - Transfer-pair reconciliation ([`find_unpaired`], [`create_missing_pairs`],
//!   [`rebuild_pair`])
//! - Category evolution scheduling ([`schedule_evolution`])
//! - Sale scheduling with exhaustion handling ([`schedule_sales`])
//! - Periodic transfer chains ([`run_chain`])
//! - Sale repricing from per-year price tables ([`reprice_sales`])
//! - Proportional redistribution of annual targets ([`spread`])
//! - The batch runner that wraps all of the above in one retry-guarded
//!   transaction ([`run_batch`])
//!
//! Every routine is idempotent: re-running a completed batch creates
//! nothing, because movement identity is enforced by the store (see
//! `herdbook_store::LedgerWrite::upsert_movement`) and delete-and-recreate
//! scopes rebuild the same rows. A routine that fails rolls its whole
//! transaction back; partial work is never visible.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod balance;
mod chain;
mod error;
mod evolution;
mod reconcile;
mod repricing;
mod runner;
mod sales;
mod spread;

pub use balance::{balance, balance_detail, BalanceDetail};
pub use chain::{run_chain, ChainOutcome, ChainPeriod, ChainSpec, PeriodStatus};
pub use error::{EngineError, Result};
pub use evolution::{
    schedule_evolution, EvolutionOutcome, EvolutionSpec, DEFAULT_OFFSET_MONTHS,
};
pub use reconcile::{
    create_missing_pairs, find_unpaired, rebuild_pair, QuantityPolicy, RebuildOutcome,
    RebuildSpec, ReconcileOutcome, TransferRoute,
};
pub use repricing::{reprice_sales, PriceTable, RepriceOutcome};
pub use runner::{run_batch, wait_until_free, RetryPolicy};
pub use sales::{
    clear_scheduled_sales, schedule_sales, zero_out_year, SaleOutcome, SalePlanning,
    ScheduledLot, StopReason,
};
pub use spread::{seasonal_weights, spread, SpreadParams};

/// Movement-key bucket for a plan. `None` and a hypothetical plan id 0
/// share a bucket, mirroring the store's `ifnull(plan_id, 0)` key.
pub(crate) fn plan_bucket(plan: Option<herdbook_core::PlanId>) -> i64 {
    plan.map_or(0, |p| p.0)
}
