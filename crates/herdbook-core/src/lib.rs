//! Core types for herdbook: typed herd movements, inventory snapshots,
//! annual plans and the calendar arithmetic the schedulers share.
//!
//! Herd counts are never stored as a running total. A count is always
//! derived by replaying the ledger: the latest [`Snapshot`] at or before a
//! reference date seeds the balance, and every [`Movement`] dated after the
//! snapshot is folded in `(date, id)` order. The types here carry exactly
//! the data that replay needs.
//!
//! # Example
//!
//! ```
//! use herdbook_core::{Movement, MovementKind, PropertyId, CategoryId};
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
//! let out = Movement::new(PropertyId(1), CategoryId(2), MovementKind::TransferOut, date, 512);
//! assert!(out.kind.is_debit());
//! assert_eq!(out.kind.code(), "TRANSFERENCIA_SAIDA");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod calendar;
mod herd;
mod ids;
mod kind;
mod movement;
mod plan;
mod sale;
mod snapshot;

pub use calendar::{add_months, year_end, year_start};
pub use herd::{Category, Property, Sex};
pub use ids::{CategoryId, MovementId, PlanId, PropertyId, SaleId, SnapshotId};
pub use kind::{MovementKind, ParseKindError};
pub use movement::{Movement, MovementKey};
pub use plan::Plan;
pub use sale::{Pricing, Sale};
pub use snapshot::Snapshot;

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
