//! Command implementations for the herdbook binaries.
//!
//! Each module contains the full implementation for one routine,
//! invoked by a thin wrapper binary.

pub mod balance;
pub mod chain;
pub mod check;
pub mod common;
pub mod evolve;
pub mod reconcile;
pub mod reprice;
pub mod schedule_sales;
pub mod spread;
