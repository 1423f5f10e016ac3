//! Herdbook maintenance binaries.
//!
//! Every routine ships as a standalone binary; the implementations live in
//! this crate so the binaries stay thin wrappers:
//!
//! - `herd-balance`: replayed head count for a herd on a date
//! - `herd-check`: report transfer saídas with no matching entrada
//! - `herd-reconcile`: create the missing entradas
//! - `herd-evolve`: schedule a category promotion for a cohort
//! - `herd-schedule-sales`: rebuild the monthly sale program for a plan
//! - `herd-chain`: run a periodic transfer chain to a horizon year
//! - `herd-reprice`: rewrite scheduled sale values from a price table
//! - `herd-spread`: split an annual amount into jittered periodic values
//!
//! # Example Usage
//!
//! ```bash
//! herd-balance --db herd.db girassol "Boi Gordo" --as-of 2023-06-15
//! herd-check --db herd.db girassol "favo de mel" --category "Boi Gordo"
//! herd-reconcile --db herd.db girassol "favo de mel" --category "Boi Gordo"
//! ```
//!
//! All binaries exit 0 on success and 2 on any error; `herd-check` exits 1
//! when it finds unpaired transfers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod report;
