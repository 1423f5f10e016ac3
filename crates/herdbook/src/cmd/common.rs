//! Flags and lookups shared by every herdbook binary.

use anyhow::Context;
use clap::ValueEnum;
use herdbook_core::{Category, PlanId, Property};
use herdbook_engine::{EngineError, Result};
use herdbook_store::{LedgerRead, SqliteStore};
use std::path::Path;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

/// Opens the SQLite ledger at `path`.
///
/// The file must already exist; a typo in `--db` should fail loudly, not
/// materialize an empty ledger.
pub fn open_store(path: &Path) -> anyhow::Result<SqliteStore> {
    if !path.exists() {
        anyhow::bail!("database not found: {}", path.display());
    }
    SqliteStore::open(path).with_context(|| format!("failed to open {}", path.display()))
}

/// Enables debug-level tracing when `--verbose` is set.
pub fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_span_events(FmtSpan::CLOSE)
            .init();
    }
}

/// Finds the single property whose name contains `pattern`,
/// case-insensitively.
pub fn resolve_property<S>(store: &S, pattern: &str) -> Result<Property>
where
    S: LedgerRead + ?Sized,
{
    let mut matches = store.find_properties(pattern)?;
    match matches.len() {
        0 => Err(EngineError::NotFound {
            what: "property",
            name: pattern.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        n => Err(EngineError::Ambiguous {
            what: "property",
            name: pattern.to_string(),
            count: n,
        }),
    }
}

/// Finds a category by its exact (unique) name.
pub fn resolve_category<S>(store: &S, name: &str) -> Result<Category>
where
    S: LedgerRead + ?Sized,
{
    store
        .category_by_name(name)?
        .ok_or_else(|| EngineError::NotFound {
            what: "category",
            name: name.to_string(),
        })
}

/// Picks the plan bucket a command writes into.
///
/// An explicit `--plan <ID>` must name a stored plan. `--no-plan` selects
/// the bucket of movements outside any projection. With neither flag the
/// current plan applies; a ledger with no plans at all falls back to the
/// no-plan bucket.
pub fn resolve_plan<S>(store: &S, plan: Option<i64>, no_plan: bool) -> Result<Option<PlanId>>
where
    S: LedgerRead + ?Sized,
{
    if no_plan {
        return Ok(None);
    }
    match plan {
        Some(raw) => {
            let id = PlanId(raw);
            store
                .plan(id)?
                .map(|p| Some(p.id))
                .ok_or_else(|| EngineError::NotFound {
                    what: "plan",
                    name: raw.to_string(),
                })
        }
        None => Ok(store.current_plan()?.map(|p| p.id)),
    }
}
