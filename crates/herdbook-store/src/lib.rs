//! Persistence for herdbook.
//!
//! This crate provides:
//! - The [`LedgerRead`] / [`LedgerWrite`] traits the engine runs against
//! - [`MemoryStore`], a `Vec`-backed store for tests and dry runs
//! - [`SqliteStore`], the on-disk store
//!
//! # Idempotency
//!
//! Duplicate detection is the store's job, not the caller's. A movement's
//! identity is its [`MovementKey`] (property, category, kind, date,
//! quantity, plan); [`LedgerWrite::upsert_movement`] inserts atomically and
//! reports [`Upsert::Existing`] instead of creating a second row. Callers
//! never check-then-create.
//!
//! # Transactions
//!
//! Writers bracket work with [`LedgerWrite::begin`] / `commit` /
//! `rollback`. [`LedgerWrite::probe`] asks whether another writer holds the
//! store; the engine's retry policy owns all waiting, so the SQLite store
//! runs with `busy_timeout = 0` and surfaces contention immediately as
//! [`StoreError::Busy`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::NaiveDate;
use herdbook_core::{
    Category, CategoryId, Movement, MovementId, MovementKey, MovementKind, Plan, PlanId, Property,
    PropertyId, Sale, SaleId, Snapshot, SnapshotId,
};
use thiserror::Error;

/// Errors a store can return.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer holds the store. Retryable.
    #[error("store is busy")]
    Busy,
    /// A schema constraint rejected the write.
    #[error("constraint violated: {0}")]
    Constraint(String),
    /// A stored row could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),
    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl StoreError {
    /// Whether retrying after a wait could succeed.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode::{DatabaseBusy, DatabaseLocked};
        match e.sqlite_error_code() {
            Some(DatabaseBusy | DatabaseLocked) => Self::Busy,
            _ => Self::Sqlite(e),
        }
    }
}

/// Store result alias.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Outcome of an idempotent movement insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// The movement was new; a row was created.
    Created(MovementId),
    /// A row with this key already existed; nothing was written.
    Existing(MovementId),
}

impl Upsert {
    /// The id of the row, whether new or pre-existing.
    #[must_use]
    pub const fn id(self) -> MovementId {
        match self {
            Self::Created(id) | Self::Existing(id) => id,
        }
    }

    /// Whether a row was actually created.
    #[must_use]
    pub const fn created(self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Read access to the ledger.
///
/// All movement queries return rows ordered by `(date, id)`, the replay
/// order. Implementations must be consistent about it; the balance fold
/// depends on insertion order breaking date ties.
pub trait LedgerRead: Send {
    /// Properties whose name contains `name_like`, case-insensitively.
    fn find_properties(&self, name_like: &str) -> Result<Vec<Property>>;

    /// Property by id.
    fn property(&self, id: PropertyId) -> Result<Option<Property>>;

    /// Category by exact (unique) name.
    fn category_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// Category by id.
    fn category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// The most recently created plan, year as tiebreak.
    fn current_plan(&self) -> Result<Option<Plan>>;

    /// Plan by id.
    fn plan(&self, id: PlanId) -> Result<Option<Plan>>;

    /// Snapshots for a herd dated at or before `through`, ordered `(date, id)`.
    fn snapshots_through(
        &self,
        property: PropertyId,
        category: CategoryId,
        through: NaiveDate,
    ) -> Result<Vec<Snapshot>>;

    /// Movements for a herd with `after < date <= through`, ordered
    /// `(date, id)`. `after: None` means no lower bound.
    fn movements_in(
        &self,
        property: PropertyId,
        category: CategoryId,
        after: Option<NaiveDate>,
        through: NaiveDate,
    ) -> Result<Vec<Movement>>;

    /// Movements of one kind on a property with `from <= date <= through`,
    /// optionally restricted to a category, ordered `(date, id)`.
    fn movements_of_kind(
        &self,
        property: PropertyId,
        kind: MovementKind,
        category: Option<CategoryId>,
        from: NaiveDate,
        through: NaiveDate,
    ) -> Result<Vec<Movement>>;

    /// Id of the movement with this key, if one exists.
    fn find_movement(&self, key: &MovementKey) -> Result<Option<MovementId>>;

    /// Sale movements and their detail rows for a herd in a calendar year.
    ///
    /// `plan: None` selects the no-plan bucket, not all plans.
    fn sales_in_year(
        &self,
        property: PropertyId,
        category: CategoryId,
        year: i32,
        plan: Option<PlanId>,
    ) -> Result<Vec<(Movement, Sale)>>;
}

/// Write access to the ledger, including transaction control.
pub trait LedgerWrite: LedgerRead {
    /// Inserts a property, returning the assigned id.
    fn insert_property(&mut self, property: &Property) -> Result<PropertyId>;

    /// Inserts a category, returning the assigned id.
    fn insert_category(&mut self, category: &Category) -> Result<CategoryId>;

    /// Inserts a plan, returning the assigned id.
    fn insert_plan(&mut self, plan: &Plan) -> Result<PlanId>;

    /// Inserts a snapshot, returning the assigned id.
    fn insert_snapshot(&mut self, snapshot: &Snapshot) -> Result<SnapshotId>;

    /// Inserts a movement unconditionally, returning the assigned id.
    ///
    /// Fails on a duplicate key; use [`LedgerWrite::upsert_movement`] when
    /// re-runs must skip instead.
    fn insert_movement(&mut self, movement: &Movement) -> Result<MovementId>;

    /// Inserts a movement if no row with its key exists. Atomic.
    fn upsert_movement(&mut self, movement: &Movement) -> Result<Upsert>;

    /// Inserts a sale detail row for a stored movement.
    fn insert_sale(&mut self, sale: &Sale) -> Result<SaleId>;

    /// Rewrites the monetary fields of a stored sale and its movement.
    ///
    /// Quantities, dates and kinds are append-only; monetary detail is the
    /// one thing corrected in place.
    fn update_sale_values(&mut self, sale: &Sale) -> Result<()>;

    /// Deletes a movement; its sale detail row, if any, goes with it.
    fn delete_movement(&mut self, id: MovementId) -> Result<()>;

    /// Deletes all sale movements (and details) for a herd in a year,
    /// returning how many went. `plan: None` is the no-plan bucket.
    fn delete_sales_in_year(
        &mut self,
        property: PropertyId,
        category: CategoryId,
        year: i32,
        plan: Option<PlanId>,
    ) -> Result<u32>;

    /// Opens a write transaction.
    fn begin(&mut self) -> Result<()>;

    /// Commits the open transaction.
    fn commit(&mut self) -> Result<()>;

    /// Rolls the open transaction back.
    fn rollback(&mut self) -> Result<()>;

    /// Checks whether the store can take a write transaction right now.
    ///
    /// Returns `Err(StoreError::Busy)` when another writer holds it.
    /// Acquires and releases the lock; holds nothing on return.
    fn probe(&mut self) -> Result<()>;
}
