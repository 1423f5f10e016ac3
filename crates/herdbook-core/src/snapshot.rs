//! Inventory snapshots, the baselines that seed balance replay.

use crate::{CategoryId, PropertyId, SnapshotId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A physical head count taken on a date.
///
/// The latest snapshot at or before a reference date is the replay
/// baseline. Several snapshots of the same herd on the same date are
/// partial counts and sum. Snapshots are append-only like movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Store-assigned row id.
    pub id: SnapshotId,
    /// Property counted.
    pub property: PropertyId,
    /// Category counted.
    pub category: CategoryId,
    /// Date of the count.
    pub date: NaiveDate,
    /// Heads counted.
    pub quantity: u32,
    /// Appraised value per head, when recorded.
    pub value_per_head: Option<Decimal>,
}

impl Snapshot {
    /// Builds an unsaved snapshot.
    #[must_use]
    pub const fn new(
        property: PropertyId,
        category: CategoryId,
        date: NaiveDate,
        quantity: u32,
    ) -> Self {
        Self {
            id: SnapshotId(0),
            property,
            category,
            date,
            quantity,
            value_per_head: None,
        }
    }

    /// Records the appraised per-head value.
    #[must_use]
    pub const fn with_value_per_head(mut self, value: Decimal) -> Self {
        self.value_per_head = Some(value);
        self
    }
}
