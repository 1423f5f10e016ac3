//! Annual projection plans.

use crate::PlanId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A yearly projection run that owns a set of movements.
///
/// Plans are identified by a code like `PROJ-2024-0003`. The *current* plan
/// is the one created last, with the plan year as tiebreak; stores order by
/// `(created_on, year)` descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Store-assigned row id.
    pub id: PlanId,
    /// Human-facing code, `PROJ-<year>-<seq>`.
    pub code: String,
    /// Projection year.
    pub year: i32,
    /// Date the plan was created.
    pub created_on: NaiveDate,
}

impl Plan {
    /// Builds an unsaved plan with a generated code.
    #[must_use]
    pub fn new(year: i32, sequence: u32, created_on: NaiveDate) -> Self {
        Self {
            id: PlanId(0),
            code: format!("PROJ-{year}-{sequence:04}"),
            year,
            created_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_zero_padded() {
        let created = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let plan = Plan::new(2024, 3, created);
        assert_eq!(plan.code, "PROJ-2024-0003");
    }
}
