//! Properties and animal categories, the two axes every balance is keyed on.

use crate::{CategoryId, PropertyId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A farm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Store-assigned row id.
    pub id: PropertyId,
    /// Display name; lookups match it case-insensitively by substring.
    pub name: String,
    /// Municipality or region, when recorded.
    pub location: Option<String>,
}

impl Property {
    /// Builds an unsaved property.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PropertyId(0),
            name: name.into(),
            location: None,
        }
    }

    /// Records the property's location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Sex of the animals a category groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    /// Male animals.
    #[serde(rename = "M")]
    Male,
    /// Female animals.
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    /// Single-letter database code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }
}

/// An age/sex bracket of the herd, e.g. "Garrote 12-24m".
///
/// Category names are unique; lookups match them exactly. Evolution moves a
/// cohort from one category to the next when it ages past the bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Store-assigned row id.
    pub id: CategoryId,
    /// Unique name.
    pub name: String,
    /// Sex of the animals grouped.
    pub sex: Sex,
    /// Bracket lower bound in months.
    pub min_age_months: u32,
    /// Bracket upper bound in months; open-ended when `None`.
    pub max_age_months: Option<u32>,
    /// Typical live weight, used as the default sale weight.
    pub avg_weight_kg: Option<Decimal>,
    /// Inactive categories are kept for history but excluded from reports.
    pub active: bool,
}

impl Category {
    /// Builds an unsaved, active category with an open age bracket.
    #[must_use]
    pub fn new(name: impl Into<String>, sex: Sex) -> Self {
        Self {
            id: CategoryId(0),
            name: name.into(),
            sex,
            min_age_months: 0,
            max_age_months: None,
            avg_weight_kg: None,
            active: true,
        }
    }

    /// Sets the age bracket in months.
    #[must_use]
    pub const fn with_age_range(mut self, min: u32, max: u32) -> Self {
        self.min_age_months = min;
        self.max_age_months = Some(max);
        self
    }

    /// Sets the typical live weight.
    #[must_use]
    pub const fn with_avg_weight(mut self, kg: Decimal) -> Self {
        self.avg_weight_kg = Some(kg);
        self
    }
}
