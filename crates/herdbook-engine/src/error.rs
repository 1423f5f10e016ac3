//! Engine error taxonomy.

use herdbook_store::StoreError;
use thiserror::Error;

/// Engine result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Everything a maintenance routine can fail with.
///
/// All of these abort the running batch and roll its transaction back.
/// Note what is *not* here: a duplicate movement is a skip, not an error,
/// and a sale scheduler running out of animals stops cleanly with an
/// outcome.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A named property, category or plan does not exist.
    #[error("{what} not found: {name:?}")]
    NotFound {
        /// What was looked up ("property", "category", "plan").
        what: &'static str,
        /// The name or id that failed to resolve.
        name: String,
    },

    /// A name lookup matched more than one row.
    #[error("{what} name {name:?} is ambiguous ({count} matches)")]
    Ambiguous {
        /// What was looked up.
        what: &'static str,
        /// The pattern given.
        name: String,
        /// How many rows matched.
        count: usize,
    },

    /// A transfer was asked to move more animals than the source holds.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Heads actually available at the source on the date.
        available: u32,
        /// Heads the caller asked to move.
        requested: u32,
    },

    /// The store stayed locked through the whole retry budget.
    #[error("store still busy after {attempts} attempts")]
    StoreBusy {
        /// Probe attempts made before giving up.
        attempts: u32,
    },

    /// The request itself is malformed (zero cap, bad weights, ...).
    #[error("invalid request: {0}")]
    Invalid(String),

    /// Underlying storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Stable short code for structured output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "H0001",
            Self::Ambiguous { .. } => "H0002",
            Self::InsufficientBalance { .. } => "H0003",
            Self::StoreBusy { .. } => "H0004",
            Self::Invalid(_) => "H0005",
            Self::Store(_) => "H0006",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_numbers() {
        let err = EngineError::InsufficientBalance {
            available: 37,
            requested: 512,
        };
        assert_eq!(
            err.to_string(),
            "insufficient balance: requested 512, available 37"
        );
        assert_eq!(err.code(), "H0003");
    }

    #[test]
    fn busy_store_error_converts() {
        let err = EngineError::from(StoreError::Busy);
        assert!(matches!(err, EngineError::Store(StoreError::Busy)));
    }
}
