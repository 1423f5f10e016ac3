//! The eight movement kinds and their credit/debit classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of a herd movement.
///
/// The wire codes (and database values) are the Portuguese identifiers the
/// field data uses; [`MovementKind::code`] returns them. Credits increase a
/// balance, debits decrease it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    /// Calves born on the property (`NASCIMENTO`). Credit.
    #[serde(rename = "NASCIMENTO")]
    Birth,
    /// Animals bought in (`COMPRA`). Credit.
    #[serde(rename = "COMPRA")]
    Purchase,
    /// Animals received from another property (`TRANSFERENCIA_ENTRADA`). Credit.
    #[serde(rename = "TRANSFERENCIA_ENTRADA")]
    TransferIn,
    /// Animals promoted into this category (`PROMOCAO_ENTRADA`). Credit.
    #[serde(rename = "PROMOCAO_ENTRADA")]
    PromotionIn,
    /// Animals sold (`VENDA`). Debit.
    #[serde(rename = "VENDA")]
    Sale,
    /// Animals lost to death (`MORTE`). Debit.
    #[serde(rename = "MORTE")]
    Death,
    /// Animals sent to another property (`TRANSFERENCIA_SAIDA`). Debit.
    #[serde(rename = "TRANSFERENCIA_SAIDA")]
    TransferOut,
    /// Animals promoted out of this category (`PROMOCAO_SAIDA`). Debit.
    #[serde(rename = "PROMOCAO_SAIDA")]
    PromotionOut,
}

impl MovementKind {
    /// All kinds, credits first.
    pub const ALL: [Self; 8] = [
        Self::Birth,
        Self::Purchase,
        Self::TransferIn,
        Self::PromotionIn,
        Self::Sale,
        Self::Death,
        Self::TransferOut,
        Self::PromotionOut,
    ];

    /// The stable wire/database code for this kind.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Birth => "NASCIMENTO",
            Self::Purchase => "COMPRA",
            Self::TransferIn => "TRANSFERENCIA_ENTRADA",
            Self::PromotionIn => "PROMOCAO_ENTRADA",
            Self::Sale => "VENDA",
            Self::Death => "MORTE",
            Self::TransferOut => "TRANSFERENCIA_SAIDA",
            Self::PromotionOut => "PROMOCAO_SAIDA",
        }
    }

    /// Whether this kind increases a balance.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(
            self,
            Self::Birth | Self::Purchase | Self::TransferIn | Self::PromotionIn
        )
    }

    /// Whether this kind decreases a balance.
    #[must_use]
    pub const fn is_debit(self) -> bool {
        !self.is_credit()
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a wire code does not name a movement kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown movement kind: {0:?}")]
pub struct ParseKindError(pub String);

impl FromStr for MovementKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.code() == s)
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}
