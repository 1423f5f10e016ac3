//! Proportional redistribution of an annual amount into periods.
//!
//! Splits a yearly total into per-period values shaped by weights, with a
//! little noise so the schedule does not look machine-flat: each period is
//! jittered by up to ±12% and lands on broken cents. Everything is exact
//! decimal arithmetic; the jitter is drawn as integer basis points and the
//! cents as an integer, so no float ever touches the money.

use crate::{EngineError, Result};
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};

/// How a yearly amount is split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadParams {
    /// Total the periods must sum to.
    pub target: Decimal,
    /// Relative weight of each period; the length sets the period count.
    pub weights: Vec<Decimal>,
    /// Jitter amplitude in whole percent; 12 means each period varies by
    /// up to ±12% before rescaling.
    pub jitter_pct: u32,
}

impl SpreadParams {
    /// Params with the standard ±12% jitter.
    #[must_use]
    pub const fn new(target: Decimal, weights: Vec<Decimal>) -> Self {
        Self {
            target,
            weights,
            jitter_pct: 12,
        }
    }

    /// Overrides the jitter amplitude.
    #[must_use]
    pub const fn with_jitter_pct(mut self, pct: u32) -> Self {
        self.jitter_pct = pct;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.target <= Decimal::ZERO {
            return Err(EngineError::Invalid("target must be positive".into()));
        }
        if self.weights.is_empty() {
            return Err(EngineError::Invalid("at least one period required".into()));
        }
        if self.weights.iter().any(|w| *w <= Decimal::ZERO) {
            return Err(EngineError::Invalid("weights must be positive".into()));
        }
        if self.jitter_pct >= 100 {
            return Err(EngineError::Invalid(
                "jitter must stay below 100 percent".into(),
            ));
        }
        Ok(())
    }
}

/// The twelve-month seasonal profile: a lighter first half (weight 0.85)
/// and a heavier second half (1.15).
#[must_use]
pub fn seasonal_weights() -> Vec<Decimal> {
    let light = Decimal::new(85, 2);
    let heavy = Decimal::new(115, 2);
    let mut weights = vec![light; 6];
    weights.extend(vec![heavy; 6]);
    weights
}

/// Splits the target into one value per weight.
///
/// Each period starts from its weighted share, is jittered by a factor
/// drawn in `[1 - j, 1 + j]` plus random cents, and the whole vector is
/// rescaled so it sums back to the target. Values are rounded half-up to
/// cents; the rounding residual (at most half a cent per period) is folded
/// into the final period, so the returned values sum to the target
/// exactly. The same seed and params always produce the same split.
pub fn spread<R: Rng>(params: &SpreadParams, rng: &mut R) -> Result<Vec<Decimal>> {
    params.validate()?;

    let weight_sum: Decimal = params.weights.iter().sum();
    let base = params.target / weight_sum;
    let amplitude_bp = i64::from(params.jitter_pct) * 100;

    let raw: Vec<Decimal> = params
        .weights
        .iter()
        .map(|weight| {
            let factor = Decimal::ONE + Decimal::new(rng.gen_range(-amplitude_bp..=amplitude_bp), 4);
            let cents = Decimal::new(rng.gen_range(0..100), 2);
            base * weight * factor + cents
        })
        .collect();

    let raw_sum: Decimal = raw.iter().sum();
    let scale = params.target / raw_sum;
    let mut values: Vec<Decimal> = raw
        .iter()
        .map(|v| (v * scale).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .collect();

    let rounded_sum: Decimal = values.iter().sum();
    let residual = params.target - rounded_sum;
    if let Some(last) = values.last_mut() {
        *last += residual;
    }
    Ok(values)
}
