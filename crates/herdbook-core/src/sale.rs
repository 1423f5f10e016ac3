//! Commercial detail of projected sales.

use crate::{Movement, MovementId, SaleId};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pricing assumptions a sale schedule is valued with.
///
/// Per-head value is `avg_weight_kg * price_per_kg`; a lot's total scales
/// by head count. Receipt happens `payment_term_days` after the sale date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    /// Assumed live weight per head.
    pub avg_weight_kg: Decimal,
    /// Contract price per kilogram.
    pub price_per_kg: Decimal,
    /// Days between sale and payment receipt.
    pub payment_term_days: u32,
}

impl Pricing {
    /// Builds a pricing with the standard 30-day payment term.
    #[must_use]
    pub const fn new(avg_weight_kg: Decimal, price_per_kg: Decimal) -> Self {
        Self {
            avg_weight_kg,
            price_per_kg,
            payment_term_days: 30,
        }
    }

    /// Overrides the payment term.
    #[must_use]
    pub const fn with_payment_term(mut self, days: u32) -> Self {
        self.payment_term_days = days;
        self
    }

    /// Value of one head under these assumptions.
    #[must_use]
    pub fn value_per_head(&self) -> Decimal {
        self.avg_weight_kg * self.price_per_kg
    }

    /// Date payment is expected for a sale on `sale_date`.
    #[must_use]
    pub fn receipt_date(&self, sale_date: NaiveDate) -> NaiveDate {
        sale_date
            .checked_add_days(Days::new(u64::from(self.payment_term_days)))
            .unwrap_or(NaiveDate::MAX)
    }
}

/// Commercial record attached one-to-one to a `VENDA` movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Store-assigned row id.
    pub id: SaleId,
    /// The movement this sale details; deleting it deletes the sale.
    pub movement: MovementId,
    /// Buyer.
    pub customer: String,
    /// Assumed live weight per head.
    pub avg_weight_kg: Decimal,
    /// `avg_weight_kg * quantity`.
    pub total_weight_kg: Decimal,
    /// Contract price per kilogram.
    pub price_per_kg: Decimal,
    /// `avg_weight_kg * price_per_kg`.
    pub value_per_head: Decimal,
    /// `value_per_head * quantity`.
    pub total_value: Decimal,
    /// Date payment is expected.
    pub receipt_date: NaiveDate,
    /// Days between sale and receipt.
    pub payment_term_days: u32,
}

impl Sale {
    /// Builds the sale record for a priced `VENDA` movement.
    ///
    /// The movement's date and quantity drive the receipt date and the
    /// weight/value totals; the movement's own value fields are expected to
    /// carry the same per-head value (see
    /// [`Movement::with_value_per_head`]).
    #[must_use]
    pub fn for_movement(movement: &Movement, pricing: &Pricing, customer: impl Into<String>) -> Self {
        let quantity = Decimal::from(movement.quantity);
        Self {
            id: SaleId(0),
            movement: movement.id,
            customer: customer.into(),
            avg_weight_kg: pricing.avg_weight_kg,
            total_weight_kg: pricing.avg_weight_kg * quantity,
            price_per_kg: pricing.price_per_kg,
            value_per_head: pricing.value_per_head(),
            total_value: pricing.value_per_head() * quantity,
            receipt_date: pricing.receipt_date(movement.date),
            payment_term_days: pricing.payment_term_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CategoryId, MovementKind, PropertyId};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn per_head_value_is_weight_times_price() {
        let pricing = Pricing::new(dec!(450.00), dec!(6.50));
        assert_eq!(pricing.value_per_head(), dec!(2925.0000));
    }

    #[test]
    fn receipt_follows_payment_term() {
        let pricing = Pricing::new(dec!(500.00), dec!(7.00));
        assert_eq!(pricing.receipt_date(date(2024, 12, 15)), date(2025, 1, 14));
        let long = pricing.with_payment_term(90);
        assert_eq!(long.receipt_date(date(2024, 12, 15)), date(2025, 3, 15));
    }

    #[test]
    fn sale_totals_scale_by_quantity() {
        let pricing = Pricing::new(dec!(450.00), dec!(6.50));
        let movement = Movement::new(
            PropertyId(1),
            CategoryId(2),
            MovementKind::Sale,
            date(2022, 2, 1),
            80,
        )
        .with_value_per_head(pricing.value_per_head());
        let sale = Sale::for_movement(&movement, &pricing, "JBS");
        assert_eq!(sale.total_weight_kg, dec!(36000.00));
        assert_eq!(sale.value_per_head, dec!(2925.0000));
        assert_eq!(sale.total_value, dec!(234000.0000));
        assert_eq!(sale.receipt_date, date(2022, 3, 3));
        assert_eq!(sale.payment_term_days, 30);
    }
}
