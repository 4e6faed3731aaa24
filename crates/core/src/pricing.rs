use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::product::ExternalProduct;
use crate::numeric::parse_amount_or_zero;

/// Derived totals for a pack. `discount_amount` and `total` are `NaN` when the
/// discount itself is not a number; the subtotal is always finite.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackPricing {
    pub subtotal: f64,
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub total: f64,
}

/// Two-decimal renderings of [`PackPricing`] for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingDisplay {
    pub subtotal: String,
    pub discount_amount: String,
    pub total: String,
}

impl PackPricing {
    pub fn display(&self) -> PricingDisplay {
        PricingDisplay {
            subtotal: format_amount(self.subtotal),
            discount_amount: format_amount(self.discount_amount),
            total: format_amount(self.total),
        }
    }
}

pub fn subtotal(products: &[ExternalProduct]) -> f64 {
    products.iter().map(|product| parse_amount_or_zero(&product.min_variant_price_amount)).sum()
}

pub fn compute_pricing(products: &[ExternalProduct], discount_percent: f64) -> PackPricing {
    let subtotal = subtotal(products);
    let discount_amount = subtotal * discount_percent / 100.0;
    let total = subtotal - discount_amount;

    PackPricing { subtotal, discount_percent, discount_amount, total }
}

/// Rounds the exact binary value half away from zero to two places, so
/// `1.005` (stored just below the midpoint) renders as `1.00`. Non-finite
/// values render as `NaN`, `inf` or `-inf`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    match Decimal::from_f64_retain(value) {
        Some(amount) => {
            format!("{:.2}", amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        }
        None => format!("{value:.2}"),
    }
}
