use serde_json::json;

use crate::commands::CommandResult;
use packdeal_core::domain::product::{ExternalProduct, ProductId};
use packdeal_core::numeric::parse_float;
use packdeal_core::pricing::compute_pricing;

/// Prices raw amounts the same way a stored pack is priced. Unreadable prices
/// count as zero and an unreadable discount yields `NaN` totals.
pub fn run(discount_raw: &str, prices: &[String]) -> CommandResult {
    if prices.is_empty() {
        return CommandResult::failure("quote", "usage", "at least one --price is required", 2);
    }

    let products: Vec<ExternalProduct> = prices
        .iter()
        .enumerate()
        .map(|(index, amount)| ExternalProduct {
            id: ProductId(format!("offline-{}", index + 1)),
            title: format!("Item {}", index + 1),
            image_url: None,
            image_alt_text: None,
            min_variant_price_amount: amount.clone(),
        })
        .collect();

    let pricing = compute_pricing(&products, parse_float(discount_raw));
    let display = pricing.display();

    let message = format!(
        "subtotal {} - discount {} = total {}",
        display.subtotal, display.discount_amount, display.total
    );
    CommandResult::success_with_details(
        "quote",
        message,
        Some(json!({
            "product_count": products.len(),
            "discount": discount_raw,
            "subtotal": display.subtotal,
            "discount_amount": display.discount_amount,
            "total": display.total,
        })),
    )
}
