//! # Pre-Submit Validation
//!
//! Re-validates cart lines against the current catalog immediately before
//! submission: quantities against re-read stock, prices, and discounts
//! against re-resolved ceilings. Cart-time checks may have run against a
//! staler catalog snapshot, so everything is checked again at the gate.
//!
//! Any violation halts submission with a typed report and no state
//! change.

use thiserror::Error;

use crate::cart::{Cart, DiscountPolicy};
use crate::types::Product;

// =============================================================================
// Submit Blocks
// =============================================================================

/// A pre-submit violation. Local, never sent to the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitBlock {
    #[error("Cart is empty")]
    EmptyCart,

    /// The product disappeared from the catalog since it was added.
    #[error("Product {product_id} is no longer available")]
    ProductMissing { product_id: String },

    #[error("Quantity for {sku} exceeds current stock: available {available}, in cart {requested}")]
    StockExceeded {
        sku: String,
        available: i64,
        requested: i64,
    },

    #[error("Invalid unit price for {sku}: {cents} cents")]
    InvalidPrice { sku: String, cents: i64 },

    #[error("Discount on {sku} exceeds the allowed ceiling ({applied_bps} bps > {ceiling_bps} bps)")]
    DiscountAboveCeiling {
        sku: String,
        applied_bps: u32,
        ceiling_bps: u32,
    },
}

// =============================================================================
// Gate
// =============================================================================

/// Re-validates every cart line against the current catalog and discount
/// policy. Empty result = clear to submit.
pub fn validate_items_for_submit(
    cart: &Cart,
    catalog: &[Product],
    policy: &DiscountPolicy,
    role: &str,
) -> Vec<SubmitBlock> {
    let mut blocks = Vec::new();

    if cart.is_empty() {
        blocks.push(SubmitBlock::EmptyCart);
        return blocks;
    }

    for item in &cart.items {
        let Some(current) = catalog.iter().find(|p| p.id == item.product.id) else {
            blocks.push(SubmitBlock::ProductMissing {
                product_id: item.product.id.clone(),
            });
            continue;
        };

        if item.quantity > current.stock {
            blocks.push(SubmitBlock::StockExceeded {
                sku: current.sku.clone(),
                available: current.stock,
                requested: item.quantity,
            });
        }

        if item.unit_price_cents < 0 {
            blocks.push(SubmitBlock::InvalidPrice {
                sku: current.sku.clone(),
                cents: item.unit_price_cents,
            });
        }

        // Ceiling re-resolved against the *current* catalog entry, not
        // the cart snapshot: discountable flags and ceilings may have
        // changed since the line was created.
        let ceiling = policy.effective_ceiling(role, current);
        if item.discount_bps > ceiling.bps() {
            blocks.push(SubmitBlock::DiscountAboveCeiling {
                sku: current.sku.clone(),
                applied_bps: item.discount_bps,
                ceiling_bps: ceiling.bps(),
            });
        }
    }

    blocks
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Rate;
    use std::collections::HashMap;

    fn test_product(id: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            price_cents,
            stock,
            max_discount_bps: None,
            discountable: true,
        }
    }

    fn policy() -> DiscountPolicy {
        let mut ceilings = HashMap::new();
        ceilings.insert("cashier".to_string(), 1000);
        DiscountPolicy::new(ceilings, 0)
    }

    #[test]
    fn test_empty_cart_blocked() {
        let blocks = validate_items_for_submit(&Cart::new(), &[], &policy(), "cashier");
        assert_eq!(blocks, vec![SubmitBlock::EmptyCart]);
    }

    #[test]
    fn test_clean_cart_passes() {
        let product = test_product("1", 10000, 5);
        let mut cart = Cart::new();
        cart.add_item(&product).unwrap();

        let blocks = validate_items_for_submit(&cart, &[product], &policy(), "cashier");
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_stock_depleted_since_add() {
        let product = test_product("1", 10000, 5);
        let mut cart = Cart::new();
        cart.add_item(&product).unwrap();
        cart.update_quantity("1", 4).unwrap();

        // Catalog refreshed meanwhile: only 2 left
        let mut current = product.clone();
        current.stock = 2;

        let blocks = validate_items_for_submit(&cart, &[current], &policy(), "cashier");
        assert_eq!(
            blocks,
            vec![SubmitBlock::StockExceeded {
                sku: "SKU-1".to_string(),
                available: 2,
                requested: 4,
            }]
        );
    }

    #[test]
    fn test_product_removed_from_catalog() {
        let product = test_product("1", 10000, 5);
        let mut cart = Cart::new();
        cart.add_item(&product).unwrap();

        let blocks = validate_items_for_submit(&cart, &[], &policy(), "cashier");
        assert_eq!(
            blocks,
            vec![SubmitBlock::ProductMissing {
                product_id: "1".to_string(),
            }]
        );
    }

    #[test]
    fn test_ceiling_tightened_since_discount_applied() {
        let product = test_product("1", 10000, 5);
        let mut cart = Cart::new();
        cart.add_item(&product).unwrap();
        cart.update_discount("1", Rate::from_bps(1000), &policy(), "cashier")
            .unwrap();

        // Product now caps discounts at 5%
        let mut current = product.clone();
        current.max_discount_bps = Some(500);

        let blocks = validate_items_for_submit(&cart, &[current], &policy(), "cashier");
        assert_eq!(
            blocks,
            vec![SubmitBlock::DiscountAboveCeiling {
                sku: "SKU-1".to_string(),
                applied_bps: 1000,
                ceiling_bps: 500,
            }]
        );
    }
}
