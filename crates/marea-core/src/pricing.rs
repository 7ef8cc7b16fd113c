//! # Pricing Engine
//!
//! Pure recomputation of sale totals from the cart and a tax
//! configuration, triggered after any cart mutation or tax toggle.
//!
//! ## Rounding policy
//! Round to the cent at each derivation step — per-item discount, then
//! tax — never once at the end. This keeps the totals consistent with
//! the per-line amounts the cashier sees on screen.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::money::{Money, Rate};

// =============================================================================
// Tax Configuration
// =============================================================================

/// Tax setup for the register. Tax applies to `(subtotal − discount)` and
/// can be disabled entirely (effective rate zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxConfig {
    pub enabled: bool,
    pub rate_bps: u32,
}

impl TaxConfig {
    /// Tax enabled at the given rate.
    pub const fn new(rate_bps: u32) -> Self {
        TaxConfig {
            enabled: true,
            rate_bps,
        }
    }

    /// Tax disabled.
    pub const fn disabled() -> Self {
        TaxConfig {
            enabled: false,
            rate_bps: 0,
        }
    }

    /// The rate actually applied: zero when disabled.
    pub fn effective_rate(&self) -> Rate {
        if self.enabled {
            Rate::from_bps(self.rate_bps)
        } else {
            Rate::zero()
        }
    }
}

impl Default for TaxConfig {
    fn default() -> Self {
        TaxConfig::disabled()
    }
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Derived totals of the in-progress sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl SaleTotals {
    /// Recomputes totals from the cart.
    ///
    /// `subtotal` and `discount` aggregate the already-rounded per-line
    /// amounts; tax is rounded on the taxable base; `total = taxable + tax`.
    pub fn compute(cart: &Cart, tax: &TaxConfig) -> Self {
        let subtotal: Money = cart
            .items
            .iter()
            .fold(Money::zero(), |acc, i| acc + i.subtotal());
        let discount: Money = cart
            .items
            .iter()
            .fold(Money::zero(), |acc, i| acc + i.discount_amount());

        let taxable = subtotal - discount;
        let tax_amount = taxable.rate_amount(tax.effective_rate());
        let total = taxable + tax_amount;

        SaleTotals {
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            tax_cents: tax_amount.cents(),
            total_cents: total.cents(),
        }
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::DiscountPolicy;
    use crate::types::Product;
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

    fn manager_policy() -> DiscountPolicy {
        let mut ceilings = HashMap::new();
        ceilings.insert("manager".to_string(), 2000);
        DiscountPolicy::new(ceilings, 0)
    }

    #[test]
    fn test_empty_cart_totals() {
        let totals = SaleTotals::compute(&Cart::new(), &TaxConfig::new(1600));
        assert_eq!(totals, SaleTotals::default());
    }

    /// End-to-end scenario: $100 × 2, 10% discount, 16% tax.
    #[test]
    fn test_discounted_taxed_sale() {
        let mut cart = Cart::new();
        let product = test_product("1", 10000, 5);
        cart.add_item(&product).unwrap();
        cart.update_quantity("1", 2).unwrap();
        cart.update_discount("1", Rate::from_bps(1000), &manager_policy(), "manager")
            .unwrap();

        let totals = SaleTotals::compute(&cart, &TaxConfig::new(1600));

        assert_eq!(totals.subtotal_cents, 20000); // $200.00
        assert_eq!(totals.discount_cents, 2000); // $20.00
        assert_eq!(totals.tax_cents, 2880); // 16% of $180.00
        assert_eq!(totals.total_cents, 20880); // $208.80
    }

    #[test]
    fn test_tax_disabled() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", 10000, 5)).unwrap();

        let totals = SaleTotals::compute(&cart, &TaxConfig::disabled());

        assert_eq!(totals.tax_cents, 0);
        assert_eq!(totals.total_cents, 10000);
    }

    /// Per-line rounding, not one final rounding: two lines whose
    /// discounts each round individually.
    #[test]
    fn test_per_line_discount_rounding() {
        let mut cart = Cart::new();
        // $1.25 with 10% discount: 12.5 cents → 13 cents per line
        cart.add_item(&test_product("1", 125, 10)).unwrap();
        cart.add_item(&test_product("2", 125, 10)).unwrap();
        cart.update_discount("1", Rate::from_bps(1000), &manager_policy(), "manager")
            .unwrap();
        cart.update_discount("2", Rate::from_bps(1000), &manager_policy(), "manager")
            .unwrap();

        let totals = SaleTotals::compute(&cart, &TaxConfig::disabled());

        // 13 + 13, not round($2.50 × 10%) = 25
        assert_eq!(totals.discount_cents, 26);
        assert_eq!(totals.total_cents, 250 - 26);
    }
}
