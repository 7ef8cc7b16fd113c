//! # Cart Model
//!
//! Owns the mutable list of sale line items and enforces per-item
//! invariants (quantity, price, discount bounds).
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Cart Model Operations                            │
//! │                                                                     │
//! │  UI Action               Operation               State Change       │
//! │  ─────────               ─────────               ────────────       │
//! │  Scan / click product ─► add_item() ───────────► merge or push line │
//! │  Edit quantity ────────► update_quantity() ────► qty (0 removes)    │
//! │  Edit price ───────────► update_unit_price() ──► price (warn below  │
//! │                                                   reference)        │
//! │  Edit discount ────────► update_discount() ────► clamp to ceiling   │
//! │  Remove line ──────────► remove_item()                              │
//! │  Cancel sale ──────────► clear()  (caller confirms first)           │
//! │                                                                     │
//! │  Every mutation leaves the cart immediately recomputable: there is  │
//! │  no partially-applied edit observable from outside.                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::{CartError, CartResult};
use crate::money::{Money, Rate};
use crate::types::Product;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in the in-progress sale.
///
/// ## Design Notes
/// - `product`: frozen snapshot of the catalog entry at add time. The
///   line keeps displaying consistent data even if the catalog refreshes.
/// - `unit_price_cents`: editable independently of the snapshot's
///   reference price (selling below reference is allowed but flagged).
///
/// ## Invariants
/// - `subtotal = quantity × unit_price`
/// - `discount_amount = round_cent(subtotal × discount%)`
/// - `total = subtotal − discount_amount`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// Product snapshot at the moment the line was created.
    pub product: Product,

    /// Quantity in the cart, always > 0.
    pub quantity: i64,

    /// Unit price in cents, starts at the product reference price.
    pub unit_price_cents: i64,

    /// Line discount in basis points, already clamped to its ceiling.
    pub discount_bps: u32,

    /// When this line was added.
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl SaleItem {
    /// Creates a new line from a product snapshot, quantity 1.
    pub fn from_product(product: &Product) -> Self {
        SaleItem {
            product: product.clone(),
            quantity: 1,
            unit_price_cents: product.price_cents,
            discount_bps: 0,
            added_at: Utc::now(),
        }
    }

    /// Line subtotal before discount (quantity × unit price).
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    /// Discount amount, rounded to the cent at this line.
    #[inline]
    pub fn discount_amount(&self) -> Money {
        self.subtotal().rate_amount(Rate::from_bps(self.discount_bps))
    }

    /// Line total after discount.
    #[inline]
    pub fn total(&self) -> Money {
        self.subtotal() - self.discount_amount()
    }

    /// Whether the edited unit price sits below the catalog reference.
    #[inline]
    pub fn below_reference_price(&self) -> bool {
        self.unit_price_cents < self.product.price_cents
    }
}

// =============================================================================
// Discount Policy
// =============================================================================

/// Injected table of role-based discount ceilings (role → bps).
///
/// Replaces inline role-name conditionals: the caller provides the table,
/// the cart only resolves ceilings against it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscountPolicy {
    /// Ceiling per role name, in basis points.
    ceilings: HashMap<String, u32>,

    /// Ceiling applied when the role is not in the table.
    default_bps: u32,
}

impl DiscountPolicy {
    pub fn new(ceilings: HashMap<String, u32>, default_bps: u32) -> Self {
        DiscountPolicy {
            ceilings,
            default_bps,
        }
    }

    /// Ceiling for a role, falling back to the default.
    pub fn ceiling_for(&self, role: &str) -> Rate {
        Rate::from_bps(*self.ceilings.get(role).unwrap_or(&self.default_bps))
    }

    /// Effective ceiling for a product under a role:
    /// `min(role_max, product_max ?? role_max)`, or zero when the product
    /// is not discountable at all.
    pub fn effective_ceiling(&self, role: &str, product: &Product) -> Rate {
        if !product.discountable {
            return Rate::zero();
        }
        let role_max = self.ceiling_for(role);
        match product.max_discount() {
            Some(product_max) => role_max.min(product_max),
            None => role_max,
        }
    }
}

// =============================================================================
// Price Edit Outcome
// =============================================================================

/// Result of a unit-price edit. A price below the catalog reference is
/// applied, but the caller must surface a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceEdit {
    Applied,
    AppliedBelowReference,
}

// =============================================================================
// Cart
// =============================================================================

/// The in-progress sale's item list.
///
/// ## Invariants
/// - Lines are unique by `product.id` (adding the same product merges)
/// - Quantity is always > 0 and never above the known stock
/// - Discounts never exceed their effective ceiling
/// - Maximum lines: [`MAX_CART_ITEMS`]; max quantity: [`MAX_ITEM_QUANTITY`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Lines in insertion order (order matters for display only).
    pub items: Vec<SaleItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Adds a product to the cart.
    ///
    /// ## Behavior
    /// - stock ≤ 0: rejected with [`CartError::OutOfStock`]
    /// - already present: quantity incremented, capped at stock
    /// - otherwise: a new line with quantity 1 and the reference price
    pub fn add_item(&mut self, product: &Product) -> CartResult<()> {
        if !product.in_stock() {
            return Err(CartError::OutOfStock {
                sku: product.sku.clone(),
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            // Cap at stock rather than erroring: repeated scans of the
            // same product are routine and should not interrupt the flow.
            let cap = item.product.stock.min(MAX_ITEM_QUANTITY);
            item.quantity = (item.quantity + 1).min(cap);
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CartError::CartFull {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(SaleItem::from_product(product));
        Ok(())
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - quantity ≤ 0: equivalent to [`Cart::remove_item`]
    /// - quantity > stock: rejected, line unchanged
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CartResult<()> {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product.id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.to_string()))?;

        if quantity > item.product.stock {
            return Err(CartError::InsufficientStock {
                sku: item.product.sku.clone(),
                available: item.product.stock,
                requested: quantity,
            });
        }

        item.quantity = quantity;
        Ok(())
    }

    /// Sets the unit price of a line.
    ///
    /// Negative prices are rejected. A price below the catalog reference
    /// is applied but reported as [`PriceEdit::AppliedBelowReference`] so
    /// the caller can warn the cashier.
    pub fn update_unit_price(&mut self, product_id: &str, cents: i64) -> CartResult<PriceEdit> {
        if cents < 0 {
            return Err(CartError::NegativePrice { cents });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product.id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.to_string()))?;

        item.unit_price_cents = cents;

        if item.below_reference_price() {
            Ok(PriceEdit::AppliedBelowReference)
        } else {
            Ok(PriceEdit::Applied)
        }
    }

    /// Sets the discount of a line, clamped into `[0, effective ceiling]`.
    ///
    /// Non-discountable products reject any positive request outright.
    /// Returns the discount actually applied.
    pub fn update_discount(
        &mut self,
        product_id: &str,
        requested: Rate,
        policy: &DiscountPolicy,
        role: &str,
    ) -> CartResult<Rate> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.product.id == product_id)
            .ok_or_else(|| CartError::NotInCart(product_id.to_string()))?;

        if !item.product.discountable && !requested.is_zero() {
            return Err(CartError::NotDiscountable {
                sku: item.product.sku.clone(),
            });
        }

        let ceiling = policy.effective_ceiling(role, &item.product);
        let applied = requested.min(ceiling);
        item.discount_bps = applied.bps();
        Ok(applied)
    }

    /// Removes a line by product id.
    pub fn remove_item(&mut self, product_id: &str) -> CartResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product.id != product_id);

        if self.items.len() == initial_len {
            Err(CartError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines. Destructive: callers must confirm with the user
    /// first and also reset payment state and the stored draft.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of lines in the cart.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Whether any line carries a positive discount. Drives the mandatory
    /// discount-reason rule during payment validation.
    pub fn has_discount(&self) -> bool {
        self.items.iter().any(|i| i.discount_bps > 0)
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
