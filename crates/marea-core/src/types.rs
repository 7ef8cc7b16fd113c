//! # Domain Types
//!
//! Core domain types used throughout Marea POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌───────────────┐  ┌───────────────┐  ┌────────────────────────┐  │
//! │  │   Product     │  │   Payment     │  │  Commission parties    │  │
//! │  │  ───────────  │  │  ───────────  │  │  ────────────────────  │  │
//! │  │  id / sku     │  │  Cash         │  │  Agency   (rate)       │  │
//! │  │  price_cents  │  │  Card         │  │  Guide    (formula)    │  │
//! │  │  stock        │  │  Transfer     │  │  Employee (per-method) │  │
//! │  │  discountable │  │  Mixed        │  │                        │  │
//! │  └───────────────┘  └───────────────┘  └────────────────────────┘  │
//! │                                                                     │
//! │  SaleType::{Street, Guide}  — drives commission applicability       │
//! │  DiscountReason             — corporate list, required on discounts │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Read-only from the engine's point of view: the catalog is injected and
/// refreshed by the caller after a confirmed submission. Stock checks
/// against it are optimistic; exhaustion races resolve server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown to cashier and on the ticket.
    pub name: String,

    /// Reference price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Current known stock level.
    pub stock: i64,

    /// Per-product discount ceiling in basis points, if tighter than the
    /// role ceiling.
    pub max_discount_bps: Option<u32>,

    /// Whether this product accepts any discount at all.
    pub discountable: bool,
}

impl Product {
    /// Returns the reference price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the per-product discount ceiling, if any.
    #[inline]
    pub fn max_discount(&self) -> Option<Rate> {
        self.max_discount_bps.map(Rate::from_bps)
    }

    /// Checks whether there is any stock to sell.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

// =============================================================================
// Sale Type
// =============================================================================

/// How the sale was originated, which drives commission applicability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleType {
    /// Walk-in sale with no agency/guide involvement.
    Street,
    /// Sale attributed to a tourism agency and guide; eligible for
    /// agency/guide/employee commissions.
    Guide,
}

impl Default for SaleType {
    fn default() -> Self {
        SaleType::Street
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Tag identifying the payment method, without the associated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Mixed,
}

/// The chosen payment method together with its input fields.
///
/// Modeled as a tagged union so validation dispatches through exhaustive
/// pattern matching — there is no stringly-typed method branching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Payment {
    /// Physical cash. `received_cents` is `None` until the cashier types
    /// the tendered amount.
    Cash { received_cents: Option<i64> },

    /// Card payment on an external terminal; the voucher reference is
    /// mandatory.
    Card { reference: String },

    /// Bank transfer; the transfer reference is mandatory.
    Transfer { reference: String },

    /// Split tender across cash/card/transfer. The three sub-amounts must
    /// add up to the sale total (within one cent).
    Mixed {
        cash_cents: i64,
        card_cents: i64,
        transfer_cents: i64,
        card_reference: String,
        transfer_reference: String,
    },
}

impl Payment {
    /// Returns the method tag for this payment.
    pub fn method(&self) -> PaymentMethod {
        match self {
            Payment::Cash { .. } => PaymentMethod::Cash,
            Payment::Card { .. } => PaymentMethod::Card,
            Payment::Transfer { .. } => PaymentMethod::Transfer,
            Payment::Mixed { .. } => PaymentMethod::Mixed,
        }
    }

    /// Whether this tender counts as cash for commission-rate selection.
    /// Card, transfer and mixed tenders all take the card rate.
    #[inline]
    pub fn is_cash_tender(&self) -> bool {
        matches!(self, Payment::Cash { .. })
    }
}

impl Default for Payment {
    fn default() -> Self {
        Payment::Cash {
            received_cents: None,
        }
    }
}

// =============================================================================
// Discount Reason
// =============================================================================

/// Corporate reasons for granting a discount. Whenever any cart line
/// carries a positive discount, one of these must be selected before the
/// sale can be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountReason {
    Courtesy,
    Promotion,
    VolumePurchase,
    PriceAdjustment,
    ManagerAuthorization,
}

// =============================================================================
// Client
// =============================================================================

/// A lightweight reference to the client the sale is attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientRef {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Commission Parties
// =============================================================================

/// Commission formula variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionFormula {
    /// commission = rate% of the sale total.
    Direct,
    /// commission = rate% of the total after first deducting a discount
    /// percentage.
    DiscountPercentage,
}

/// A tourism agency attached to a guide sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Agency {
    pub id: String,
    pub name: String,
    /// Commission rate in basis points.
    pub commission_rate_bps: u32,
}

impl Agency {
    #[inline]
    pub fn commission_rate(&self) -> Rate {
        Rate::from_bps(self.commission_rate_bps)
    }
}

/// A tour guide attached to a guide sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Guide {
    pub id: String,
    pub name: String,
    pub formula: CommissionFormula,
    /// Commission rate in basis points.
    pub commission_rate_bps: u32,
    /// Discount deducted before the rate when the formula is
    /// DISCOUNT_PERCENTAGE.
    pub discount_bps: u32,
}

/// The employee closing the sale.
///
/// Street sales pay a card-rate or cash-rate depending on the tender;
/// guide sales pay a single general rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub formula: CommissionFormula,
    /// Street-sale rate when paid by card/transfer/mixed (bps).
    pub street_card_rate_bps: u32,
    /// Street-sale rate when paid in cash (bps).
    pub street_cash_rate_bps: u32,
    /// Guide-sale general rate (bps).
    pub guide_rate_bps: u32,
    /// Discount deducted before the rate when the formula is
    /// DISCOUNT_PERCENTAGE.
    pub discount_bps: u32,
}

// =============================================================================
// Completed Sale
// =============================================================================

/// A sale as confirmed by the backend after submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CompletedSale {
    pub id: String,
    pub receipt_number: Option<String>,
    pub sale_type: SaleType,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CompletedSale {
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

    #[test]
    fn test_payment_method_tags() {
        let cash = Payment::Cash {
            received_cents: Some(1000),
        };
        assert_eq!(cash.method(), PaymentMethod::Cash);
        assert!(cash.is_cash_tender());

        let card = Payment::Card {
            reference: "AUTH-1".into(),
        };
        assert_eq!(card.method(), PaymentMethod::Card);
        assert!(!card.is_cash_tender());

        let mixed = Payment::Mixed {
            cash_cents: 100,
            card_cents: 200,
            transfer_cents: 0,
            card_reference: "AUTH-2".into(),
            transfer_reference: String::new(),
        };
        assert_eq!(mixed.method(), PaymentMethod::Mixed);
        assert!(!mixed.is_cash_tender());
    }

    #[test]
    fn test_product_stock_helpers() {
        let mut product = Product {
            id: "p1".into(),
            sku: "TEQ-750".into(),
            name: "Tequila 750ml".into(),
            price_cents: 45000,
            stock: 3,
            max_discount_bps: Some(500),
            discountable: true,
        };
        assert!(product.in_stock());
        assert_eq!(product.max_discount(), Some(Rate::from_bps(500)));

        product.stock = 0;
        assert!(!product.in_stock());
    }

    #[test]
    fn test_sale_type_default_is_street() {
        assert_eq!(SaleType::default(), SaleType::Street);
    }

    #[test]
    fn test_payment_serde_tagging() {
        let payment = Payment::Transfer {
            reference: "SPEI-42".into(),
        };
        let json = serde_json::to_value(&payment).unwrap();
        assert_eq!(json["method"], "transfer");
        assert_eq!(json["reference"], "SPEI-42");
    }
}
