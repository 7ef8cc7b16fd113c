//! # marea-core: Pure Business Logic for Marea POS
//!
//! This crate is the **heart** of the Marea POS sale engine. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Marea POS Architecture                         │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                  UI shell (out of scope)                    │   │
//! │  │    Product search ─► Cart ─► Tender ─► Submit               │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                      │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │               marea-engine (workflow + ports)               │   │
//! │  │    Draft autosave, offline queue, submission protocol       │   │
//! │  └───────────────────────────┬─────────────────────────────────┘   │
//! │                              │                                      │
//! │  ┌───────────────────────────▼─────────────────────────────────┐   │
//! │  │               ★ marea-core (THIS CRATE) ★                   │   │
//! │  │                                                             │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌──────────────┐   │   │
//! │  │   │  money  │ │  cart   │ │  pricing  │ │  commission  │   │   │
//! │  │   │  Money  │ │  Cart   │ │ SaleTotals│ │  agency/guide│   │   │
//! │  │   │  Rate   │ │ SaleItem│ │ TaxConfig │ │  /employee   │   │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └──────────────┘   │   │
//! │  │   ┌─────────────────────┐ ┌─────────────────────────────┐   │   │
//! │  │   │  payment (validator)│ │  validation (submit gate)   │   │   │
//! │  │   └─────────────────────┘ └─────────────────────────────┘   │   │
//! │  │                                                             │   │
//! │  │   NO I/O • NO NETWORK • NO STORAGE • PURE FUNCTIONS         │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money and Rate types with integer arithmetic (no floats)
//! - [`types`] - Domain types (Product, Payment, commission parties, ...)
//! - [`cart`] - Cart model with per-line invariants
//! - [`pricing`] - Subtotal/discount/tax/total derivation
//! - [`commission`] - Agency/guide/employee commission calculators
//! - [`payment`] - Payment-method validation
//! - [`validation`] - Pre-submit revalidation gate
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic - same input = same output
//! 2. **No I/O**: storage and network access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64), all
//!    percentages are basis points (u32) - no floating point
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod commission;
pub mod error;
pub mod money;
pub mod payment;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, DiscountPolicy, PriceEdit, SaleItem};
pub use commission::CommissionBreakdown;
pub use error::{CartError, CartResult};
pub use money::{Money, Rate};
pub use payment::{cash_change, validate_payment, PaymentIssue};
pub use pricing::{SaleTotals, TaxConfig};
pub use types::*;
pub use validation::{validate_items_for_submit, SubmitBlock};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps transactions reviewable on one
/// screen. Can be made configurable per store in future versions.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in the cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
