//! # Error Types
//!
//! Domain-specific error types for marea-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  marea-core errors (this file + payment.rs/validation.rs)          │
//! │  ├── CartError     - cart mutation failures                         │
//! │  ├── PaymentIssue  - payment field problems (collected, not thrown) │
//! │  └── SubmitBlock   - pre-submit revalidation failures               │
//! │                                                                     │
//! │  marea-engine errors (separate crate)                               │
//! │  └── EngineError   - network/storage/submission failures            │
//! │                                                                     │
//! │  Flow: CartError/SubmitBlock → EngineError → caller/UI              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, amounts, limits)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Cart Error
// =============================================================================

/// Cart mutation failures.
///
/// These are local validation errors: they are reported immediately, the
/// cart is left unchanged, and nothing is sent to the network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartError {
    /// Product has no stock at all; it cannot enter the cart.
    #[error("{sku} is out of stock")]
    OutOfStock { sku: String },

    /// Requested quantity exceeds the current known stock.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// The referenced line is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    /// Unit prices cannot be negative.
    #[error("Unit price cannot be negative ({cents} cents)")]
    NegativePrice { cents: i64 },

    /// Product does not accept discounts.
    #[error("{sku} does not allow discounts")]
    NotDiscountable { sku: String },

    /// Quantity exceeds the per-line cap.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// The cart already holds the maximum number of lines.
    #[error("Cart cannot have more than {max} lines")]
    CartFull { max: usize },
}

/// Convenience type alias for Results with CartError.
pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CartError::InsufficientStock {
            sku: "TEQ-750".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for TEQ-750: available 3, requested 5"
        );

        let err = CartError::NotDiscountable {
            sku: "GIFT-CARD".to_string(),
        };
        assert_eq!(err.to_string(), "GIFT-CARD does not allow discounts");
    }
}
