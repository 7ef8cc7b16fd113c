//! # Payment Validator
//!
//! Validates the chosen payment method's fields against the computed
//! total, producing a structured issue set (empty = valid).
//!
//! ## Validation rules per variant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  cash       received required; received < total blocks              │
//! │             (overpayment is change, valid)                          │
//! │  card       non-empty voucher reference required                    │
//! │  transfer   non-empty transfer reference required                   │
//! │  mixed      sub-amounts ≥ 0;                                        │
//! │             |cash + card + transfer − total| ≤ 1 cent;              │
//! │             card > 0 needs card ref, transfer > 0 needs transfer ref│
//! │  any        positive discount in cart ⇒ discount reason required    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Submission is blocked while the issue set is non-empty. Each issue
//! exposes a stable `field()` key so the UI can render inline errors.

use thiserror::Error;

use crate::money::Money;
use crate::types::{DiscountReason, Payment};

/// Tolerance for mixed-tender balancing: one cent absolute difference.
pub const MIXED_TOLERANCE_CENTS: i64 = 1;

// =============================================================================
// Payment Issues
// =============================================================================

/// A single payment-validation problem, keyed to an input field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentIssue {
    #[error("Cash received is required")]
    CashReceivedMissing,

    #[error("Cash received is {} short of the total", Money::from_cents(*short_cents))]
    CashInsufficient { short_cents: i64 },

    #[error("Card reference is required")]
    CardReferenceMissing,

    #[error("Transfer reference is required")]
    TransferReferenceMissing,

    #[error("Mixed tender amounts cannot be negative")]
    MixedAmountNegative,

    /// Positive difference: the tender is short by that amount.
    /// Negative difference: the tender exceeds the total.
    #[error("Mixed tender differs from the total by {}", Money::from_cents(*difference_cents))]
    MixedUnbalanced { difference_cents: i64 },

    #[error("Card reference is required for the card portion")]
    MixedCardReferenceMissing,

    #[error("Transfer reference is required for the transfer portion")]
    MixedTransferReferenceMissing,

    #[error("A discount reason must be selected")]
    DiscountReasonMissing,
}

impl PaymentIssue {
    /// Stable field key for inline UI display.
    pub fn field(&self) -> &'static str {
        match self {
            PaymentIssue::CashReceivedMissing | PaymentIssue::CashInsufficient { .. } => {
                "cashReceived"
            }
            PaymentIssue::CardReferenceMissing => "cardReference",
            PaymentIssue::TransferReferenceMissing => "transferReference",
            PaymentIssue::MixedAmountNegative | PaymentIssue::MixedUnbalanced { .. } => {
                "mixedAmounts"
            }
            PaymentIssue::MixedCardReferenceMissing => "mixedCardReference",
            PaymentIssue::MixedTransferReferenceMissing => "mixedTransferReference",
            PaymentIssue::DiscountReasonMissing => "discountReason",
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validates a payment against the sale total.
///
/// `cart_has_discount` and `discount_reason` feed the cross-cutting rule:
/// any positive line discount makes a corporate discount reason
/// mandatory, regardless of the payment method.
pub fn validate_payment(
    payment: &Payment,
    total: Money,
    cart_has_discount: bool,
    discount_reason: Option<DiscountReason>,
) -> Vec<PaymentIssue> {
    let mut issues = Vec::new();

    match payment {
        Payment::Cash { received_cents } => match received_cents {
            None => issues.push(PaymentIssue::CashReceivedMissing),
            Some(received) => {
                if *received < total.cents() {
                    issues.push(PaymentIssue::CashInsufficient {
                        short_cents: total.cents() - received,
                    });
                }
            }
        },

        Payment::Card { reference } => {
            if reference.trim().is_empty() {
                issues.push(PaymentIssue::CardReferenceMissing);
            }
        }

        Payment::Transfer { reference } => {
            if reference.trim().is_empty() {
                issues.push(PaymentIssue::TransferReferenceMissing);
            }
        }

        Payment::Mixed {
            cash_cents,
            card_cents,
            transfer_cents,
            card_reference,
            transfer_reference,
        } => {
            // Checked explicitly: a negative portion could otherwise
            // slip through a balancing sum and skip its reference rule.
            if *cash_cents < 0 || *card_cents < 0 || *transfer_cents < 0 {
                issues.push(PaymentIssue::MixedAmountNegative);
            }
            let tendered = cash_cents + card_cents + transfer_cents;
            let difference = total.cents() - tendered;
            if difference.abs() > MIXED_TOLERANCE_CENTS {
                issues.push(PaymentIssue::MixedUnbalanced {
                    difference_cents: difference,
                });
            }
            if *card_cents > 0 && card_reference.trim().is_empty() {
                issues.push(PaymentIssue::MixedCardReferenceMissing);
            }
            if *transfer_cents > 0 && transfer_reference.trim().is_empty() {
                issues.push(PaymentIssue::MixedTransferReferenceMissing);
            }
        }
    }

    if cart_has_discount && discount_reason.is_none() {
        issues.push(PaymentIssue::DiscountReasonMissing);
    }

    issues
}

/// Change due on a cash payment. Zero when the tender does not cover the
/// total (that case is blocked by validation anyway).
pub fn cash_change(received: Money, total: Money) -> Money {
    if received.cents() > total.cents() {
        received - total
    } else {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TOTAL: Money = Money::from_cents(20880); // $208.80

    #[test]
    fn test_cash_requires_received() {
        let payment = Payment::Cash {
            received_cents: None,
        };
        let issues = validate_payment(&payment, TOTAL, false, None);
        assert_eq!(issues, vec![PaymentIssue::CashReceivedMissing]);
        assert_eq!(issues[0].field(), "cashReceived");
    }

    #[test]
    fn test_cash_under_total_blocks() {
        let payment = Payment::Cash {
            received_cents: Some(20000),
        };
        let issues = validate_payment(&payment, TOTAL, false, None);
        assert_eq!(
            issues,
            vec![PaymentIssue::CashInsufficient { short_cents: 880 }]
        );
    }

    #[test]
    fn test_cash_exact_and_over_are_valid() {
        let exact = Payment::Cash {
            received_cents: Some(20880),
        };
        assert!(validate_payment(&exact, TOTAL, false, None).is_empty());
        assert_eq!(cash_change(Money::from_cents(20880), TOTAL), Money::zero());

        let over = Payment::Cash {
            received_cents: Some(25000),
        };
        assert!(validate_payment(&over, TOTAL, false, None).is_empty());
        assert_eq!(
            cash_change(Money::from_cents(25000), TOTAL).cents(),
            4120
        );
    }

    #[test]
    fn test_card_and_transfer_need_reference() {
        let card = Payment::Card {
            reference: "  ".into(),
        };
        assert_eq!(
            validate_payment(&card, TOTAL, false, None),
            vec![PaymentIssue::CardReferenceMissing]
        );

        let transfer = Payment::Transfer {
            reference: String::new(),
        };
        assert_eq!(
            validate_payment(&transfer, TOTAL, false, None),
            vec![PaymentIssue::TransferReferenceMissing]
        );
    }

    #[test]
    fn test_mixed_must_balance_within_a_cent() {
        let short = Payment::Mixed {
            cash_cents: 10000,
            card_cents: 10000,
            transfer_cents: 0,
            card_reference: "AUTH-1".into(),
            transfer_reference: String::new(),
        };
        let issues = validate_payment(&short, TOTAL, false, None);
        // Exact missing amount is reported
        assert_eq!(
            issues,
            vec![PaymentIssue::MixedUnbalanced {
                difference_cents: 880
            }]
        );

        let within_tolerance = Payment::Mixed {
            cash_cents: 10000,
            card_cents: 10879,
            transfer_cents: 0,
            card_reference: "AUTH-1".into(),
            transfer_reference: String::new(),
        };
        assert!(validate_payment(&within_tolerance, TOTAL, false, None).is_empty());
    }

    #[test]
    fn test_mixed_negative_portion_rejected_even_when_balanced() {
        // Sums to the total exactly, but the card portion is negative
        let payment = Payment::Mixed {
            cash_cents: 21880,
            card_cents: -1000,
            transfer_cents: 0,
            card_reference: String::new(),
            transfer_reference: String::new(),
        };
        let issues = validate_payment(&payment, TOTAL, false, None);
        assert_eq!(issues, vec![PaymentIssue::MixedAmountNegative]);
        assert_eq!(issues[0].field(), "mixedAmounts");
    }

    #[test]
    fn test_mixed_positive_portions_need_references() {
        let payment = Payment::Mixed {
            cash_cents: 80,
            card_cents: 10400,
            transfer_cents: 10400,
            card_reference: String::new(),
            transfer_reference: String::new(),
        };
        let issues = validate_payment(&payment, TOTAL, false, None);
        assert!(issues.contains(&PaymentIssue::MixedCardReferenceMissing));
        assert!(issues.contains(&PaymentIssue::MixedTransferReferenceMissing));
    }

    #[test]
    fn test_discount_reason_required_across_methods() {
        let payment = Payment::Card {
            reference: "AUTH-2".into(),
        };
        let issues = validate_payment(&payment, TOTAL, true, None);
        assert_eq!(issues, vec![PaymentIssue::DiscountReasonMissing]);
        assert_eq!(issues[0].field(), "discountReason");

        let issues = validate_payment(&payment, TOTAL, true, Some(DiscountReason::Promotion));
        assert!(issues.is_empty());
    }
}
