//! # Commission Calculator
//!
//! Pure functions computing agency, guide and employee commission amounts
//! from the sale total, the commission formula variant and the sale type.
//!
//! ## Formula variants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  DIRECT               commission = total × rate%                    │
//! │                                                                     │
//! │  DISCOUNT_PERCENTAGE  commission = (total × (1 − discount%))        │
//! │                                    × rate%                          │
//! │                                                                     │
//! │  Example: total $1000, rate 10%, discount 20%                       │
//! │           → $1000 × 0.8 × 0.10 = $80                                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commissions are evaluated only at submission time, always against the
//! latest totals — never kept live during cart edits.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};
use crate::types::{Agency, CommissionFormula, Employee, Guide, Payment, SaleType};

// =============================================================================
// Formula Dispatch
// =============================================================================

/// Applies a commission formula. Zero total or zero rate short-circuits
/// to zero.
fn formula_amount(total: Money, formula: CommissionFormula, rate: Rate, discount: Rate) -> Money {
    if !total.is_positive() || rate.is_zero() {
        return Money::zero();
    }

    let base = match formula {
        CommissionFormula::Direct => total,
        CommissionFormula::DiscountPercentage => total.less_rate(discount),
    };

    base.rate_amount(rate)
}

// =============================================================================
// Per-Party Commissions
// =============================================================================

/// Agency commission: `rate%` of the total. Applies only to guide sales
/// with an agency attached.
pub fn agency_commission(total: Money, sale_type: SaleType, agency: Option<&Agency>) -> Money {
    match (sale_type, agency) {
        (SaleType::Guide, Some(agency)) => formula_amount(
            total,
            CommissionFormula::Direct,
            agency.commission_rate(),
            Rate::zero(),
        ),
        _ => Money::zero(),
    }
}

/// Guide commission, dispatched on the guide's formula. Applies only to
/// guide sales with a guide attached.
pub fn guide_commission(total: Money, sale_type: SaleType, guide: Option<&Guide>) -> Money {
    match (sale_type, guide) {
        (SaleType::Guide, Some(guide)) => formula_amount(
            total,
            guide.formula,
            Rate::from_bps(guide.commission_rate_bps),
            Rate::from_bps(guide.discount_bps),
        ),
        _ => Money::zero(),
    }
}

/// Employee commission.
///
/// Rate selection depends on the sale type: street sales pick the card
/// rate or the cash rate from the tender (a zero rate yields zero);
/// guide sales use the general guide rate. The formula dispatch is the
/// same as for guides, with the employee's own discount percentage.
pub fn employee_commission(
    total: Money,
    sale_type: SaleType,
    payment: &Payment,
    employee: Option<&Employee>,
) -> Money {
    let Some(employee) = employee else {
        return Money::zero();
    };

    let rate_bps = match sale_type {
        SaleType::Street => {
            if payment.is_cash_tender() {
                employee.street_cash_rate_bps
            } else {
                employee.street_card_rate_bps
            }
        }
        SaleType::Guide => employee.guide_rate_bps,
    };

    formula_amount(
        total,
        employee.formula,
        Rate::from_bps(rate_bps),
        Rate::from_bps(employee.discount_bps),
    )
}

// =============================================================================
// Breakdown
// =============================================================================

/// All three commission amounts for a sale, computed immediately before
/// submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommissionBreakdown {
    pub agency_cents: i64,
    pub guide_cents: i64,
    pub employee_cents: i64,
}

impl CommissionBreakdown {
    pub fn compute(
        total: Money,
        sale_type: SaleType,
        payment: &Payment,
        agency: Option<&Agency>,
        guide: Option<&Guide>,
        employee: Option<&Employee>,
    ) -> Self {
        CommissionBreakdown {
            agency_cents: agency_commission(total, sale_type, agency).cents(),
            guide_cents: guide_commission(total, sale_type, guide).cents(),
            employee_cents: employee_commission(total, sale_type, payment, employee).cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
