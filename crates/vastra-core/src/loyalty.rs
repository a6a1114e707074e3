//! # Loyalty
//!
//! Point accrual and redemption rules.
//!
//! ```text
//! earn:    1 point per ₹100 of sale total (floor)
//! redeem:  1 point = ₹1 off, minimum 100 points per redemption
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// Sale total (in paise) that earns one point.
pub const MINOR_UNITS_PER_POINT_EARNED: i64 = 10_000;

/// Discount (in paise) one redeemed point is worth.
pub const MINOR_UNITS_PER_POINT_REDEEMED: i64 = 100;

/// Smallest redemption the counter accepts.
pub const MIN_REDEMPTION_POINTS: i64 = 100;

/// Largest single redemption (₹1 crore).
pub const MAX_REDEMPTION_POINTS: i64 = 10_000_000;

/// Points earned for a sale total.
///
/// ## Example
/// ```rust
/// use vastra_core::loyalty::points_for_total;
///
/// assert_eq!(points_for_total(10_000), 1);
/// assert_eq!(points_for_total(19_999), 1);
/// assert_eq!(points_for_total(9_999), 0);
/// ```
pub fn points_for_total(total_cents: i64) -> i64 {
    if total_cents <= 0 {
        return 0;
    }
    total_cents / MINOR_UNITS_PER_POINT_EARNED
}

/// Discount value of `points`. Saturates instead of overflowing.
pub fn redemption_value(points: i64) -> Money {
    Money::from_cents(points.max(0).saturating_mul(MINOR_UNITS_PER_POINT_REDEEMED))
}

/// Checks a redemption request against the minimum and the balance.
pub fn check_redemption(customer: &str, balance: i64, requested: i64) -> CoreResult<()> {
    if requested < MIN_REDEMPTION_POINTS {
        return Err(CoreError::RedemptionBelowMinimum {
            min: MIN_REDEMPTION_POINTS,
            requested,
        });
    }

    if requested > balance {
        return Err(CoreError::InsufficientPoints {
            customer: customer.to_string(),
            available: balance,
            requested,
        });
    }

    Ok(())
}
