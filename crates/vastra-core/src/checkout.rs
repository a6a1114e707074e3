//! # Checkout Pricing
//!
//! Turns cart lines plus the cashier's discount and a points redemption
//! into the figures stored on the sale header.
//!
//! ```text
//! subtotal  = Σ unit_price × qty           (GST inclusive)
//! tax       = Σ GST contained in each line (informational)
//! discount  = manual discount + redeemed points × ₹1
//! total     = subtotal − discount          (never negative)
//! earned    = total / ₹100                 (only with a customer)
//! ```

use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::loyalty::{self, MIN_REDEMPTION_POINTS};
use crate::validation::{validate_quantity, validate_redeem_points};

/// Priced sale, before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePricing {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// Discount typed in by the cashier.
    pub manual_discount_cents: i64,
    pub points_redeemed: i64,
    /// Manual discount plus the value of the redeemed points.
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl SalePricing {
    /// Points a customer earns on this sale.
    pub fn points_earned(&self) -> i64 {
        loyalty::points_for_total(self.total_cents)
    }
}

/// Prices a sale.
///
/// ## Errors
/// - `EmptyCart` when there are no lines
/// - `Validation` for a quantity < 1, or a negative discount or redemption
/// - `RedemptionBelowMinimum` for a non-zero redemption under the minimum
/// - `DiscountExceedsSubtotal` when the combined discount is larger than
///   the subtotal
///
/// ## Example
/// ```rust
/// use vastra_core::{price_sale, Product};
/// use vastra_core::cart::CartItem;
///
/// let mut jeans = Product::new("Slim Jeans", 199_900);
/// jeans.stock = 3;
/// let lines = vec![CartItem::from_product(&jeans, 1)];
///
/// let pricing = price_sale(&lines, 9_900, 100).unwrap();
/// assert_eq!(pricing.discount_cents, 19_900);
/// assert_eq!(pricing.total_cents, 180_000);
/// assert_eq!(pricing.points_earned(), 18);
/// ```
pub fn price_sale(
    lines: &[CartItem],
    discount_cents: i64,
    redeem_points: i64,
) -> CoreResult<SalePricing> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    for line in lines {
        validate_quantity(line.quantity)?;
    }

    if discount_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    validate_redeem_points(redeem_points)?;

    if redeem_points > 0 && redeem_points < MIN_REDEMPTION_POINTS {
        return Err(CoreError::RedemptionBelowMinimum {
            min: MIN_REDEMPTION_POINTS,
            requested: redeem_points,
        });
    }

    let subtotal_cents: i64 = lines.iter().map(|l| l.line_total_cents()).sum();
    let tax_cents: i64 = lines.iter().map(|l| l.tax_cents()).sum();
    let total_discount = discount_cents
        .checked_add(loyalty::redemption_value(redeem_points).cents())
        .unwrap_or(i64::MAX);

    if total_discount > subtotal_cents {
        return Err(CoreError::DiscountExceedsSubtotal {
            discount: total_discount,
            subtotal: subtotal_cents,
        });
    }

    Ok(SalePricing {
        subtotal_cents,
        tax_cents,
        manual_discount_cents: discount_cents,
        points_redeemed: redeem_points,
        discount_cents: total_discount,
        total_cents: subtotal_cents - total_discount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loyalty::MAX_REDEMPTION_POINTS;
    use crate::types::Product;
    use proptest::prelude::*;

    fn line(price_cents: i64, gst: i64, qty: i64) -> CartItem {
        let mut p = Product::new("Item", price_cents);
        p.gst_percent = gst;
        p.stock = 1_000;
        CartItem::from_product(&p, qty)
    }

    #[test]
    fn test_price_sale_basic() {
        let lines = vec![line(11_800, 18, 2), line(10_500, 5, 1)];
        let pricing = price_sale(&lines, 0, 0).unwrap();

        assert_eq!(pricing.subtotal_cents, 34_100);
        assert_eq!(pricing.tax_cents, 3_600 + 500);
        assert_eq!(pricing.discount_cents, 0);
        assert_eq!(pricing.total_cents, 34_100);
        assert_eq!(pricing.points_earned(), 3);
    }

    #[test]
    fn test_one_point_per_hundred_rupees() {
        let pricing = price_sale(&[line(10_000, 0, 1)], 0, 0).unwrap();
        assert_eq!(pricing.total_cents, 10_000);
        assert_eq!(pricing.points_earned(), 1);
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert!(matches!(price_sale(&[], 0, 0), Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert!(matches!(
            price_sale(&[line(1_000, 0, 0)], 0, 0),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_negative_discount_rejected() {
        assert!(price_sale(&[line(1_000, 0, 1)], -1, 0).is_err());
    }

    #[test]
    fn test_redemption_minimum() {
        assert!(matches!(
            price_sale(&[line(50_000, 0, 1)], 0, 50),
            Err(CoreError::RedemptionBelowMinimum { .. })
        ));
    }

    #[test]
    fn test_discount_cannot_exceed_subtotal() {
        assert!(matches!(
            price_sale(&[line(5_000, 0, 1)], 5_001, 0),
            Err(CoreError::DiscountExceedsSubtotal { .. })
        ));
        // 100 points = ₹100 on a ₹50 sale
        assert!(matches!(
            price_sale(&[line(5_000, 0, 1)], 0, 100),
            Err(CoreError::DiscountExceedsSubtotal { .. })
        ));

        let pricing = price_sale(&[line(5_000, 0, 1)], 5_000, 0).unwrap();
        assert_eq!(pricing.total_cents, 0);
        assert_eq!(pricing.points_earned(), 0);
    }

    #[test]
    fn test_huge_discount_or_points_rejected_without_overflow() {
        let lines = [line(10_000, 0, 1)];

        assert!(matches!(
            price_sale(&lines, i64::MAX, 100),
            Err(CoreError::DiscountExceedsSubtotal { .. })
        ));
        assert!(matches!(
            price_sale(&lines, i64::MAX, 0),
            Err(CoreError::DiscountExceedsSubtotal { .. })
        ));
        assert!(matches!(
            price_sale(&lines, 0, i64::MAX / 10),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(matches!(
            price_sale(&lines, 0, MAX_REDEMPTION_POINTS + 1),
            Err(CoreError::Validation(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_total_is_subtotal_minus_discount(
            price in 1i64..500_000,
            qty in 1i64..20,
            discount_share in 0i64..=100,
        ) {
            let lines = vec![line(price, 12, qty)];
            let subtotal = price * qty;
            let discount = subtotal * discount_share / 100;

            let pricing = price_sale(&lines, discount, 0).unwrap();
            prop_assert_eq!(pricing.subtotal_cents, subtotal);
            prop_assert_eq!(pricing.total_cents, subtotal - discount);
            prop_assert!(pricing.total_cents >= 0);
            prop_assert!(pricing.tax_cents <= subtotal);
        }
    }
}
