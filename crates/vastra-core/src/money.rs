//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer paise                                            │
//! │    Every price, tax and total is an i64 count of minor units.          │
//! │    ₹1,299.00 is stored as 129900.                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## GST-Inclusive Prices
//! Shelf prices in the store already contain GST. The tax shown on the
//! invoice is the part of the price that is GST:
//!
//! ```text
//! tax = price × gst% / (100 + gst%)
//! ```
//!
//! ## Usage
//! ```rust
//! use vastra_core::money::Money;
//!
//! let price = Money::from_cents(129_900); // ₹1,299.00
//! let doubled = price * 2i64;             // ₹2,598.00
//! let total = price + Money::from_cents(500);
//! assert_eq!(total.cents(), 130_400);
//! assert_eq!(doubled.to_string(), "₹2598.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paise for INR).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for discounts and reversals
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

/// Currency symbol used by `Display`.
pub const CURRENCY_SYMBOL: &str = "₹";

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use vastra_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // ₹10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (rupee) portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (paise) portion, always 0-99.
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Extracts the GST contained in a GST-inclusive amount.
    ///
    /// Rounds half up to the nearest paisa; negative amounts round
    /// symmetrically so a reversal cancels the original exactly.
    ///
    /// ## Implementation
    /// Integer math in i128: `(2·amount·gst + (100+gst)) / (2·(100+gst))`
    ///
    /// ## Example
    /// ```rust
    /// use vastra_core::money::Money;
    ///
    /// // ₹105.00 at 5% GST contains ₹5.00 of tax
    /// assert_eq!(Money::from_cents(10_500).inclusive_tax(5).cents(), 500);
    /// // ₹999.00 at 12% → 107.0357… → ₹107.04
    /// assert_eq!(Money::from_cents(99_900).inclusive_tax(12).cents(), 10_704);
    /// ```
    pub fn inclusive_tax(&self, gst_percent: i64) -> Money {
        if gst_percent <= 0 {
            return Money::zero();
        }

        let divisor = 100 + gst_percent as i128;
        let amount = (self.0 as i128).abs();
        let tax = (2 * amount * gst_percent as i128 + divisor) / (2 * divisor);

        if self.0 < 0 {
            Money::from_cents(-(tax as i64))
        } else {
            Money::from_cents(tax as i64)
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use vastra_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(49_900);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 149_700);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Formats the amount without a currency symbol (`1299.00`).
    ///
    /// Used for receipt columns where the symbol would waste width.
    pub fn format_amount(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}{}.{:02}",
            sign,
            CURRENCY_SYMBOL,
            self.major().abs(),
            self.minor_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "₹10.99");
        assert_eq!(Money::from_cents(500).to_string(), "₹5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-₹5.50");
        assert_eq!(Money::from_cents(0).to_string(), "₹0.00");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(Money::from_cents(129_900).format_amount(), "1299.00");
        assert_eq!(Money::from_cents(-5).format_amount(), "-0.05");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3i64).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_inclusive_tax_exact() {
        // ₹118.00 at 18% → ₹18.00
        assert_eq!(Money::from_cents(11_800).inclusive_tax(18).cents(), 1_800);
        // ₹112.00 at 12% → ₹12.00
        assert_eq!(Money::from_cents(11_200).inclusive_tax(12).cents(), 1_200);
    }

    #[test]
    fn test_inclusive_tax_rounding() {
        // 1000 × 5 / 105 = 47.619… → 48
        assert_eq!(Money::from_cents(1_000).inclusive_tax(5).cents(), 48);
        // 100 × 12 / 112 = 10.714… → 11
        assert_eq!(Money::from_cents(100).inclusive_tax(12).cents(), 11);
    }

    #[test]
    fn test_inclusive_tax_zero_rate() {
        assert_eq!(Money::from_cents(99_900).inclusive_tax(0).cents(), 0);
    }

    #[test]
    fn test_inclusive_tax_negative_is_symmetric() {
        let forward = Money::from_cents(1_000).inclusive_tax(5);
        let reverse = Money::from_cents(-1_000).inclusive_tax(5);
        assert_eq!(forward.cents(), -reverse.cents());
    }

    #[test]
    fn test_zero_and_sum() {
        assert_eq!(Money::zero().cents(), 0);
        let total: Money = [100, 250, -50].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 300);
    }

    proptest! {
        #[test]
        fn prop_inclusive_tax_never_exceeds_amount(amount in 0i64..10_000_000, gst in 0i64..=100) {
            let tax = Money::from_cents(amount).inclusive_tax(gst);
            prop_assert!(tax.cents() >= 0);
            prop_assert!(tax.cents() <= amount);
        }
    }
}
