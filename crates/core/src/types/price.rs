//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices arrive as JSON numbers (`9.99`). They are converted to
//! [`Decimal`] once at the validation boundary so that cart totals are exact:
//! two units at `10` plus one at `5` is `25`, not `24.999999`.

use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A store price in US dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero, the total of an empty cart.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Convert a JSON number into a price.
    ///
    /// Returns `None` for NaN and infinities.
    #[must_use]
    pub fn from_f64(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        Decimal::try_from(amount).ok().map(Self)
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the price is strictly greater than zero.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Approximate float value, for clients that want a JSON number.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// `self + rhs`, or `None` past the largest representable amount.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `self × quantity`, or `None` past the largest representable amount.
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

// Saturating: the cart refuses mutations whose totals would not fit, so
// these only clamp for values built outside the cart.
impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self::Output {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f64_rejects_non_finite() {
        assert!(Price::from_f64(f64::NAN).is_none());
        assert!(Price::from_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn test_is_positive() {
        assert!(Price::from_f64(0.01).unwrap().is_positive());
        assert!(!Price::ZERO.is_positive());
        assert!(!Price::from_f64(-3.0).unwrap().is_positive());
    }

    #[test]
    fn test_sum_is_exact() {
        let prices = [Price::from_f64(0.1).unwrap(), Price::from_f64(0.2).unwrap()];
        let total: Price = prices.into_iter().sum();
        assert_eq!(total, Price::new(Decimal::new(3, 1)));
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let huge = Price::from_f64(1e20).unwrap();
        assert!(huge.checked_mul(4_000_000_000).is_none());
        assert!(Price::new(Decimal::MAX).checked_add(huge).is_none());
        assert_eq!(
            Price::from_f64(2.5).unwrap().checked_mul(4),
            Some(Price::from_f64(10.0).unwrap())
        );
    }

    #[test]
    fn test_operators_saturate_instead_of_panicking() {
        let huge = Price::from_f64(1e20).unwrap();
        assert_eq!(huge * 4_000_000_000, Price::new(Decimal::MAX));
        assert_eq!(Price::new(Decimal::MAX) + huge, Price::new(Decimal::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_f64(9.5).unwrap().display(), "$9.50");
        assert_eq!(Price::ZERO.to_string(), "$0.00");
    }
}
