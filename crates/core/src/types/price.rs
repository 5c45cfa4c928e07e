//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored in the shop's display currency (Chilean pesos). Amounts
//! coming from the remote catalog are converted before they reach this type.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative price.
///
/// ```
/// use gameverse_core::Price;
/// use rust_decimal::Decimal;
///
/// let a = Price::new(Decimal::new(100, 0)).unwrap();
/// let b: Price = "50.5".parse().unwrap();
/// assert_eq!((a + b).amount(), Decimal::new(1505, 1));
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the price is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Add two prices, returning `None` if the total overflows.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl Add for Price {
    type Output = Self;

    /// # Panics
    ///
    /// Panics if the total overflows; use [`Price::checked_add`] for
    /// untrusted amounts.
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0.round_dp(0))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-5, 1)),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let price = Price::new(-Decimal::ZERO).unwrap();
        assert!(price.is_zero());
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = Price::new(Decimal::MAX).unwrap();
        let one = Price::from_str("1").unwrap();
        assert_eq!(max.checked_add(one), None);
        assert_eq!(
            Price::from_str("1.5").unwrap().checked_add(one),
            Some(Price::from_str("2.5").unwrap())
        );
    }

    #[test]
    fn test_sum() {
        let prices = [Price::from_str("100").unwrap(), Price::from_str("50").unwrap()];
        let total: Price = prices.iter().sum();
        assert_eq!(total.amount(), Decimal::new(150, 0));
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let total: Price = Vec::<Price>::new().into_iter().sum();
        assert_eq!(total, Price::ZERO);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Price::from_str("twelve"),
            Err(PriceError::Invalid(_))
        ));
    }

    #[test]
    fn test_display_rounds_to_whole_pesos() {
        let price = Price::from_str("94905.0").unwrap();
        assert_eq!(price.to_string(), "$94905");
    }

    #[test]
    fn test_serde_rejects_negative() {
        let parsed: Result<Price, _> = serde_json::from_str("\"-1\"");
        assert!(parsed.is_err());
    }
}
