//! Unit prices read from rendered cart markup.
//!
//! Prices use decimal arithmetic and serialize as decimal strings, which is
//! what the order API's decimal fields accept.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when reading a [`UnitPrice`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The price attribute is missing or blank.
    #[error("price is empty")]
    Empty,
    /// The text is not a decimal number.
    #[error("price is not a number: {0:?}")]
    Malformed(String),
    /// Zero and negative prices are never sold.
    #[error("price must be greater than zero (got {0})")]
    NotPositive(Decimal),
}

/// A strictly positive price for one unit of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct UnitPrice(Decimal);

impl UnitPrice {
    /// Wrap a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotPositive`] for zero or negative amounts.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive(amount));
        }
        Ok(Self(amount))
    }

    /// Parse a price from markup text such as `"120.00"` or `" 45.5 "`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is blank, not a decimal, or not positive.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount = Decimal::from_str(s).map_err(|_| PriceError::Malformed(s.to_owned()))?;
        Self::new(amount)
    }

    /// The amount in the currency's standard unit (e.g. euros, not cents).
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for UnitPrice {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<UnitPrice> for Decimal {
    fn from(price: UnitPrice) -> Self {
        price.0
    }
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive() {
        let price = UnitPrice::parse(" 120.50 ").unwrap();
        assert_eq!(price.amount(), Decimal::new(12050, 2));
        assert_eq!(price.to_string(), "120.50");
    }

    #[test]
    fn test_parse_rejects_zero_and_negative() {
        assert!(matches!(UnitPrice::parse("0"), Err(PriceError::NotPositive(_))));
        assert!(matches!(UnitPrice::parse("0.00"), Err(PriceError::NotPositive(_))));
        assert!(matches!(UnitPrice::parse("-5"), Err(PriceError::NotPositive(_))));
    }

    #[test]
    fn test_parse_rejects_blank_and_garbage() {
        assert_eq!(UnitPrice::parse("  "), Err(PriceError::Empty));
        assert!(matches!(UnitPrice::parse("€12"), Err(PriceError::Malformed(_))));
        assert!(matches!(UnitPrice::parse("NaN"), Err(PriceError::Malformed(_))));
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        let price = UnitPrice::parse("45.00").unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"45.00\"");
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<UnitPrice>("\"0.00\"").is_err());
        assert!(serde_json::from_str::<UnitPrice>("\"9.99\"").is_ok());
    }
}
