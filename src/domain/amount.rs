//! Arbitrary-precision integer amounts backed by bigdecimal.
//!
//! On-chain values are uint256 quantities, prices carry 30 decimals of fixed-point scale and
//! products such as `amount * price` exceed any machine integer. `Amount` keeps them exact
//! and persists them as a canonical base-10 string.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed-point scale used by the protocol's price feeds (10^30).
pub const PRICE_PRECISION_DECIMALS: u32 = 30;

/// Lossless integer amount.
///
/// Always held at scale 0; every constructor truncates towards zero.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(BigDecimal);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("invalid amount {0:?}")]
    Invalid(String),
    #[error("amount {0:?} is not an integer")]
    Fractional(String),
}

impl Amount {
    fn from_big(value: BigDecimal) -> Self {
        Amount(value.with_scale(0))
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Amount(BigDecimal::from(0))
    }

    /// The multiplicative identity (1).
    pub fn one() -> Self {
        Amount(BigDecimal::from(1))
    }

    /// `10^exp`.
    pub fn pow10(exp: u32) -> Self {
        Self::from_big(BigDecimal::new(1.into(), -i64::from(exp)))
    }

    /// Parse a base-10 integer string.
    ///
    /// # Errors
    /// Returns an error for malformed input or values with a fractional part.
    pub fn parse(s: &str) -> Result<Self, AmountParseError> {
        let parsed = BigDecimal::from_str(s.trim())
            .map_err(|_| AmountParseError::Invalid(s.to_string()))?;
        let truncated = parsed.with_scale(0);
        if truncated != parsed {
            return Err(AmountParseError::Fractional(s.to_string()));
        }
        Ok(Amount(truncated))
    }

    /// Canonical base-10 representation (no exponent, no fraction).
    pub fn to_canonical_string(&self) -> String {
        let (digits, _) = self.0.with_scale(0).into_bigint_and_exponent();
        digits.to_string()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == BigDecimal::from(0)
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        self.0 > BigDecimal::from(0)
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        self.0 < BigDecimal::from(0)
    }

    /// `self + delta`.
    pub fn increment(&self, delta: &Amount) -> Amount {
        Amount(&self.0 + &delta.0)
    }

    /// `self - delta`. Gauges may go below zero; the sign is kept.
    pub fn decrement(&self, delta: &Amount) -> Amount {
        Amount(&self.0 - &delta.0)
    }

    /// Integer division truncating towards zero; `None` when `rhs` is zero.
    pub fn checked_div(&self, rhs: &Amount) -> Option<Amount> {
        if rhs.is_zero() {
            return None;
        }
        let (numerator, _) = self.0.with_scale(0).into_bigint_and_exponent();
        let (denominator, _) = rhs.0.with_scale(0).into_bigint_and_exponent();
        Some(Amount(BigDecimal::new(numerator / denominator, 0)))
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(BigDecimal::from(value))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(BigDecimal::from(value))
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Amount {
    type Output = Amount;

    fn mul(self, rhs: Amount) -> Amount {
        Amount(self.0 * rhs.0)
    }
}

impl<'a> std::ops::Mul<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn mul(self, rhs: &'a Amount) -> Amount {
        Amount(&self.0 * &rhs.0)
    }
}

// uint256 values do not fit a JSON number, so amounts travel as strings.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Int(i64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Amount::parse(&s).map_err(serde::de::Error::custom),
            Repr::Int(n) => Ok(Amount::from(n)),
        }
    }
}
