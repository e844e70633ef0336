//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Values are normalized on construction, so the canonical string form has no
//! trailing zeros, no scientific notation, and at most eight fractional
//! digits.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of fractional digits accepted on the boundary.
pub const MAX_SCALE: u32 = 8;

/// Errors constructing a `Price` or `Quantity` from a raw decimal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericError {
    #[error("value must be strictly positive")]
    NotPositive,

    #[error("value must not be negative")]
    Negative,

    #[error("value has more than 8 fractional digits")]
    TooPrecise,

    #[error("malformed decimal literal")]
    Malformed,
}

/// A strictly positive price with at most eight fractional digits.
///
/// Normalized on construction so comparisons and the serialized string form
/// are canonical.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Validate a raw decimal as a price.
    ///
    /// Fails if the value is zero or negative, or carries more than
    /// [`MAX_SCALE`] fractional digits after trailing zeros are stripped.
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value.is_zero() || value.is_sign_negative() {
            return Err(NumericError::NotPositive);
        }
        let normalized = value.normalize();
        if normalized.scale() > MAX_SCALE {
            return Err(NumericError::TooPrecise);
        }
        Ok(Self(normalized))
    }

    /// Construct from an integer price.
    ///
    /// # Panics
    /// Panics on zero (prices are strictly positive).
    pub fn from_u64(value: u64) -> Self {
        assert!(value > 0, "price must be strictly positive");
        Self(Decimal::from(value))
    }

    /// Get the inner decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Price {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str_exact(s).map_err(|_| NumericError::Malformed)?;
        Self::try_new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative quantity with at most eight fractional digits.
///
/// Zero is a valid quantity for aggregates (an emptied level); order
/// submission additionally requires strictly positive, which the engine
/// checks before accepting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// The zero quantity.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Validate a raw decimal as a quantity.
    pub fn try_new(value: Decimal) -> Result<Self, NumericError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(NumericError::Negative);
        }
        let normalized = value.normalize();
        if normalized.scale() > MAX_SCALE {
            return Err(NumericError::TooPrecise);
        }
        Ok(Self(normalized))
    }

    /// Get the inner decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Exact zero test on the underlying decimal.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Exact subtraction; `None` if `other` exceeds `self`.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        let diff = self.0 - other.0;
        if diff.is_sign_negative() && !diff.is_zero() {
            None
        } else {
            Some(Self(diff.normalize()))
        }
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, other: Self) -> Self {
        Self((self.0 + other.0).normalize())
    }
}

impl FromStr for Quantity {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str_exact(s).map_err(|_| NumericError::Malformed)?;
        Self::try_new(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
