//! Monetary amounts in a fixed-point decimal representation

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// A non-negative USD amount.
///
/// Backed by [`Decimal`] so sub-cent remainders such as `0.005` compare
/// exactly. Deserializes from JSON numbers or strings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero dollars
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Create a new Amount, rejecting negative values
    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(Error::validation(
                "amount",
                format!("must not be negative, got {value}"),
            ));
        }
        Ok(Self(value.normalize()))
    }

    /// Whole cents, e.g. `from_cents(1)` is one US cent
    #[must_use]
    pub fn from_cents(cents: u64) -> Self {
        Self(Decimal::from(cents) / Decimal::ONE_HUNDRED)
    }

    /// Whole dollars
    #[must_use]
    pub fn from_dollars(dollars: u64) -> Self {
        Self(Decimal::from(dollars))
    }

    /// Get the inner decimal
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtract, returning `None` if the result would be negative
    #[must_use]
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        if other.0 > self.0 {
            None
        } else {
            Some(Amount(self.0 - other.0))
        }
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.scale() <= 2 {
            write!(f, "{:.2}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| Error::validation("amount", format!("'{s}' is not a decimal: {e}")))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
