//! Decimal money amounts.
//!
//! All currency values coming off the wire are decimals, never binary
//! floats. Totals are owned by the backend; the arithmetic here exists for
//! display composition and consistency assertions, not for recomputing
//! anything the server already computed.

use std::fmt;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the tenant's currency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Zero in the tenant's currency.
    #[must_use]
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::new(s.parse().unwrap())
    }

    #[test]
    fn test_display_two_decimal_places() {
        assert_eq!(money("19.9").to_string(), "19.90");
        assert_eq!(money("0").to_string(), "0.00");
    }

    #[test]
    fn test_add() {
        assert_eq!(money("10.50") + money("4.25"), money("14.75"));
    }

    #[test]
    fn test_zero() {
        assert_eq!(Money::zero() + money("3.10"), money("3.10"));
    }
}
