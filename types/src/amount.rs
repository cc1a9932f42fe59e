//! Coin amounts.
//!
//! Amounts are represented as integers (u128) in the smallest unit of their
//! denomination to avoid floating-point errors. Arithmetic between coins of
//! different denominations is refused rather than coerced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An amount of a single denomination.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// A zero amount of `denom`.
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_denom(&self, denom: &str) -> bool {
        self.denom == denom
    }

    /// Same amount, different denomination.
    ///
    /// Used when a stake-denominated value is paid out in a category's
    /// reward denomination.
    pub fn with_denom(&self, denom: impl Into<String>) -> Self {
        Self::new(denom, self.amount)
    }

    /// `None` on overflow or denomination mismatch.
    pub fn checked_add(&self, other: &Coin) -> Option<Coin> {
        if self.denom != other.denom {
            return None;
        }
        self.amount
            .checked_add(other.amount)
            .map(|amount| Coin::new(self.denom.clone(), amount))
    }

    /// `None` on underflow or denomination mismatch.
    pub fn checked_sub(&self, other: &Coin) -> Option<Coin> {
        if self.denom != other.denom {
            return None;
        }
        self.amount
            .checked_sub(other.amount)
            .map(|amount| Coin::new(self.denom.clone(), amount))
    }

    pub fn checked_add_amount(&self, amount: u128) -> Option<Coin> {
        self.amount
            .checked_add(amount)
            .map(|amount| Coin::new(self.denom.clone(), amount))
    }

    pub fn saturating_sub_amount(&self, amount: u128) -> Coin {
        Coin::new(self.denom.clone(), self.amount.saturating_sub(amount))
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_same_denom() {
        let a = Coin::new("trusteak", 5);
        let b = Coin::new("trusteak", 7);
        assert_eq!(a.checked_add(&b), Some(Coin::new("trusteak", 12)));
    }

    #[test]
    fn mixed_denoms_are_refused() {
        let a = Coin::new("trusteak", 5);
        let b = Coin::new("crypto", 7);
        assert_eq!(a.checked_add(&b), None);
        assert_eq!(a.checked_sub(&b), None);
    }

    #[test]
    fn sub_underflow_is_none() {
        let a = Coin::new("trusteak", 5);
        let b = Coin::new("trusteak", 6);
        assert_eq!(a.checked_sub(&b), None);
    }

    #[test]
    fn display_concatenates_amount_and_denom() {
        assert_eq!(Coin::new("trusteak", 42).to_string(), "42trusteak");
    }
}
