//! Balance and weight amounts.
//!
//! Amounts are raw 128-bit integers. The total supply is fixed at genesis;
//! there is no issuance schedule and no fee market.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// The total supply, minted entirely in the genesis open block.
pub const GENESIS_AMOUNT: Amount = Amount(u128::MAX);

/// A 128-bit amount of raw currency units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn to_le_bytes(self) -> [u8; 16] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_le_bytes(bytes))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_amount_is_max() {
        assert_eq!(GENESIS_AMOUNT.raw(), u128::MAX);
        assert_eq!(
            GENESIS_AMOUNT.raw(),
            340282366920938463463374607431768211455
        );
    }

    #[test]
    fn checked_sub_underflow() {
        assert_eq!(Amount::new(1).checked_sub(Amount::new(2)), None);
        assert_eq!(
            Amount::new(5).checked_sub(Amount::new(2)),
            Some(Amount::new(3))
        );
    }

    #[test]
    fn le_bytes_round_trip() {
        let amount = Amount::new(0x0102_0304_0506_0708_090A_0B0C_0D0E_0F10);
        assert_eq!(Amount::from_le_bytes(amount.to_le_bytes()), amount);
    }
}
