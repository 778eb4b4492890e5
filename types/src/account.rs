//! Account type: a public key that names its own chain.

use crate::BlockHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte Ed25519 public key identifying an account.
///
/// Every account owns its own block chain; the key is the chain's name and
/// the root slot of the account's open block. The human-facing base-32
/// encoding lives in `rai-crypto`; on the wire an account is always the raw
/// 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Account(pub [u8; 32]);

impl Account {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Reinterpret the public key as a block hash (the root of an open block).
    pub fn as_root(&self) -> BlockHash {
        BlockHash(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl From<BlockHash> for Account {
    fn from(hash: BlockHash) -> Self {
        Self(hash.0)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_preserves_bytes() {
        let account = Account::new([7; 32]);
        assert_eq!(account.as_root().as_bytes(), account.as_bytes());
    }

    #[test]
    fn hex_round_trip() {
        let account = Account::new([0xE8; 32]);
        assert_eq!(Account::from_hex(&account.to_string()), Some(account));
    }
}
