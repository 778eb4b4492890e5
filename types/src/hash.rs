//! Block hash type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte Blake2b-256 block digest.
///
/// Also doubles as the *root* of a block: the `previous` hash for non-open
/// blocks, or the account public key reinterpreted as a hash for open blocks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
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

    /// XOR-combine two hashes. Used by the ledger checksum.
    pub fn xor(&self, other: &BlockHash) -> BlockHash {
        let mut out = [0u8; 32];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }
        BlockHash(out)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for BlockHash {
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
    fn xor_is_self_inverse() {
        let a = BlockHash::new([0xAB; 32]);
        let b = BlockHash::new([0x13; 32]);
        assert_eq!(a.xor(&b).xor(&b), a);
        assert_eq!(a.xor(&a), BlockHash::ZERO);
    }

    #[test]
    fn hex_round_trip() {
        let h = BlockHash::new([0x5C; 32]);
        let s = h.to_string();
        assert_eq!(BlockHash::from_hex(&s), Some(h));
    }

    #[test]
    fn zero_is_zero() {
        assert!(BlockHash::ZERO.is_zero());
        assert!(!BlockHash::new([1; 32]).is_zero());
    }
}
