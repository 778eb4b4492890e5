//! Proof-of-work validation.

use rai_crypto::blake2b_256;
use rai_types::BlockHash;

/// Compute the work value for a (root, nonce) pair.
///
/// Blake2b-256 over the 8-byte little-endian nonce followed by the 32-byte
/// root; the first 8 digest bytes interpreted as a little-endian u64.
pub fn work_value(root: &BlockHash, nonce: u64) -> u64 {
    let mut input = [0u8; 40];
    input[0..8].copy_from_slice(&nonce.to_le_bytes());
    input[8..40].copy_from_slice(root.as_bytes());
    let hash = blake2b_256(&input);
    u64::from_le_bytes(hash[0..8].try_into().unwrap())
}

/// Whether a work nonce strictly exceeds the threshold for the given root.
///
/// A value equal to the threshold does not pass.
pub fn validate_work(root: &BlockHash, nonce: u64, threshold: u64) -> bool {
    work_value(root, nonce) > threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkPool;

    #[test]
    fn zero_threshold_accepts_any_nonzero_value() {
        let root = BlockHash::new([0x42; 32]);
        let nonce = (0u64..)
            .find(|candidate| work_value(&root, *candidate) > 0)
            .unwrap();
        assert!(validate_work(&root, nonce, 0));
    }

    #[test]
    fn max_threshold_rejects() {
        // Nothing exceeds u64::MAX.
        let root = BlockHash::new([0x42; 32]);
        assert!(!validate_work(&root, 12345, u64::MAX));
        assert!(!validate_work(&root, 0, u64::MAX));
    }

    #[test]
    fn threshold_boundary_is_strict() {
        let root = BlockHash::new([0x42; 32]);
        let nonce = 9;
        let value = work_value(&root, nonce);
        // Meeting the threshold exactly is not enough.
        assert!(!validate_work(&root, nonce, value));
        if value > 0 {
            assert!(validate_work(&root, nonce, value - 1));
        }
    }

    #[test]
    fn generated_work_validates() {
        let pool = WorkPool::new(0xFF00_0000_0000_0000);
        let root = BlockHash::new([0xDE; 32]);
        let nonce = pool.generate(&root).unwrap();
        assert!(validate_work(&root, nonce, 0xFF00_0000_0000_0000));
    }

    #[test]
    fn work_is_bound_to_root() {
        let pool = WorkPool::new(0xFF00_0000_0000_0000);
        let root_a = BlockHash::new([0x11; 32]);
        let root_b = BlockHash::new([0x22; 32]);
        let nonce = pool.generate(&root_a).unwrap();
        assert_ne!(work_value(&root_a, nonce), work_value(&root_b, nonce));
    }
}
