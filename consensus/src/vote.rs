//! A representative's vote on a block.

use rai_crypto::{blake2b_256_multi, sign_message, verify_message};
use rai_ledger::Block;
use rai_types::{Account, KeyPair, Signature};

/// A signed vote: `(account, signature, sequence, block)`.
///
/// The signature covers Blake2b-256(block hash ‖ sequence), so a vote for a
/// block at one sequence cannot be replayed at another. Sequences are
/// monotone per representative; an election rejects any vote whose sequence
/// does not exceed the one it already holds from that representative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vote {
    pub account: Account,
    pub signature: Signature,
    pub sequence: u64,
    pub block: Block,
}

impl Vote {
    /// Create and sign a vote with the representative's key.
    pub fn new(keys: &KeyPair, sequence: u64, block: Block) -> Self {
        let mut vote = Self {
            account: keys.account,
            signature: Signature::ZERO,
            sequence,
            block,
        };
        vote.signature = sign_message(&vote.digest(), &keys.private);
        vote
    }

    /// The signed digest: Blake2b-256(block hash ‖ sequence little-endian).
    pub fn digest(&self) -> [u8; 32] {
        blake2b_256_multi(&[
            self.block.hash().as_bytes(),
            &self.sequence.to_le_bytes(),
        ])
    }

    /// Whether the signature verifies under the voting account.
    pub fn validate(&self) -> bool {
        verify_message(&self.digest(), &self.signature, &self.account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rai_crypto::generate_keypair;
    use rai_ledger::{ChangeBlock, SendBlock};
    use rai_types::{Amount, BlockHash};

    fn sample_block(previous: u8) -> Block {
        Block::Send(SendBlock {
            previous: BlockHash::new([previous; 32]),
            destination: Account::new([2; 32]),
            balance: Amount::new(7),
            signature: Signature::ZERO,
            work: 0,
        })
    }

    #[test]
    fn signed_vote_validates() {
        let keys = generate_keypair();
        let vote = Vote::new(&keys, 1, sample_block(1));
        assert!(vote.validate());
    }

    #[test]
    fn tampered_sequence_fails_validation() {
        let keys = generate_keypair();
        let mut vote = Vote::new(&keys, 1, sample_block(1));
        vote.sequence = 2;
        assert!(!vote.validate());
    }

    #[test]
    fn tampered_block_fails_validation() {
        let keys = generate_keypair();
        let mut vote = Vote::new(&keys, 1, sample_block(1));
        vote.block = sample_block(9);
        assert!(!vote.validate());
    }

    #[test]
    fn digest_depends_on_block_and_sequence() {
        let keys = generate_keypair();
        let a = Vote::new(&keys, 1, sample_block(1));
        let b = Vote::new(&keys, 2, sample_block(1));
        let c = Vote::new(
            &keys,
            1,
            Block::Change(ChangeBlock {
                previous: BlockHash::new([1; 32]),
                representative: Account::new([3; 32]),
                signature: Signature::ZERO,
                work: 0,
            }),
        );
        assert_ne!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }
}
