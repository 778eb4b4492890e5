//! Vote generation for a representative node.

use rai_consensus::Vote;
use rai_ledger::Block;
use rai_types::{Account, KeyPair};
use std::sync::atomic::{AtomicU64, Ordering};

/// Signs votes with the node's representative key.
///
/// Sequences are monotone across the node's lifetime; receivers reject any
/// vote that does not exceed the sequence they already hold from this
/// representative, so restarts should be rare enough not to matter within an
/// election's lifetime.
pub struct VoteGenerator {
    keys: KeyPair,
    sequence: AtomicU64,
}

impl VoteGenerator {
    pub fn new(keys: KeyPair) -> Self {
        Self {
            keys,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn account(&self) -> Account {
        self.keys.account
    }

    /// Sign a vote for `block` at the next sequence.
    pub fn vote(&self, block: Block) -> Vote {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Vote::new(&self.keys, sequence, block)
    }
}
