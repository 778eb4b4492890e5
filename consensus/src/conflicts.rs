//! The conflicts table: at most one live election per root.

use crate::election::{Confirmed, Election, VoteResult};
use crate::Vote;
use rai_ledger::Block;
use rai_types::{Account, Amount, BlockHash, Timestamp};
use std::collections::HashMap;
use std::sync::Mutex;

/// Seconds of vote silence before a live election is dropped.
pub const ELECTION_TIMEOUT_SECS: u64 = 60;

/// Root-keyed election table shared between the vote path and the timers.
pub struct Conflicts {
    supply: Amount,
    roots: Mutex<HashMap<BlockHash, Election>>,
}

impl Conflicts {
    pub fn new(supply: Amount) -> Self {
        Self {
            supply,
            roots: Mutex::new(HashMap::new()),
        }
    }

    /// Open an election on `root` seeded with the ledger's occupant.
    /// Returns false if one is already running.
    pub fn start(&self, root: BlockHash, incumbent: Block, now: Timestamp) -> bool {
        let mut roots = self.roots.lock().unwrap();
        if roots.contains_key(&root) {
            return false;
        }
        tracing::debug!(%root, incumbent = %incumbent.hash(), "election started");
        roots.insert(root, Election::new(root, incumbent, now));
        true
    }

    /// Route a verified vote to its election and re-check the threshold.
    ///
    /// Returns the confirmation outcome if this vote crossed it; the caller
    /// applies the winner to the ledger (rolling back a losing tip first).
    pub fn update<W>(&self, vote: &Vote, weight_of: W, now: Timestamp) -> Option<Confirmed>
    where
        W: Fn(&Account) -> Amount,
    {
        let root = vote.block.root();
        let mut roots = self.roots.lock().unwrap();
        let election = roots.get_mut(&root)?;
        match election.vote(vote, now) {
            VoteResult::Accepted | VoteResult::Updated => {
                election.try_confirm(weight_of, self.supply)
            }
            VoteResult::Replay | VoteResult::Ignored => None,
        }
    }

    /// Drop the election on `root`.
    pub fn stop(&self, root: &BlockHash) {
        self.roots.lock().unwrap().remove(root);
    }

    pub fn active(&self, root: &BlockHash) -> bool {
        self.roots.lock().unwrap().contains_key(root)
    }

    pub fn len(&self) -> usize {
        self.roots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.lock().unwrap().is_empty()
    }

    /// Provisional winners of all live elections, for periodic re-announcement.
    pub fn announcements(&self) -> Vec<Block> {
        self.roots
            .lock()
            .unwrap()
            .values()
            .filter(|election| !election.is_confirmed())
            .map(|election| election.last_winner().clone())
            .collect()
    }

    /// Remove elections with no vote traffic for `ELECTION_TIMEOUT_SECS`
    /// (and confirmed ones, whose flip has already been applied). The ledger
    /// tip stands as whatever the validator last accepted.
    pub fn purge(&self, now: Timestamp) -> Vec<BlockHash> {
        let mut roots = self.roots.lock().unwrap();
        let stale: Vec<BlockHash> = roots
            .iter()
            .filter(|(_, election)| {
                election.is_confirmed() || election.expired(ELECTION_TIMEOUT_SECS, now)
            })
            .map(|(root, _)| *root)
            .collect();
        for root in &stale {
            tracing::debug!(%root, "election removed");
            roots.remove(root);
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rai_crypto::generate_keypair;
    use rai_ledger::SendBlock;
    use rai_types::Signature;

    const SUPPLY: Amount = Amount::new(1000);

    fn block(balance: u128) -> Block {
        Block::Send(SendBlock {
            previous: BlockHash::new([1; 32]),
            destination: Account::new([2; 32]),
            balance: Amount::new(balance),
            signature: Signature::ZERO,
            work: 0,
        })
    }

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    #[test]
    fn one_election_per_root() {
        let conflicts = Conflicts::new(SUPPLY);
        let incumbent = block(10);
        assert!(conflicts.start(incumbent.root(), incumbent.clone(), ts(0)));
        assert!(!conflicts.start(incumbent.root(), incumbent.clone(), ts(1)));
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn vote_for_unknown_root_is_ignored() {
        let conflicts = Conflicts::new(SUPPLY);
        let keys = generate_keypair();
        let vote = Vote::new(&keys, 1, block(10));
        assert!(conflicts
            .update(&vote, |_| Amount::new(999), ts(1))
            .is_none());
    }

    #[test]
    fn majority_vote_confirms() {
        let conflicts = Conflicts::new(SUPPLY);
        let incumbent = block(10);
        conflicts.start(incumbent.root(), incumbent.clone(), ts(0));

        let keys = generate_keypair();
        let vote = Vote::new(&keys, 1, incumbent.clone());
        let confirmed = conflicts
            .update(&vote, |_| Amount::new(501), ts(1))
            .expect("confirmed");
        assert_eq!(confirmed.winner.hash(), incumbent.hash());
    }

    #[test]
    fn purge_drops_quiet_and_confirmed_elections() {
        let conflicts = Conflicts::new(SUPPLY);
        let quiet = block(10);
        conflicts.start(quiet.root(), quiet.clone(), ts(0));

        assert!(conflicts.purge(ts(10)).is_empty());
        let purged = conflicts.purge(ts(ELECTION_TIMEOUT_SECS));
        assert_eq!(purged, vec![quiet.root()]);
        assert!(conflicts.is_empty());
    }
}
