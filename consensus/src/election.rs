//! Per-root election state.
//!
//! An election tracks the latest vote from each representative and confirms
//! once the leading candidate's tally crosses the threshold: more than half
//! the supply when only one candidate was ever seen, or 15/16 of the supply
//! once the root is contested; flipping an established tip on a minority is
//! destabilizing, so the bar is much higher.

use crate::Vote;
use rai_ledger::Block;
use rai_types::{Account, Amount, BlockHash, Timestamp};
use std::collections::{HashMap, HashSet};

/// Outcome of feeding one vote into an election.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteResult {
    /// First vote seen from this representative.
    Accepted,
    /// Superseded the representative's earlier vote.
    Updated,
    /// Sequence did not exceed the one already held; dropped.
    Replay,
    /// Election already terminal; dropped.
    Ignored,
}

/// A confirmed winner and its tally at confirmation time.
#[derive(Clone, Debug)]
pub struct Confirmed {
    pub winner: Block,
    pub tally: Amount,
}

pub struct Election {
    root: BlockHash,
    /// The provisional tip: first block observed, then the confirmed winner.
    last_winner: Block,
    /// Latest (sequence, block) per representative.
    votes: HashMap<Account, (u64, Block)>,
    /// Every candidate hash ever seen on this root.
    candidates: HashSet<BlockHash>,
    confirmed: bool,
    pub started: Timestamp,
    pub last_vote: Timestamp,
}

impl Election {
    /// Open an election on `root` with the ledger's current occupant.
    pub fn new(root: BlockHash, incumbent: Block, now: Timestamp) -> Self {
        let mut candidates = HashSet::new();
        candidates.insert(incumbent.hash());
        Self {
            root,
            last_winner: incumbent,
            votes: HashMap::new(),
            candidates,
            confirmed: false,
            started: now,
            last_vote: now,
        }
    }

    pub fn root(&self) -> BlockHash {
        self.root
    }

    pub fn last_winner(&self) -> &Block {
        &self.last_winner
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Whether more than one candidate was ever seen.
    pub fn contested(&self) -> bool {
        self.candidates.len() >= 2
    }

    /// Record a vote. The caller has already verified the signature.
    pub fn vote(&mut self, vote: &Vote, now: Timestamp) -> VoteResult {
        if self.confirmed {
            return VoteResult::Ignored;
        }
        match self.votes.get(&vote.account) {
            Some((sequence, _)) if vote.sequence <= *sequence => VoteResult::Replay,
            Some(_) => {
                self.votes
                    .insert(vote.account, (vote.sequence, vote.block.clone()));
                self.candidates.insert(vote.block.hash());
                self.last_vote = now;
                VoteResult::Updated
            }
            None => {
                self.votes
                    .insert(vote.account, (vote.sequence, vote.block.clone()));
                self.candidates.insert(vote.block.hash());
                self.last_vote = now;
                VoteResult::Accepted
            }
        }
    }

    /// Sum each candidate's weight from the representatives' latest votes.
    pub fn tally<W>(&self, weight_of: W) -> HashMap<BlockHash, (Block, Amount)>
    where
        W: Fn(&Account) -> Amount,
    {
        let mut totals: HashMap<BlockHash, (Block, Amount)> = HashMap::new();
        for (representative, (_, block)) in &self.votes {
            let weight = weight_of(representative);
            let entry = totals
                .entry(block.hash())
                .or_insert_with(|| (block.clone(), Amount::ZERO));
            entry.1 = entry.1.saturating_add(weight);
        }
        totals
    }

    /// The leading candidate. Ties break on hash order so every node picks
    /// the same leader for the same vote set.
    pub fn winner<W>(&self, weight_of: W) -> Option<(Block, Amount)>
    where
        W: Fn(&Account) -> Amount,
    {
        self.tally(weight_of)
            .into_iter()
            .max_by_key(|(hash, (_, weight))| (*weight, *hash))
            .map(|(_, entry)| entry)
    }

    /// Check the threshold; confirm and return the winner if crossed.
    pub fn try_confirm<W>(&mut self, weight_of: W, supply: Amount) -> Option<Confirmed>
    where
        W: Fn(&Account) -> Amount,
    {
        if self.confirmed {
            return None;
        }
        let (winner, tally) = self.winner(weight_of)?;
        let threshold = if self.contested() {
            Amount::new((supply.raw() / 16) * 15)
        } else {
            Amount::new(supply.raw() / 2)
        };
        if tally > threshold {
            self.confirmed = true;
            self.last_winner = winner.clone();
            Some(Confirmed { winner, tally })
        } else {
            None
        }
    }

    /// Whether the election went quiet without confirming.
    pub fn expired(&self, timeout_secs: u64, now: Timestamp) -> bool {
        !self.confirmed && self.last_vote.elapsed_since(now) >= timeout_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rai_crypto::generate_keypair;
    use rai_ledger::SendBlock;
    use rai_types::{KeyPair, Signature};

    const SUPPLY: Amount = Amount::new(1600);

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

    fn weights(
        entries: &[(Account, u128)],
    ) -> impl Fn(&Account) -> Amount + '_ {
        move |account| {
            entries
                .iter()
                .find(|(a, _)| a == account)
                .map(|(_, w)| Amount::new(*w))
                .unwrap_or(Amount::ZERO)
        }
    }

    fn rep() -> KeyPair {
        generate_keypair()
    }

    #[test]
    fn uncontested_needs_half_supply() {
        let incumbent = block(10);
        let rep1 = rep();
        let mut election = Election::new(incumbent.root(), incumbent.clone(), ts(0));
        election.vote(&Vote::new(&rep1, 1, incumbent.clone()), ts(1));

        // Exactly half is not enough.
        let table = [(rep1.account, 800u128)];
        assert!(election.try_confirm(weights(&table), SUPPLY).is_none());

        let table = [(rep1.account, 801u128)];
        let confirmed = election.try_confirm(weights(&table), SUPPLY).unwrap();
        assert_eq!(confirmed.winner.hash(), incumbent.hash());
        assert!(election.is_confirmed());
    }

    #[test]
    fn contested_needs_fifteen_sixteenths() {
        let incumbent = block(10);
        let challenger = block(20);
        let rep1 = rep();
        let rep2 = rep();
        let mut election = Election::new(incumbent.root(), incumbent.clone(), ts(0));
        election.vote(&Vote::new(&rep1, 1, challenger.clone()), ts(1));
        election.vote(&Vote::new(&rep2, 1, incumbent.clone()), ts(2));
        assert!(election.contested());

        // 15/16 of 1600 = 1500; a bare majority no longer confirms.
        let table = [(rep1.account, 900u128), (rep2.account, 100u128)];
        assert!(election.try_confirm(weights(&table), SUPPLY).is_none());

        let table = [(rep1.account, 1501u128), (rep2.account, 50u128)];
        let confirmed = election.try_confirm(weights(&table), SUPPLY).unwrap();
        assert_eq!(confirmed.winner.hash(), challenger.hash());
    }

    #[test]
    fn lower_or_equal_sequence_is_replay() {
        let incumbent = block(10);
        let rep1 = rep();
        let mut election = Election::new(incumbent.root(), incumbent.clone(), ts(0));

        assert_eq!(
            election.vote(&Vote::new(&rep1, 5, incumbent.clone()), ts(1)),
            VoteResult::Accepted
        );
        assert_eq!(
            election.vote(&Vote::new(&rep1, 5, block(20)), ts(2)),
            VoteResult::Replay
        );
        assert_eq!(
            election.vote(&Vote::new(&rep1, 4, block(20)), ts(3)),
            VoteResult::Replay
        );
        assert_eq!(
            election.vote(&Vote::new(&rep1, 6, block(20)), ts(4)),
            VoteResult::Updated
        );
    }

    #[test]
    fn revote_moves_weight_between_candidates() {
        let incumbent = block(10);
        let challenger = block(20);
        let rep1 = rep();
        let mut election = Election::new(incumbent.root(), incumbent.clone(), ts(0));
        let table = [(rep1.account, 600u128)];

        election.vote(&Vote::new(&rep1, 1, incumbent.clone()), ts(1));
        let tally = election.tally(weights(&table));
        assert_eq!(tally[&incumbent.hash()].1, Amount::new(600));

        election.vote(&Vote::new(&rep1, 2, challenger.clone()), ts(2));
        let tally = election.tally(weights(&table));
        assert!(!tally.contains_key(&incumbent.hash()));
        assert_eq!(tally[&challenger.hash()].1, Amount::new(600));
    }

    #[test]
    fn winner_is_order_independent() {
        // Apply the same votes in two different orders; same winner.
        let a = block(10);
        let b = block(20);
        let reps: Vec<KeyPair> = (0..4).map(|_| rep()).collect();
        let table: Vec<(Account, u128)> = reps
            .iter()
            .enumerate()
            .map(|(i, keys)| (keys.account, 100 + i as u128))
            .collect();

        let votes = [
            Vote::new(&reps[0], 1, a.clone()),
            Vote::new(&reps[1], 1, b.clone()),
            Vote::new(&reps[2], 1, a.clone()),
            Vote::new(&reps[3], 1, b.clone()),
        ];

        let mut forward = Election::new(a.root(), a.clone(), ts(0));
        for vote in &votes {
            forward.vote(vote, ts(1));
        }
        let mut backward = Election::new(a.root(), a.clone(), ts(0));
        for vote in votes.iter().rev() {
            backward.vote(vote, ts(1));
        }

        let winner_forward = forward.winner(weights(&table)).unwrap();
        let winner_backward = backward.winner(weights(&table)).unwrap();
        assert_eq!(winner_forward.0.hash(), winner_backward.0.hash());
        assert_eq!(winner_forward.1, winner_backward.1);
    }

    #[test]
    fn never_confirms_twice() {
        // Once confirmed, later votes cannot produce a second winner.
        let incumbent = block(10);
        let rep1 = rep();
        let rep2 = rep();
        let mut election = Election::new(incumbent.root(), incumbent.clone(), ts(0));
        election.vote(&Vote::new(&rep1, 1, incumbent.clone()), ts(1));

        let table = [(rep1.account, 1000u128), (rep2.account, 1600u128)];
        assert!(election.try_confirm(weights(&table), SUPPLY).is_some());

        assert_eq!(
            election.vote(&Vote::new(&rep2, 1, block(20)), ts(2)),
            VoteResult::Ignored
        );
        assert!(election.try_confirm(weights(&table), SUPPLY).is_none());
    }

    #[test]
    fn quiet_election_expires() {
        let incumbent = block(10);
        let mut election = Election::new(incumbent.root(), incumbent.clone(), ts(0));
        assert!(!election.expired(60, ts(59)));
        assert!(election.expired(60, ts(60)));

        let rep1 = rep();
        election.vote(&Vote::new(&rep1, 1, incumbent), ts(60));
        assert!(!election.expired(60, ts(100)));
    }
}
