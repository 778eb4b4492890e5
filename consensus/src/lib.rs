//! Fork resolution by representative voting.
//!
//! Every account delegates its balance to a representative; when two blocks
//! contest the same root, representatives vote and the weighted tally picks
//! the survivor. The ledger flip on confirmation (rollback of the losing
//! tip, apply of the winner) is performed by the node, which owns the write
//! transaction. This crate only reads weights.

pub mod conflicts;
pub mod election;
pub mod vote;

pub use conflicts::{Conflicts, ELECTION_TIMEOUT_SECS};
pub use election::{Confirmed, Election, VoteResult};
pub use vote::Vote;
