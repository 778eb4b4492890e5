//! Ledger errors.
//!
//! These are infrastructure failures (store I/O, corrupt records), not
//! validation outcomes; rejected blocks are reported through
//! [`crate::ProcessResult`], never as errors.

use rai_types::{Account, BlockHash};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] rai_store::StoreError),

    #[error("block {0} is not in the store")]
    BlockNotFound(BlockHash),

    #[error("account record missing for {0}")]
    AccountNotFound(Account),

    #[error("store does not hold this network's genesis block")]
    GenesisMismatch,

    #[error("rollback target {0} is not on any chain")]
    RollbackTargetMissing(BlockHash),

    #[error("corrupt ledger: {0}")]
    Corrupt(String),
}
