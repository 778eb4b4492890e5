//! Block-lattice ledger.
//!
//! Each account owns its own chain; chains are cross-linked only by
//! send/receive pairs. There is no global ordering; consensus (in
//! `rai-consensus`) is needed only when two blocks contest the same root.
//!
//! This crate owns the block model and codec, the genesis constants, the
//! validator (`process`), and its inverse (`rollback`).

pub mod block;
pub mod error;
pub mod genesis;
pub mod ledger;
pub mod processor;
pub mod rollback;

pub use block::{Block, BlockType, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock};
pub use error::LedgerError;
pub use genesis::{test_genesis_keypair, Genesis, TEST_GENESIS_KEY};
pub use ledger::Ledger;
pub use processor::ProcessResult;
