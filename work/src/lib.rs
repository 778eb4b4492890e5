//! Anti-spam proof-of-work.
//!
//! Not mining. A small computational stamp over a block's *root* that makes
//! flooding the network expensive while staying free for legitimate use. The
//! root is `previous` for non-open blocks and the account key for open
//! blocks, so work can be precomputed before the block contents are known.
//!
//! Work is an admission control, never a consensus mechanism.

pub mod error;
pub mod pool;
pub mod validator;

pub use error::WorkError;
pub use pool::WorkPool;
pub use validator::{validate_work, work_value};
