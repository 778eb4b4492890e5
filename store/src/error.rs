//! Store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("lmdb error: {0}")]
    Backend(#[from] heed::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store version {found} is not supported (expected {expected})")]
    InvalidVersion { found: u32, expected: u32 },

    #[error("corrupt record in {subspace}: {reason}")]
    Corrupt {
        subspace: &'static str,
        reason: String,
    },
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
