//! Node errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] rai_store::StoreError),

    #[error(transparent)]
    Ledger(#[from] rai_ledger::LedgerError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bootstrap failed: {0}")]
    Bootstrap(String),
}
