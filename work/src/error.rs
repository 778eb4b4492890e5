//! Work generation errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkError {
    #[error("work generation cancelled")]
    Cancelled,
}
