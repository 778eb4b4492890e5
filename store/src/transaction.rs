//! Transaction guards.
//!
//! Every store access goes through a transaction. Multiple read transactions
//! may coexist; a write transaction is exclusive. A committed write is
//! visible to every subsequently opened read transaction. Dropping a write
//! guard without calling [`WriteTransaction::commit`] aborts it, so failed
//! operations leave the store untouched.

use crate::StoreError;
use heed::{RoTxn, RwTxn};
use std::ops::{Deref, DerefMut};

/// A read-only transaction guard.
pub struct ReadTransaction<'env>(pub(crate) RoTxn<'env>);

impl<'env> Deref for ReadTransaction<'env> {
    type Target = RoTxn<'env>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// An exclusive write transaction guard.
pub struct WriteTransaction<'env>(pub(crate) RwTxn<'env>);

impl<'env> WriteTransaction<'env> {
    /// Commit all writes performed under this guard.
    pub fn commit(self) -> Result<(), StoreError> {
        self.0.commit()?;
        Ok(())
    }

    /// Explicitly discard all writes (dropping the guard does the same).
    pub fn abort(self) {
        self.0.abort();
    }
}

impl<'env> Deref for WriteTransaction<'env> {
    type Target = RwTxn<'env>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'env> DerefMut for WriteTransaction<'env> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
