//! Block sub-space: serialized blocks keyed by hash.
//!
//! The store holds opaque tagged block bytes; the ledger crate owns the
//! codec. Keeping bytes here keeps the store below the block model in the
//! dependency graph.

use crate::StoreError;
use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use rai_types::BlockHash;

/// Handle over the `blocks` database.
#[derive(Clone, Copy)]
pub struct BlockStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl BlockStore {
    pub fn get(&self, txn: &RoTxn, hash: &BlockHash) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(txn, hash.as_bytes())?.map(|b| b.to_vec()))
    }

    pub fn put(&self, txn: &mut RwTxn, hash: &BlockHash, bytes: &[u8]) -> Result<(), StoreError> {
        self.db.put(txn, hash.as_bytes(), bytes)?;
        Ok(())
    }

    pub fn del(&self, txn: &mut RwTxn, hash: &BlockHash) -> Result<(), StoreError> {
        self.db.delete(txn, hash.as_bytes())?;
        Ok(())
    }

    pub fn exists(&self, txn: &RoTxn, hash: &BlockHash) -> Result<bool, StoreError> {
        Ok(self.db.get(txn, hash.as_bytes())?.is_some())
    }

    pub fn count(&self, txn: &RoTxn) -> Result<u64, StoreError> {
        Ok(self.db.len(txn)?)
    }
}
