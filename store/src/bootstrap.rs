//! Bootstrap sub-space: staging area for bulk-pull replies.
//!
//! Blocks stream in newest-to-oldest; they are staged here in arrival order
//! and replayed in reverse (oldest first) through the validator. The staging
//! area is cleared after each pull so a failed pull leaves no residue.

use crate::StoreError;
use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};

/// Handle over the `bootstrap` database.
#[derive(Clone, Copy)]
pub struct BootstrapStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl BootstrapStore {
    /// Append a serialized block in arrival order.
    pub fn push(&self, txn: &mut RwTxn, block_bytes: &[u8]) -> Result<(), StoreError> {
        let next = match self.db.last(txn)? {
            Some((key, _)) => {
                let raw: [u8; 8] = key.try_into().map_err(|_| StoreError::Corrupt {
                    subspace: "bootstrap",
                    reason: "key is not 8 bytes".into(),
                })?;
                u64::from_be_bytes(raw) + 1
            }
            None => 0,
        };
        self.db.put(txn, &next.to_be_bytes(), block_bytes)?;
        Ok(())
    }

    /// Staged blocks in reverse arrival order (oldest received last in the
    /// stream comes out first, which is replay order).
    pub fn drain_reverse(&self, txn: &mut RwTxn) -> Result<Vec<Vec<u8>>, StoreError> {
        let mut blocks = Vec::new();
        {
            for item in self.db.rev_iter(txn)? {
                let (_, value) = item?;
                blocks.push(value.to_vec());
            }
        }
        self.db.clear(txn)?;
        Ok(blocks)
    }

    pub fn count(&self, txn: &RoTxn) -> Result<u64, StoreError> {
        Ok(self.db.len(txn)?)
    }

    pub fn clear(&self, txn: &mut RwTxn) -> Result<(), StoreError> {
        self.db.clear(txn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn drain_reverses_arrival_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let mut txn = store.begin_write().unwrap();
        store.bootstrap.push(&mut txn, &[1]).unwrap();
        store.bootstrap.push(&mut txn, &[2]).unwrap();
        store.bootstrap.push(&mut txn, &[3]).unwrap();

        let blocks = store.bootstrap.drain_reverse(&mut txn).unwrap();
        assert_eq!(blocks, vec![vec![3], vec![2], vec![1]]);
        assert_eq!(store.bootstrap.count(&txn).unwrap(), 0);
        txn.commit().unwrap();
    }
}
