//! Checksum sub-space: running XOR of stored block hashes.
//!
//! A cheap cross-node integrity probe: two stores holding the same block set
//! carry the same checksum regardless of insertion order. Keys are
//! (prefix | mask) so ranges of the hash space could checkpoint separately;
//! today only (0, 0) is written.

use crate::StoreError;
use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use rai_types::BlockHash;

/// Handle over the `checksum` database.
#[derive(Clone, Copy)]
pub struct ChecksumStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

fn encode_key(prefix: u64, mask: u8) -> [u8; 8] {
    debug_assert_eq!(prefix & 0xFF, 0);
    (prefix | mask as u64).to_be_bytes()
}

impl ChecksumStore {
    pub fn get(&self, txn: &RoTxn, prefix: u64, mask: u8) -> Result<BlockHash, StoreError> {
        match self.db.get(txn, &encode_key(prefix, mask))? {
            Some(bytes) => {
                let raw: [u8; 32] = bytes.try_into().map_err(|_| StoreError::Corrupt {
                    subspace: "checksum",
                    reason: "value is not 32 bytes".into(),
                })?;
                Ok(BlockHash::new(raw))
            }
            None => Ok(BlockHash::ZERO),
        }
    }

    pub fn put(
        &self,
        txn: &mut RwTxn,
        prefix: u64,
        mask: u8,
        value: &BlockHash,
    ) -> Result<(), StoreError> {
        self.db
            .put(txn, &encode_key(prefix, mask), value.as_bytes())?;
        Ok(())
    }

    pub fn del(&self, txn: &mut RwTxn, prefix: u64, mask: u8) -> Result<(), StoreError> {
        self.db.delete(txn, &encode_key(prefix, mask))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn missing_checksum_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let txn = store.begin_read().unwrap();
        assert_eq!(
            store.checksum.get(&txn, 0, 0).unwrap(),
            BlockHash::ZERO
        );
    }

    #[test]
    fn put_get_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let value = BlockHash::new([0x77; 32]);

        let mut txn = store.begin_write().unwrap();
        store.checksum.put(&mut txn, 0, 0, &value).unwrap();
        txn.commit().unwrap();

        let txn = store.begin_read().unwrap();
        assert_eq!(store.checksum.get(&txn, 0, 0).unwrap(), value);
    }
}
