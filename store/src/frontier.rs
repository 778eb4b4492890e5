//! Frontier sub-space: reverse index from head hash to owning account.
//!
//! Stored explicitly rather than derived so a crashed node can rebuild its
//! view of chain tips without walking every chain.

use crate::StoreError;
use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use rai_types::{Account, BlockHash};

/// Handle over the `frontiers` database.
#[derive(Clone, Copy)]
pub struct FrontierStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl FrontierStore {
    pub fn get(&self, txn: &RoTxn, hash: &BlockHash) -> Result<Option<Account>, StoreError> {
        match self.db.get(txn, hash.as_bytes())? {
            Some(bytes) => {
                let raw: [u8; 32] = bytes.try_into().map_err(|_| StoreError::Corrupt {
                    subspace: "frontiers",
                    reason: "account is not 32 bytes".into(),
                })?;
                Ok(Some(Account::new(raw)))
            }
            None => Ok(None),
        }
    }

    pub fn put(
        &self,
        txn: &mut RwTxn,
        hash: &BlockHash,
        account: &Account,
    ) -> Result<(), StoreError> {
        self.db.put(txn, hash.as_bytes(), account.as_bytes())?;
        Ok(())
    }

    pub fn del(&self, txn: &mut RwTxn, hash: &BlockHash) -> Result<(), StoreError> {
        self.db.delete(txn, hash.as_bytes())?;
        Ok(())
    }

    pub fn count(&self, txn: &RoTxn) -> Result<u64, StoreError> {
        Ok(self.db.len(txn)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn maps_head_to_account() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let head = BlockHash::new([1; 32]);
        let account = Account::new([2; 32]);

        let mut txn = store.begin_write().unwrap();
        store.frontiers.put(&mut txn, &head, &account).unwrap();
        txn.commit().unwrap();

        let txn = store.begin_read().unwrap();
        assert_eq!(store.frontiers.get(&txn, &head).unwrap(), Some(account));
        assert_eq!(
            store.frontiers.get(&txn, &BlockHash::new([9; 32])).unwrap(),
            None
        );
    }
}
