//! Pending sub-space: sends awaiting receipt.
//!
//! Keyed by (destination account, send hash) so all pending entries for an
//! account are adjacent in key order. An entry is deleted when the matching
//! receive or open is applied and recreated if that block is rolled back.

use crate::StoreError;
use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use rai_types::{Account, Amount, BlockHash};
use serde::{Deserialize, Serialize};

/// Key of a pending entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingKey {
    pub destination: Account,
    pub send_hash: BlockHash,
}

impl PendingKey {
    pub fn new(destination: Account, send_hash: BlockHash) -> Self {
        Self {
            destination,
            send_hash,
        }
    }

    fn encode(&self) -> [u8; 64] {
        let mut key = [0u8; 64];
        key[..32].copy_from_slice(self.destination.as_bytes());
        key[32..].copy_from_slice(self.send_hash.as_bytes());
        key
    }
}

/// Value of a pending entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInfo {
    /// The account that sent the funds.
    pub source: Account,
    /// prev_balance(send) − send.balance.
    pub amount: Amount,
}

/// Handle over the `pending` database.
#[derive(Clone, Copy)]
pub struct PendingStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl PendingStore {
    pub fn get(&self, txn: &RoTxn, key: &PendingKey) -> Result<Option<PendingInfo>, StoreError> {
        match self.db.get(txn, &key.encode())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put(
        &self,
        txn: &mut RwTxn,
        key: &PendingKey,
        info: &PendingInfo,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info)?;
        self.db.put(txn, &key.encode(), &bytes)?;
        Ok(())
    }

    pub fn del(&self, txn: &mut RwTxn, key: &PendingKey) -> Result<(), StoreError> {
        self.db.delete(txn, &key.encode())?;
        Ok(())
    }

    pub fn exists(&self, txn: &RoTxn, key: &PendingKey) -> Result<bool, StoreError> {
        Ok(self.db.get(txn, &key.encode())?.is_some())
    }

    pub fn count(&self, txn: &RoTxn) -> Result<u64, StoreError> {
        Ok(self.db.len(txn)?)
    }

    /// All pending entries destined for `account`.
    pub fn for_account(
        &self,
        txn: &RoTxn,
        account: &Account,
    ) -> Result<Vec<(PendingKey, PendingInfo)>, StoreError> {
        use std::ops::Bound;
        let mut lower = [0u8; 64];
        lower[..32].copy_from_slice(account.as_bytes());
        let mut upper = [0xFFu8; 64];
        upper[..32].copy_from_slice(account.as_bytes());
        let bounds = (Bound::Included(&lower[..]), Bound::Included(&upper[..]));

        let mut entries = Vec::new();
        for entry in self.db.range(txn, &bounds)? {
            let (key, value) = entry?;
            let hash: [u8; 32] = key[32..].try_into().map_err(|_| StoreError::Corrupt {
                subspace: "pending",
                reason: "key is not 64 bytes".into(),
            })?;
            entries.push((
                PendingKey::new(*account, BlockHash::new(hash)),
                bincode::deserialize(value)?,
            ));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    #[test]
    fn per_account_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let dest_a = Account::new([1; 32]);
        let dest_b = Account::new([2; 32]);
        let info = PendingInfo {
            source: Account::new([9; 32]),
            amount: Amount::new(50),
        };

        let mut txn = store.begin_write().unwrap();
        for n in 0..3u8 {
            let key = PendingKey::new(dest_a, BlockHash::new([n; 32]));
            store.pending.put(&mut txn, &key, &info).unwrap();
        }
        let other = PendingKey::new(dest_b, BlockHash::new([7; 32]));
        store.pending.put(&mut txn, &other, &info).unwrap();
        txn.commit().unwrap();

        let txn = store.begin_read().unwrap();
        assert_eq!(store.pending.for_account(&txn, &dest_a).unwrap().len(), 3);
        assert_eq!(store.pending.for_account(&txn, &dest_b).unwrap().len(), 1);
        assert_eq!(store.pending.count(&txn).unwrap(), 4);
    }

    #[test]
    fn delete_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let key = PendingKey::new(Account::new([3; 32]), BlockHash::new([4; 32]));
        let info = PendingInfo {
            source: Account::new([5; 32]),
            amount: Amount::new(1),
        };

        let mut txn = store.begin_write().unwrap();
        store.pending.put(&mut txn, &key, &info).unwrap();
        store.pending.del(&mut txn, &key).unwrap();
        txn.commit().unwrap();

        let txn = store.begin_read().unwrap();
        assert!(!store.pending.exists(&txn, &key).unwrap());
    }
}
