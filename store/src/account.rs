//! Account sub-space: one record per opened account.

use crate::StoreError;
use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use rai_types::{Account, Amount, BlockHash};
use serde::{Deserialize, Serialize};

/// Persistent state of an account chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Hash of the latest block on the chain.
    pub head: BlockHash,
    /// Hash of the block that set the current representative (open or change).
    pub rep_block: BlockHash,
    /// Hash of the first block on the chain.
    pub open_block: BlockHash,
    /// Balance after `head`.
    pub balance: Amount,
    /// Unix seconds of the last head change.
    pub modified: u64,
    /// Number of blocks on the chain.
    pub block_count: u64,
}

/// Handle over the `accounts` database.
#[derive(Clone, Copy)]
pub struct AccountStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl AccountStore {
    pub fn get(&self, txn: &RoTxn, account: &Account) -> Result<Option<AccountInfo>, StoreError> {
        match self.db.get(txn, account.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put(
        &self,
        txn: &mut RwTxn,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info)?;
        self.db.put(txn, account.as_bytes(), &bytes)?;
        Ok(())
    }

    pub fn del(&self, txn: &mut RwTxn, account: &Account) -> Result<(), StoreError> {
        self.db.delete(txn, account.as_bytes())?;
        Ok(())
    }

    pub fn exists(&self, txn: &RoTxn, account: &Account) -> Result<bool, StoreError> {
        Ok(self.db.get(txn, account.as_bytes())?.is_some())
    }

    pub fn count(&self, txn: &RoTxn) -> Result<u64, StoreError> {
        Ok(self.db.len(txn)?)
    }

    /// Iterate accounts in ascending key order starting at `start` (inclusive).
    pub fn iter_from<'t>(
        &self,
        txn: &'t RoTxn,
        start: &Account,
    ) -> Result<impl Iterator<Item = Result<(Account, AccountInfo), StoreError>> + 't, StoreError>
    {
        use std::ops::Bound;
        let lower = *start.as_bytes();
        let bounds = (Bound::Included(&lower[..]), Bound::<&[u8]>::Unbounded);
        let iter = self.db.range(txn, &bounds)?;
        Ok(iter.map(|entry| {
            let (key, value) = entry.map_err(StoreError::from)?;
            let key: [u8; 32] = key.try_into().map_err(|_| StoreError::Corrupt {
                subspace: "accounts",
                reason: "key is not 32 bytes".into(),
            })?;
            let info: AccountInfo = bincode::deserialize(value)?;
            Ok((Account::new(key), info))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (dir, store)
    }

    fn info(n: u8) -> AccountInfo {
        AccountInfo {
            head: BlockHash::new([n; 32]),
            rep_block: BlockHash::new([n; 32]),
            open_block: BlockHash::new([n; 32]),
            balance: Amount::new(n as u128),
            modified: 1000,
            block_count: 1,
        }
    }

    #[test]
    fn put_get_round_trip() {
        let (_dir, store) = test_store();
        let account = Account::new([1; 32]);
        let mut txn = store.begin_write().unwrap();
        store.accounts.put(&mut txn, &account, &info(9)).unwrap();
        txn.commit().unwrap();

        let txn = store.begin_read().unwrap();
        assert_eq!(store.accounts.get(&txn, &account).unwrap(), Some(info(9)));
        assert!(store.accounts.exists(&txn, &account).unwrap());
    }

    #[test]
    fn uncommitted_write_is_invisible() {
        let (_dir, store) = test_store();
        let account = Account::new([2; 32]);
        {
            let mut txn = store.begin_write().unwrap();
            store.accounts.put(&mut txn, &account, &info(1)).unwrap();
            // dropped without commit
        }
        let txn = store.begin_read().unwrap();
        assert_eq!(store.accounts.get(&txn, &account).unwrap(), None);
    }

    #[test]
    fn iter_from_respects_order() {
        let (_dir, store) = test_store();
        let mut txn = store.begin_write().unwrap();
        for n in [5u8, 1, 3] {
            store
                .accounts
                .put(&mut txn, &Account::new([n; 32]), &info(n))
                .unwrap();
        }
        txn.commit().unwrap();

        let txn = store.begin_read().unwrap();
        let accounts: Vec<Account> = store
            .accounts
            .iter_from(&txn, &Account::new([2; 32]))
            .unwrap()
            .map(|entry| entry.unwrap().0)
            .collect();
        assert_eq!(accounts, vec![Account::new([3; 32]), Account::new([5; 32])]);
    }
}
