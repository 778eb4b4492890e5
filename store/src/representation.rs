//! Representation sub-space: voting weight per representative.
//!
//! The ledger keeps these totals in lock-step with account balances; a zero
//! weight is stored as an absent key so the table only holds accounts that
//! actually represent someone.

use crate::StoreError;
use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use rai_types::{Account, Amount};

/// Handle over the `representation` database.
#[derive(Clone, Copy)]
pub struct RepresentationStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl RepresentationStore {
    /// Weight delegated to `representative` (zero when absent).
    pub fn get(&self, txn: &RoTxn, representative: &Account) -> Result<Amount, StoreError> {
        match self.db.get(txn, representative.as_bytes())? {
            Some(bytes) => {
                let raw: [u8; 16] = bytes.try_into().map_err(|_| StoreError::Corrupt {
                    subspace: "representation",
                    reason: "weight is not 16 bytes".into(),
                })?;
                Ok(Amount::from_le_bytes(raw))
            }
            None => Ok(Amount::ZERO),
        }
    }

    pub fn put(
        &self,
        txn: &mut RwTxn,
        representative: &Account,
        weight: Amount,
    ) -> Result<(), StoreError> {
        if weight.is_zero() {
            self.db.delete(txn, representative.as_bytes())?;
        } else {
            self.db
                .put(txn, representative.as_bytes(), &weight.to_le_bytes())?;
        }
        Ok(())
    }

    /// All (representative, weight) pairs.
    pub fn iter(&self, txn: &RoTxn) -> Result<Vec<(Account, Amount)>, StoreError> {
        let mut weights = Vec::new();
        for entry in self.db.iter(txn)? {
            let (key, value) = entry?;
            let account: [u8; 32] = key.try_into().map_err(|_| StoreError::Corrupt {
                subspace: "representation",
                reason: "key is not 32 bytes".into(),
            })?;
            let raw: [u8; 16] = value.try_into().map_err(|_| StoreError::Corrupt {
                subspace: "representation",
                reason: "weight is not 16 bytes".into(),
            })?;
            weights.push((Account::new(account), Amount::from_le_bytes(raw)));
        }
        Ok(weights)
    }
}
