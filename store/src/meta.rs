//! Meta sub-space: store-level markers.

use crate::StoreError;
use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};

const VERSION_KEY: &[u8] = b"version";

/// Handle over the `meta` database.
#[derive(Clone, Copy)]
pub struct MetaStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl MetaStore {
    pub fn version(&self, txn: &RoTxn) -> Result<Option<u32>, StoreError> {
        match self.db.get(txn, VERSION_KEY)? {
            Some(bytes) => {
                let raw: [u8; 4] = bytes.try_into().map_err(|_| StoreError::Corrupt {
                    subspace: "meta",
                    reason: "version is not 4 bytes".into(),
                })?;
                Ok(Some(u32::from_le_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    pub fn set_version(&self, txn: &mut RwTxn, version: u32) -> Result<(), StoreError> {
        self.db.put(txn, VERSION_KEY, &version.to_le_bytes())?;
        Ok(())
    }
}
