//! LMDB-backed ledger store.
//!
//! A single environment with one named database per sub-space. All access
//! goes through [`ReadTransaction`] / [`WriteTransaction`] guards obtained
//! from [`Store::begin_read`] / [`Store::begin_write`]; sub-space handles are
//! plain copies of database handles and carry no state of their own.
//!
//! The store is the single source of truth: an unknown version marker is a
//! fatal error at open and is never silently repaired.

pub mod account;
pub mod block;
pub mod bootstrap;
pub mod checksum;
pub mod error;
pub mod frontier;
pub mod meta;
pub mod pending;
pub mod representation;
pub mod transaction;
pub mod unchecked;

pub use account::{AccountInfo, AccountStore};
pub use block::BlockStore;
pub use bootstrap::BootstrapStore;
pub use checksum::ChecksumStore;
pub use error::StoreError;
pub use frontier::FrontierStore;
pub use meta::MetaStore;
pub use pending::{PendingInfo, PendingKey, PendingStore};
pub use representation::RepresentationStore;
pub use transaction::{ReadTransaction, WriteTransaction};
pub use unchecked::{UncheckedEntry, UncheckedStore, UNCHECKED_MAX};

use heed::types::Bytes;
use heed::{Env, EnvOpenOptions};
pub use heed::{RoTxn, RwTxn};
use std::path::Path;

/// Current on-disk schema version.
pub const STORE_VERSION: u32 = 1;

/// Default LMDB map size: 4 GiB.
const MAP_SIZE: usize = 4 << 30;
/// Number of named databases.
const MAX_DBS: u32 = 9;

/// The ledger store: LMDB environment plus sub-space handles.
pub struct Store {
    env: Env,
    pub accounts: AccountStore,
    pub blocks: BlockStore,
    pub pending: PendingStore,
    pub representation: RepresentationStore,
    pub frontiers: FrontierStore,
    pub checksum: ChecksumStore,
    pub unchecked: UncheckedStore,
    pub bootstrap: BootstrapStore,
    pub meta: MetaStore,
}

impl Store {
    /// Open or create the store at `path`.
    ///
    /// Fails on an unreadable path or an unsupported on-disk version; both
    /// are fatal to node start.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(MAP_SIZE)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut txn = env.write_txn()?;
        let accounts = env.create_database::<Bytes, Bytes>(&mut txn, Some("accounts"))?;
        let blocks = env.create_database::<Bytes, Bytes>(&mut txn, Some("blocks"))?;
        let pending = env.create_database::<Bytes, Bytes>(&mut txn, Some("pending"))?;
        let representation =
            env.create_database::<Bytes, Bytes>(&mut txn, Some("representation"))?;
        let frontiers = env.create_database::<Bytes, Bytes>(&mut txn, Some("frontiers"))?;
        let checksum = env.create_database::<Bytes, Bytes>(&mut txn, Some("checksum"))?;
        let unchecked = env.create_database::<Bytes, Bytes>(&mut txn, Some("unchecked"))?;
        let bootstrap = env.create_database::<Bytes, Bytes>(&mut txn, Some("bootstrap"))?;
        let meta_db = env.create_database::<Bytes, Bytes>(&mut txn, Some("meta"))?;

        let meta = MetaStore { db: meta_db };
        match meta.version(&txn)? {
            Some(found) if found != STORE_VERSION => {
                return Err(StoreError::InvalidVersion {
                    found,
                    expected: STORE_VERSION,
                });
            }
            Some(_) => {}
            None => meta.set_version(&mut txn, STORE_VERSION)?,
        }
        txn.commit()?;
        tracing::debug!(path = %path.display(), "store opened");

        Ok(Self {
            env,
            accounts: AccountStore { db: accounts },
            blocks: BlockStore { db: blocks },
            pending: PendingStore { db: pending },
            representation: RepresentationStore { db: representation },
            frontiers: FrontierStore { db: frontiers },
            checksum: ChecksumStore { db: checksum },
            unchecked: UncheckedStore { db: unchecked },
            bootstrap: BootstrapStore { db: bootstrap },
            meta,
        })
    }

    /// Begin a read-only transaction. Multiple may coexist.
    pub fn begin_read(&self) -> Result<ReadTransaction<'_>, StoreError> {
        Ok(ReadTransaction(self.env.read_txn()?))
    }

    /// Begin the (single) write transaction.
    pub fn begin_write(&self) -> Result<WriteTransaction<'_>, StoreError> {
        Ok(WriteTransaction(self.env.write_txn()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("ledger");
        let store = Store::open(&nested).unwrap();
        let txn = store.begin_read().unwrap();
        assert_eq!(store.blocks.count(&txn).unwrap(), 0);
    }

    #[test]
    fn version_marker_persists() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _store = Store::open(dir.path()).unwrap();
        }
        let store = Store::open(dir.path()).unwrap();
        let txn = store.begin_read().unwrap();
        assert_eq!(store.meta.version(&txn).unwrap(), Some(STORE_VERSION));
    }

    #[test]
    fn committed_writes_visible_to_new_readers() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let hash = rai_types::BlockHash::new([1; 32]);

        let mut txn = store.begin_write().unwrap();
        store.blocks.put(&mut txn, &hash, &[0xAA]).unwrap();
        txn.commit().unwrap();

        let txn = store.begin_read().unwrap();
        assert!(store.blocks.exists(&txn, &hash).unwrap());
    }
}
