//! Unchecked sub-space: blocks parked on a missing dependency.
//!
//! A block that arrives before its `previous` (or before the send it
//! receives from) waits here keyed by the missing hash. When the dependency
//! is accepted, all dependents are drained and re-attempted. This is a soft
//! cache: it is bounded and evicts the oldest arrival under pressure, so
//! parked blocks may have to be re-fetched in the worst case.

use crate::StoreError;
use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use rai_types::BlockHash;
use serde::{Deserialize, Serialize};

/// Maximum parked blocks across all dependencies.
pub const UNCHECKED_MAX: u64 = 128;

/// A parked block and its arrival time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncheckedEntry {
    /// Unix seconds when the block arrived.
    pub arrival: u64,
    /// Serialized tagged block.
    pub block_bytes: Vec<u8>,
}

fn encode_key(dependency: &BlockHash, block_hash: &BlockHash) -> [u8; 64] {
    let mut key = [0u8; 64];
    key[..32].copy_from_slice(dependency.as_bytes());
    key[32..].copy_from_slice(block_hash.as_bytes());
    key
}

/// Handle over the `unchecked` database.
#[derive(Clone, Copy)]
pub struct UncheckedStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl UncheckedStore {
    /// Park `block_bytes` until `dependency` arrives.
    ///
    /// Evicts the oldest entry when the cache is full.
    pub fn put(
        &self,
        txn: &mut RwTxn,
        dependency: &BlockHash,
        block_hash: &BlockHash,
        entry: &UncheckedEntry,
    ) -> Result<(), StoreError> {
        if self.db.len(txn)? >= UNCHECKED_MAX {
            self.evict_oldest(txn)?;
        }
        let bytes = bincode::serialize(entry)?;
        self.db
            .put(txn, &encode_key(dependency, block_hash), &bytes)?;
        Ok(())
    }

    /// Remove and return every block waiting on `dependency`.
    pub fn drain_dependents(
        &self,
        txn: &mut RwTxn,
        dependency: &BlockHash,
    ) -> Result<Vec<UncheckedEntry>, StoreError> {
        use std::ops::Bound;
        let lower = encode_key(dependency, &BlockHash::ZERO);
        let upper = encode_key(dependency, &BlockHash::new([0xFF; 32]));

        let mut keys = Vec::new();
        let mut entries = Vec::new();
        {
            let bounds = (Bound::Included(&lower[..]), Bound::Included(&upper[..]));
            for item in self.db.range(txn, &bounds)? {
                let (key, value) = item?;
                keys.push(key.to_vec());
                entries.push(bincode::deserialize(value)?);
            }
        }
        for key in keys {
            self.db.delete(txn, &key)?;
        }
        Ok(entries)
    }

    pub fn count(&self, txn: &RoTxn) -> Result<u64, StoreError> {
        Ok(self.db.len(txn)?)
    }

    /// Drop entries older than `cutoff` seconds relative to `now`.
    pub fn clear_older_than(
        &self,
        txn: &mut RwTxn,
        cutoff: u64,
        now: u64,
    ) -> Result<u64, StoreError> {
        let mut stale = Vec::new();
        for item in self.db.iter(txn)? {
            let (key, value) = item?;
            let entry: UncheckedEntry = bincode::deserialize(value)?;
            if now.saturating_sub(entry.arrival) >= cutoff {
                stale.push(key.to_vec());
            }
        }
        let removed = stale.len() as u64;
        for key in stale {
            self.db.delete(txn, &key)?;
        }
        Ok(removed)
    }

    fn evict_oldest(&self, txn: &mut RwTxn) -> Result<(), StoreError> {
        let mut oldest: Option<(u64, Vec<u8>)> = None;
        for item in self.db.iter(txn)? {
            let (key, value) = item?;
            let entry: UncheckedEntry = bincode::deserialize(value)?;
            let replace = match &oldest {
                Some((arrival, _)) => entry.arrival < *arrival,
                None => true,
            };
            if replace {
                oldest = Some((entry.arrival, key.to_vec()));
            }
        }
        if let Some((_, key)) = oldest {
            self.db.delete(txn, &key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    fn entry(arrival: u64, tag: u8) -> UncheckedEntry {
        UncheckedEntry {
            arrival,
            block_bytes: vec![tag],
        }
    }

    #[test]
    fn drain_returns_only_matching_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let dep_a = BlockHash::new([1; 32]);
        let dep_b = BlockHash::new([2; 32]);

        let mut txn = store.begin_write().unwrap();
        store
            .unchecked
            .put(&mut txn, &dep_a, &BlockHash::new([10; 32]), &entry(5, 1))
            .unwrap();
        store
            .unchecked
            .put(&mut txn, &dep_a, &BlockHash::new([11; 32]), &entry(6, 2))
            .unwrap();
        store
            .unchecked
            .put(&mut txn, &dep_b, &BlockHash::new([12; 32]), &entry(7, 3))
            .unwrap();

        let drained = store.unchecked.drain_dependents(&mut txn, &dep_a).unwrap();
        assert_eq!(drained.len(), 2);
        assert_eq!(store.unchecked.count(&txn).unwrap(), 1);
        txn.commit().unwrap();
    }

    #[test]
    fn full_cache_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let mut txn = store.begin_write().unwrap();
        for n in 0..UNCHECKED_MAX {
            let mut hash = [0u8; 32];
            hash[..8].copy_from_slice(&n.to_be_bytes());
            store
                .unchecked
                .put(
                    &mut txn,
                    &BlockHash::new(hash),
                    &BlockHash::new(hash),
                    &entry(n, 0),
                )
                .unwrap();
        }
        assert_eq!(store.unchecked.count(&txn).unwrap(), UNCHECKED_MAX);

        // One more pushes out the oldest arrival (n = 0).
        let newest = BlockHash::new([0xEE; 32]);
        store
            .unchecked
            .put(&mut txn, &newest, &newest, &entry(999, 0))
            .unwrap();
        assert_eq!(store.unchecked.count(&txn).unwrap(), UNCHECKED_MAX);

        let gone = store
            .unchecked
            .drain_dependents(&mut txn, &BlockHash::ZERO)
            .unwrap();
        assert!(gone.is_empty());
        txn.commit().unwrap();
    }

    #[test]
    fn clear_older_than_expires_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let dep = BlockHash::new([3; 32]);

        let mut txn = store.begin_write().unwrap();
        store
            .unchecked
            .put(&mut txn, &dep, &BlockHash::new([1; 32]), &entry(100, 0))
            .unwrap();
        store
            .unchecked
            .put(&mut txn, &dep, &BlockHash::new([2; 32]), &entry(900, 0))
            .unwrap();

        let removed = store.unchecked.clear_older_than(&mut txn, 300, 1000).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.unchecked.count(&txn).unwrap(), 1);
        txn.commit().unwrap();
    }
}
