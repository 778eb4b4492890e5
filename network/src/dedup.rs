//! Recently-seen filter for flood control.
//!
//! Re-broadcast loops would otherwise echo the same publish around the
//! overlay indefinitely. Bounded FIFO so memory stays flat under flood.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

pub struct RecentlySeen {
    inner: Mutex<Inner>,
    capacity: usize,
}

struct Inner {
    set: HashSet<[u8; 32]>,
    order: VecDeque<[u8; 32]>,
}

impl RecentlySeen {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                set: HashSet::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Record `id`; returns true if it had not been seen recently.
    pub fn insert(&self, id: [u8; 32]) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !inner.set.insert(id) {
            return false;
        }
        inner.order.push_back(id);
        if inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.set.remove(&evicted);
            }
        }
        true
    }

    pub fn contains(&self, id: &[u8; 32]) -> bool {
        self.inner.lock().unwrap().set.contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
