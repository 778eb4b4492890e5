//! Cancellable parallel work generation.

use crate::validator::work_value;
use crate::WorkError;
use rai_types::BlockHash;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// Attempts between cancellation checks on each worker.
const CHECK_INTERVAL: u64 = 1024;

/// Generates proof-of-work nonces on the rayon pool.
///
/// Workers stride the nonce space from a random start so repeated requests
/// for the same root do not retrace each other's attempts.
pub struct WorkPool {
    threshold: u64,
}

impl WorkPool {
    pub fn new(threshold: u64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Generate a nonce whose work value exceeds the pool threshold for
    /// `root`.
    pub fn generate(&self, root: &BlockHash) -> Result<u64, WorkError> {
        self.generate_cancelable(root, &AtomicBool::new(false))
    }

    /// Generate with a cancellation token, checked between attempt batches.
    pub fn generate_cancelable(
        &self,
        root: &BlockHash,
        cancel: &AtomicBool,
    ) -> Result<u64, WorkError> {
        let done = AtomicBool::new(false);
        let start: u64 = rand::random();
        let workers = rayon::current_num_threads().max(1) as u64;

        let found = (0..workers).into_par_iter().find_map_any(|worker| {
            let mut nonce = start.wrapping_add(worker);
            loop {
                for _ in 0..CHECK_INTERVAL {
                    if work_value(root, nonce) > self.threshold {
                        done.store(true, Ordering::Relaxed);
                        return Some(nonce);
                    }
                    nonce = nonce.wrapping_add(workers);
                }
                if done.load(Ordering::Relaxed) || cancel.load(Ordering::Relaxed) {
                    return None;
                }
            }
        });

        found.ok_or(WorkError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_work;

    #[test]
    fn generates_valid_work() {
        let pool = WorkPool::new(0xFF00_0000_0000_0000);
        let root = BlockHash::new([0x99; 32]);
        let nonce = pool.generate(&root).unwrap();
        assert!(validate_work(&root, nonce, pool.threshold()));
    }

    #[test]
    fn zero_threshold_returns_immediately() {
        let pool = WorkPool::new(0);
        let nonce = pool.generate(&BlockHash::ZERO).unwrap();
        assert!(validate_work(&BlockHash::ZERO, nonce, 0));
    }

    #[test]
    fn pre_cancelled_token_aborts() {
        // An impossible threshold would loop forever without the token.
        let pool = WorkPool::new(u64::MAX);
        let cancel = AtomicBool::new(true);
        let result = pool.generate_cancelable(&BlockHash::new([1; 32]), &cancel);
        assert_eq!(result, Err(WorkError::Cancelled));
    }
}
