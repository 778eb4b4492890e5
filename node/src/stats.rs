//! Protocol statistics.
//!
//! Protocol-local drops (bad signature, insufficient work, malformed
//! packets, reserved senders) are counted here and otherwise discarded
//! silently, per the error-handling contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter names registered at startup.
pub const STAT_NAMES: &[&str] = &[
    "message.keepalive",
    "message.publish",
    "message.confirm_req",
    "message.confirm_ack",
    "drop.malformed",
    "drop.bad_work",
    "drop.bad_signature",
    "drop.bad_vote",
    "drop.reserved_sender",
    "block.accepted",
    "block.old",
    "block.rejected",
    "gap.previous",
    "gap.source",
    "fork",
    "election.confirmed",
    "election.flipped",
    "election.expired",
    "bootstrap.pull",
    "bootstrap.retry",
    "bootstrap.failed_account",
];

/// A thread-safe counter registry.
pub struct Stats {
    counters: HashMap<&'static str, AtomicU64>,
}

impl Default for Stats {
    fn default() -> Self {
        let mut counters = HashMap::new();
        for &name in STAT_NAMES {
            counters.insert(name, AtomicU64::new(0));
        }
        Self { counters }
    }
}

impl Stats {
    pub fn inc(&self, name: &str) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn add(&self, name: &str, value: u64) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        }
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> HashMap<&'static str, u64> {
        self.counters
            .iter()
            .map(|(&name, counter)| (name, counter.load(Ordering::Relaxed)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_registered_counters() {
        let stats = Stats::default();
        stats.inc("block.accepted");
        stats.inc("block.accepted");
        stats.add("bootstrap.pull", 5);
        assert_eq!(stats.get("block.accepted"), 2);
        assert_eq!(stats.get("bootstrap.pull"), 5);
    }

    #[test]
    fn unregistered_names_are_inert() {
        let stats = Stats::default();
        stats.inc("no.such.counter");
        assert_eq!(stats.get("no.such.counter"), 0);
    }
}
