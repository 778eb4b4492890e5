//! The peer table.
//!
//! Peers live in a mutex-guarded map keyed by endpoint. An entry is fresh
//! while it was heard from within the cutoff window; stale entries are purged
//! lazily on listing. Reserved endpoints (unspecified, multicast, port zero)
//! are refused at insertion so keepalive packets cannot poison the table.

use rai_types::Timestamp;
use std::collections::HashMap;
use std::net::SocketAddrV6;
use std::sync::Mutex;

/// Seconds after last contact before a peer is considered dead.
pub const PEER_CUTOFF_SECS: u64 = 300;

/// Whether an endpoint must never enter the peer table.
pub fn reserved_endpoint(endpoint: &SocketAddrV6) -> bool {
    endpoint.port() == 0 || endpoint.ip().is_unspecified() || endpoint.ip().is_multicast()
}

pub struct PeerContainer {
    peers: Mutex<HashMap<SocketAddrV6, Timestamp>>,
    cutoff_secs: u64,
}

impl Default for PeerContainer {
    fn default() -> Self {
        Self::new(PEER_CUTOFF_SECS)
    }
}

impl PeerContainer {
    pub fn new(cutoff_secs: u64) -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
            cutoff_secs,
        }
    }

    /// Record contact with `endpoint`. Returns true if it was previously
    /// unknown (or had gone stale), false for refreshes and reserved
    /// endpoints.
    pub fn observe(&self, endpoint: SocketAddrV6, now: Timestamp) -> bool {
        if reserved_endpoint(&endpoint) {
            return false;
        }
        let mut peers = self.peers.lock().unwrap();
        let fresh = match peers.get(&endpoint) {
            Some(last) => last.elapsed_since(now) >= self.cutoff_secs,
            None => true,
        };
        if fresh {
            tracing::debug!(peer = %endpoint, "peer added");
        }
        peers.insert(endpoint, now);
        fresh
    }

    /// Whether `endpoint` was heard from within the cutoff window.
    pub fn known(&self, endpoint: &SocketAddrV6, now: Timestamp) -> bool {
        self.peers
            .lock()
            .unwrap()
            .get(endpoint)
            .is_some_and(|last| last.elapsed_since(now) < self.cutoff_secs)
    }

    /// All fresh peers; stale entries are dropped as a side effect.
    pub fn list(&self, now: Timestamp) -> Vec<SocketAddrV6> {
        let mut peers = self.peers.lock().unwrap();
        peers.retain(|_, last| last.elapsed_since(now) < self.cutoff_secs);
        peers.keys().copied().collect()
    }

    /// A random sample of fresh peers, for keepalive slot filling.
    pub fn sample(&self, count: usize, now: Timestamp) -> Vec<SocketAddrV6> {
        use rand::seq::IteratorRandom;
        self.list(now)
            .into_iter()
            .choose_multiple(&mut rand::rng(), count)
    }

    pub fn len(&self) -> usize {
        self.peers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn endpoint(tail: u16) -> SocketAddrV6 {
        SocketAddrV6::new(Ipv6Addr::new(0xFC00, 0, 0, 0, 0, 0, 0, tail), 7075, 0, 0)
    }

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    #[test]
    fn observe_then_known() {
        let peers = PeerContainer::new(300);
        assert!(peers.observe(endpoint(1), ts(0)));
        assert!(!peers.observe(endpoint(1), ts(10)));
        assert!(peers.known(&endpoint(1), ts(10)));
        assert!(!peers.known(&endpoint(2), ts(10)));
    }

    #[test]
    fn stale_peers_are_purged() {
        let peers = PeerContainer::new(300);
        peers.observe(endpoint(1), ts(0));
        peers.observe(endpoint(2), ts(200));
        assert_eq!(peers.list(ts(250)).len(), 2);
        assert_eq!(peers.list(ts(301)), vec![endpoint(2)]);
    }

    #[test]
    fn reserved_endpoints_refused() {
        let peers = PeerContainer::new(300);
        assert!(!peers.observe(SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, 7075, 0, 0), ts(0)));
        let mut no_port = endpoint(1);
        no_port.set_port(0);
        assert!(!peers.observe(no_port, ts(0)));
        assert!(peers.is_empty());
    }

    #[test]
    fn sample_is_bounded() {
        let peers = PeerContainer::new(300);
        for tail in 1..20 {
            peers.observe(endpoint(tail), ts(0));
        }
        assert_eq!(peers.sample(8, ts(1)).len(), 8);
        assert_eq!(peers.sample(50, ts(1)).len(), 19);
    }
}
