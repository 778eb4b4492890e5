//! Peer bookkeeping for the UDP overlay.
//!
//! The sockets themselves live in `rai-node`; this crate owns the shared
//! state they consult: the peer table and the flood-control filter.

pub mod dedup;
pub mod peers;

pub use dedup::RecentlySeen;
pub use peers::{reserved_endpoint, PeerContainer, PEER_CUTOFF_SECS};
