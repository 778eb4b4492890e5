//! Fundamental types for the rai block-lattice protocol.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: accounts, block hashes, amounts, keys, timestamps, network
//! variants, and the little-endian wire reader used by the fixed-width codecs.

pub mod account;
pub mod amount;
pub mod hash;
pub mod keys;
pub mod network;
pub mod time;
pub mod wire;

pub use account::Account;
pub use amount::{Amount, GENESIS_AMOUNT};
pub use hash::BlockHash;
pub use keys::{KeyPair, RawKey, Signature};
pub use network::Network;
pub use time::Timestamp;
pub use wire::WireReader;
