//! Cryptographic primitives for the rai protocol.
//!
//! - **Ed25519** for block and vote signatures
//! - **Blake2b-256** for block hashes, vote digests, and the work function
//! - Base-32 account encoding with a 40-bit checksum suffix

pub mod address;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::{decode_account, encode_account};
pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{account_from_private, generate_keypair, keypair_from_private};
pub use sign::{sign_message, verify_message};
