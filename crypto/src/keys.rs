//! Ed25519 key generation and derivation.

use ed25519_dalek::SigningKey;
use rai_types::{Account, KeyPair, RawKey};

/// Generate a new key pair from the process random source.
pub fn generate_keypair() -> KeyPair {
    let seed: [u8; 32] = rand::random();
    keypair_from_private(RawKey(seed))
}

/// Derive the account (public key) from a private key.
pub fn account_from_private(private: &RawKey) -> Account {
    let signing = SigningKey::from_bytes(private.as_bytes());
    Account::new(signing.verifying_key().to_bytes())
}

/// Reconstruct a full key pair from a private key.
pub fn keypair_from_private(private: RawKey) -> KeyPair {
    let account = account_from_private(&private);
    KeyPair { account, private }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let private = RawKey([11u8; 32]);
        assert_eq!(
            account_from_private(&private),
            account_from_private(&private)
        );
    }

    #[test]
    fn generated_keys_are_unique() {
        let a = generate_keypair();
        let b = generate_keypair();
        assert_ne!(a.account, b.account);
    }
}
