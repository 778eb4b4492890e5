//! Ed25519 message signing and verification.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rai_types::{Account, RawKey, Signature};

/// Sign a message with a private key.
pub fn sign_message(message: &[u8], private: &RawKey) -> Signature {
    let signing = SigningKey::from_bytes(private.as_bytes());
    Signature::new(signing.sign(message).to_bytes())
}

/// Verify a signature against a message and the signing account.
///
/// Returns `false` for malformed public keys as well as bad signatures;
/// callers treat both as a rejected packet.
pub fn verify_message(message: &[u8], signature: &Signature, account: &Account) -> bool {
    let Ok(verifying) = VerifyingKey::from_bytes(account.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    verifying.verify(message, &sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_keypair;

    #[test]
    fn sign_verify_round_trip() {
        let keys = generate_keypair();
        let sig = sign_message(b"block digest", &keys.private);
        assert!(verify_message(b"block digest", &sig, &keys.account));
    }

    #[test]
    fn wrong_message_rejected() {
        let keys = generate_keypair();
        let sig = sign_message(b"block digest", &keys.private);
        assert!(!verify_message(b"other digest", &sig, &keys.account));
    }

    #[test]
    fn wrong_account_rejected() {
        let keys = generate_keypair();
        let other = generate_keypair();
        let sig = sign_message(b"block digest", &keys.private);
        assert!(!verify_message(b"block digest", &sig, &other.account));
    }

    #[test]
    fn garbage_key_rejected() {
        let keys = generate_keypair();
        let sig = sign_message(b"block digest", &keys.private);
        // Not a valid curve point.
        let bogus = Account::new([0xFF; 32]);
        assert!(!verify_message(b"block digest", &sig, &bogus));
    }
}
