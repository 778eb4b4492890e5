//! Human-facing account encoding.
//!
//! Format: prefix (`xrb_` on the live network, `ppr_` elsewhere) +
//! base32(public_key, 52 chars) + base32(checksum, 8 chars).
//!
//! Checksum: first 5 bytes of Blake2b-256(public_key). The alphabet avoids
//! visually ambiguous characters (0/O, 2/Z, l/I, v). The wire format always
//! uses the raw 32 bytes; this encoding exists only for display and config.

use rai_types::Account;

/// Base-32 alphabet (32 chars).
const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

/// Accepted account prefixes, across network variants.
const PREFIXES: [&str; 2] = ["xrb_", "ppr_"];

/// Characters encoding the 256-bit public key: ceil(256 / 5).
const KEY_CHARS: usize = 52;
/// Characters encoding the 40-bit checksum: 40 / 5.
const CHECKSUM_CHARS: usize = 8;
/// Checksum length in bytes.
const CHECKSUM_BYTES: usize = 5;

/// Whether bit `index` (most significant first) is set in `bytes`.
fn bit_at(bytes: &[u8], index: usize) -> bool {
    bytes[index / 8] & (0x80 >> (index % 8)) != 0
}

/// Encode bytes as base-32: one character per five bits, most significant
/// bit first. A tail shorter than five bits is padded with zero bits.
fn encode_base32(bytes: &[u8]) -> String {
    let total_bits = bytes.len() * 8;
    let mut text = String::with_capacity(total_bits.div_ceil(5));
    for start in (0..total_bits).step_by(5) {
        let mut group = 0usize;
        for index in start..start + 5 {
            group <<= 1;
            if index < total_bits && bit_at(bytes, index) {
                group |= 1;
            }
        }
        text.push(ALPHABET[group] as char);
    }
    text
}

/// Decode base-32 into exactly `N` bytes.
///
/// `None` on a character outside the alphabet, a length that does not match
/// `N`, or set padding bits (only the canonical encoding is accepted).
fn decode_base32<const N: usize>(text: &str) -> Option<[u8; N]> {
    let total_bits = N * 8;
    if text.len() != total_bits.div_ceil(5) {
        return None;
    }
    let mut bytes = [0u8; N];
    for (position, ch) in text.bytes().enumerate() {
        let group = ALPHABET.iter().position(|&entry| entry == ch)?;
        for offset in 0..5 {
            if group & (0x10 >> offset) == 0 {
                continue;
            }
            let index = position * 5 + offset;
            if index >= total_bits {
                return None;
            }
            bytes[index / 8] |= 0x80 >> (index % 8);
        }
    }
    Some(bytes)
}

/// Encode an account with the given prefix (see [`rai_types::Network::account_prefix`]).
pub fn encode_account(account: &Account, prefix: &str) -> String {
    let checksum = crate::blake2b_256(account.as_bytes());
    format!(
        "{prefix}{}{}",
        encode_base32(account.as_bytes()),
        encode_base32(&checksum[..CHECKSUM_BYTES])
    )
}

/// Decode an account string, accepting any known prefix.
///
/// Returns `None` on unknown prefix, wrong length, bad characters, or a
/// checksum mismatch.
pub fn decode_account(text: &str) -> Option<Account> {
    let prefix = PREFIXES.iter().find(|p| text.starts_with(**p))?;
    let encoded = &text[prefix.len()..];
    if encoded.len() != KEY_CHARS + CHECKSUM_CHARS {
        return None;
    }

    let key_bytes: [u8; 32] = decode_base32(&encoded[..KEY_CHARS])?;
    let checksum_bytes: [u8; CHECKSUM_BYTES] = decode_base32(&encoded[KEY_CHARS..])?;

    let expected = &crate::blake2b_256(&key_bytes)[..CHECKSUM_BYTES];
    if checksum_bytes != *expected {
        return None;
    }

    Some(Account::new(key_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_keypair;

    #[test]
    fn encode_decode_round_trip() {
        let keys = generate_keypair();
        let text = encode_account(&keys.account, "xrb_");
        assert_eq!(text.len(), 4 + KEY_CHARS + CHECKSUM_CHARS);
        assert_eq!(decode_account(&text), Some(keys.account));
    }

    #[test]
    fn both_prefixes_accepted() {
        let keys = generate_keypair();
        assert!(decode_account(&encode_account(&keys.account, "xrb_")).is_some());
        assert!(decode_account(&encode_account(&keys.account, "ppr_")).is_some());
    }

    #[test]
    fn unknown_prefix_rejected() {
        let keys = generate_keypair();
        let text = encode_account(&keys.account, "xrb_").replacen("xrb_", "brn_", 1);
        assert_eq!(decode_account(&text), None);
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let keys = generate_keypair();
        let mut text = encode_account(&keys.account, "xrb_");
        let last = text.pop().unwrap();
        text.push(if last == '1' { '3' } else { '1' });
        assert_eq!(decode_account(&text), None);
    }

    #[test]
    fn wrong_length_rejected() {
        assert_eq!(decode_account("xrb_tooshort"), None);
        assert_eq!(decode_account("ppr_"), None);
    }

    #[test]
    fn nonzero_padding_rejected() {
        // The 52nd key character carries one payload bit and four padding
        // bits; any character with a low bit set there is non-canonical.
        let keys = generate_keypair();
        let mut chars: Vec<char> = encode_account(&keys.account, "xrb_").chars().collect();
        chars[4 + KEY_CHARS - 1] = 'z';
        let text: String = chars.into_iter().collect();
        assert_eq!(decode_account(&text), None);
    }

    #[test]
    fn base32_round_trip() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x42];
        let encoded = encode_base32(&data);
        assert_eq!(encoded.len(), 8);
        let decoded: [u8; 5] = decode_base32(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn encoding_is_msb_first() {
        // 0b10001_000: first group 10001 -> index 17, second 000 + padding.
        let encoded = encode_base32(&[0b1000_1000]);
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded.as_bytes()[0], ALPHABET[0b10001]);
        assert_eq!(encoded.as_bytes()[1], ALPHABET[0]);
    }
}
