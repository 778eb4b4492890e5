//! The four block variants and their codec.
//!
//! A block's hash covers its type-specific hashable fields in declared order;
//! signature and work are excluded so they can be attached after hashing. On
//! the wire a standalone block is a one-byte type tag followed by the
//! fixed-width body: hashable fields, 64-byte signature, 8-byte work nonce
//! (scalars little-endian, 32/64-byte fields raw).

use rai_crypto::{blake2b_256_multi, sign_message, verify_message};
use rai_types::{Account, Amount, BlockHash, RawKey, Signature, WireReader};

/// One-byte tag preceding a standalone block.
///
/// `NotABlock` terminates bulk-pull streams; `Invalid` is reserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockType {
    NotABlock = 0,
    Invalid = 1,
    Receive = 2,
    Send = 3,
    Open = 4,
    Change = 5,
}

impl BlockType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NotABlock),
            1 => Some(Self::Invalid),
            2 => Some(Self::Receive),
            3 => Some(Self::Send),
            4 => Some(Self::Open),
            5 => Some(Self::Change),
            _ => None,
        }
    }

    /// Serialized body length for block-carrying tags.
    pub fn body_size(self) -> Option<usize> {
        match self {
            Self::Send => Some(32 + 32 + 16 + 64 + 8),
            Self::Receive => Some(32 + 32 + 64 + 8),
            Self::Open => Some(32 + 32 + 32 + 64 + 8),
            Self::Change => Some(32 + 32 + 64 + 8),
            Self::NotABlock | Self::Invalid => None,
        }
    }
}

/// First block of an account; receives the send named by `source`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenBlock {
    pub source: BlockHash,
    pub representative: Account,
    pub account: Account,
    pub signature: Signature,
    pub work: u64,
}

/// Forwards funds; `balance` is the sender's balance *after* the send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendBlock {
    pub previous: BlockHash,
    pub destination: Account,
    pub balance: Amount,
    pub signature: Signature,
    pub work: u64,
}

/// Credits a pending send into the receiver's chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiveBlock {
    pub previous: BlockHash,
    pub source: BlockHash,
    pub signature: Signature,
    pub work: u64,
}

/// Changes the account's representative without moving funds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeBlock {
    pub previous: BlockHash,
    pub representative: Account,
    pub signature: Signature,
    pub work: u64,
}

/// A ledger block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Open(OpenBlock),
    Send(SendBlock),
    Receive(ReceiveBlock),
    Change(ChangeBlock),
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Open(_) => BlockType::Open,
            Self::Send(_) => BlockType::Send,
            Self::Receive(_) => BlockType::Receive,
            Self::Change(_) => BlockType::Change,
        }
    }

    /// Blake2b-256 over the hashable fields in declared order.
    pub fn hash(&self) -> BlockHash {
        let digest = match self {
            Self::Open(b) => blake2b_256_multi(&[
                b.source.as_bytes(),
                b.representative.as_bytes(),
                b.account.as_bytes(),
            ]),
            Self::Send(b) => blake2b_256_multi(&[
                b.previous.as_bytes(),
                b.destination.as_bytes(),
                &b.balance.to_le_bytes(),
            ]),
            Self::Receive(b) => blake2b_256_multi(&[b.previous.as_bytes(), b.source.as_bytes()]),
            Self::Change(b) => {
                blake2b_256_multi(&[b.previous.as_bytes(), b.representative.as_bytes()])
            }
        };
        BlockHash::new(digest)
    }

    /// The slot this block fills: `previous` for non-open blocks, the account
    /// key for open blocks. Forks are collisions on a root.
    pub fn root(&self) -> BlockHash {
        match self {
            Self::Open(b) => b.account.as_root(),
            Self::Send(b) => b.previous,
            Self::Receive(b) => b.previous,
            Self::Change(b) => b.previous,
        }
    }

    /// Predecessor on the owning chain (zero for open blocks).
    pub fn previous(&self) -> BlockHash {
        match self {
            Self::Open(_) => BlockHash::ZERO,
            Self::Send(b) => b.previous,
            Self::Receive(b) => b.previous,
            Self::Change(b) => b.previous,
        }
    }

    /// The referenced send block, for variants that credit one.
    pub fn source(&self) -> Option<BlockHash> {
        match self {
            Self::Open(b) => Some(b.source),
            Self::Receive(b) => Some(b.source),
            Self::Send(_) | Self::Change(_) => None,
        }
    }

    pub fn work(&self) -> u64 {
        match self {
            Self::Open(b) => b.work,
            Self::Send(b) => b.work,
            Self::Receive(b) => b.work,
            Self::Change(b) => b.work,
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Self::Open(b) => &b.signature,
            Self::Send(b) => &b.signature,
            Self::Receive(b) => &b.signature,
            Self::Change(b) => &b.signature,
        }
    }

    /// Sign this block's hash in place.
    pub fn sign(&mut self, private: &RawKey) {
        let signature = sign_message(self.hash().as_bytes(), private);
        match self {
            Self::Open(b) => b.signature = signature,
            Self::Send(b) => b.signature = signature,
            Self::Receive(b) => b.signature = signature,
            Self::Change(b) => b.signature = signature,
        }
    }

    /// Verify the signature against the given signing account.
    pub fn verify_signature(&self, signer: &Account) -> bool {
        verify_message(self.hash().as_bytes(), self.signature(), signer)
    }

    /// Whether the attached work nonce strictly exceeds `threshold` for this
    /// block's root.
    pub fn verify_work(&self, threshold: u64) -> bool {
        rai_work::validate_work(&self.root(), self.work(), threshold)
    }

    pub fn set_work(&mut self, work: u64) {
        match self {
            Self::Open(b) => b.work = work,
            Self::Send(b) => b.work = work,
            Self::Receive(b) => b.work = work,
            Self::Change(b) => b.work = work,
        }
    }

    /// Append the body (hashables, signature, work) without the type tag.
    pub fn serialize_body(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Open(b) => {
                buf.extend_from_slice(b.source.as_bytes());
                buf.extend_from_slice(b.representative.as_bytes());
                buf.extend_from_slice(b.account.as_bytes());
                buf.extend_from_slice(b.signature.as_bytes());
                buf.extend_from_slice(&b.work.to_le_bytes());
            }
            Self::Send(b) => {
                buf.extend_from_slice(b.previous.as_bytes());
                buf.extend_from_slice(b.destination.as_bytes());
                buf.extend_from_slice(&b.balance.to_le_bytes());
                buf.extend_from_slice(b.signature.as_bytes());
                buf.extend_from_slice(&b.work.to_le_bytes());
            }
            Self::Receive(b) => {
                buf.extend_from_slice(b.previous.as_bytes());
                buf.extend_from_slice(b.source.as_bytes());
                buf.extend_from_slice(b.signature.as_bytes());
                buf.extend_from_slice(&b.work.to_le_bytes());
            }
            Self::Change(b) => {
                buf.extend_from_slice(b.previous.as_bytes());
                buf.extend_from_slice(b.representative.as_bytes());
                buf.extend_from_slice(b.signature.as_bytes());
                buf.extend_from_slice(&b.work.to_le_bytes());
            }
        }
    }

    /// Serialize with the leading type tag (standalone form).
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.block_type().body_size().unwrap_or(0));
        buf.push(self.block_type().as_u8());
        self.serialize_body(&mut buf);
        buf
    }

    /// Parse a body of the given type. `None` on short input or a tag that
    /// carries no block.
    pub fn deserialize_body(block_type: BlockType, reader: &mut WireReader) -> Option<Block> {
        match block_type {
            BlockType::Open => Some(Block::Open(OpenBlock {
                source: reader.read_hash()?,
                representative: reader.read_account()?,
                account: reader.read_account()?,
                signature: reader.read_signature()?,
                work: reader.read_u64_le()?,
            })),
            BlockType::Send => Some(Block::Send(SendBlock {
                previous: reader.read_hash()?,
                destination: reader.read_account()?,
                balance: reader.read_amount()?,
                signature: reader.read_signature()?,
                work: reader.read_u64_le()?,
            })),
            BlockType::Receive => Some(Block::Receive(ReceiveBlock {
                previous: reader.read_hash()?,
                source: reader.read_hash()?,
                signature: reader.read_signature()?,
                work: reader.read_u64_le()?,
            })),
            BlockType::Change => Some(Block::Change(ChangeBlock {
                previous: reader.read_hash()?,
                representative: reader.read_account()?,
                signature: reader.read_signature()?,
                work: reader.read_u64_le()?,
            })),
            BlockType::NotABlock | BlockType::Invalid => None,
        }
    }

    /// Parse a standalone (tag-prefixed) block.
    pub fn deserialize(reader: &mut WireReader) -> Option<Block> {
        let tag = BlockType::from_u8(reader.read_u8()?)?;
        Self::deserialize_body(tag, reader)
    }

    /// Parse from a byte slice, requiring the whole slice to be consumed.
    pub fn from_bytes(bytes: &[u8]) -> Option<Block> {
        let mut reader = WireReader::new(bytes);
        let block = Self::deserialize(&mut reader)?;
        reader.is_empty().then_some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rai_crypto::generate_keypair;

    fn sample_send() -> SendBlock {
        SendBlock {
            previous: BlockHash::new([1; 32]),
            destination: Account::new([2; 32]),
            balance: Amount::new(1000),
            signature: Signature::ZERO,
            work: 0,
        }
    }

    #[test]
    fn hash_is_stable() {
        let block = Block::Send(sample_send());
        assert_eq!(block.hash(), block.hash());
    }

    #[test]
    fn hash_excludes_signature_and_work() {
        let mut a = sample_send();
        let before = Block::Send(a.clone()).hash();
        a.signature = Signature::new([0xFF; 64]);
        a.work = 999;
        assert_eq!(Block::Send(a).hash(), before);
    }

    #[test]
    fn hash_covers_every_hashable_field() {
        let base = sample_send();
        let mut other = base.clone();
        other.balance = Amount::new(1001);
        assert_ne!(Block::Send(base.clone()).hash(), Block::Send(other).hash());

        let mut other = base.clone();
        other.destination = Account::new([3; 32]);
        assert_ne!(Block::Send(base).hash(), Block::Send(other).hash());
    }

    #[test]
    fn wire_form_distinguishes_variants() {
        let receive = Block::Receive(ReceiveBlock {
            previous: BlockHash::new([1; 32]),
            source: BlockHash::new([2; 32]),
            signature: Signature::ZERO,
            work: 0,
        });
        let change = Block::Change(ChangeBlock {
            previous: BlockHash::new([1; 32]),
            representative: Account::new([2; 32]),
            signature: Signature::ZERO,
            work: 0,
        });
        assert_eq!(receive.serialize()[0], BlockType::Receive.as_u8());
        assert_eq!(change.serialize()[0], BlockType::Change.as_u8());
        assert_ne!(receive.serialize(), change.serialize());
    }

    #[test]
    fn root_per_variant() {
        let open = Block::Open(OpenBlock {
            source: BlockHash::new([5; 32]),
            representative: Account::new([6; 32]),
            account: Account::new([7; 32]),
            signature: Signature::ZERO,
            work: 0,
        });
        assert_eq!(open.root(), BlockHash::new([7; 32]));
        assert_eq!(open.previous(), BlockHash::ZERO);

        let send = Block::Send(sample_send());
        assert_eq!(send.root(), BlockHash::new([1; 32]));
    }

    #[test]
    fn sign_and_verify() {
        let keys = generate_keypair();
        let mut block = Block::Send(sample_send());
        block.sign(&keys.private);
        assert!(block.verify_signature(&keys.account));
        assert!(!block.verify_signature(&generate_keypair().account));
    }

    #[test]
    fn serialize_round_trip_all_variants() {
        let blocks = [
            Block::Open(OpenBlock {
                source: BlockHash::new([1; 32]),
                representative: Account::new([2; 32]),
                account: Account::new([3; 32]),
                signature: Signature::new([4; 64]),
                work: 0x1122334455667788,
            }),
            Block::Send(sample_send()),
            Block::Receive(ReceiveBlock {
                previous: BlockHash::new([5; 32]),
                source: BlockHash::new([6; 32]),
                signature: Signature::new([7; 64]),
                work: 42,
            }),
            Block::Change(ChangeBlock {
                previous: BlockHash::new([8; 32]),
                representative: Account::new([9; 32]),
                signature: Signature::new([10; 64]),
                work: u64::MAX,
            }),
        ];
        for block in blocks {
            let bytes = block.serialize();
            assert_eq!(
                bytes.len(),
                1 + block.block_type().body_size().unwrap()
            );
            let parsed = Block::from_bytes(&bytes).expect("round trip");
            assert_eq!(parsed, block);
            assert_eq!(parsed.hash(), block.hash());
        }
    }

    #[test]
    fn truncated_input_rejected() {
        let bytes = Block::Send(sample_send()).serialize();
        assert!(Block::from_bytes(&bytes[..bytes.len() - 1]).is_none());
    }

    #[test]
    fn trailing_garbage_rejected() {
        let mut bytes = Block::Send(sample_send()).serialize();
        bytes.push(0);
        assert!(Block::from_bytes(&bytes).is_none());
    }

    #[test]
    fn bad_tag_rejected() {
        assert!(Block::from_bytes(&[99u8; 200]).is_none());
        assert!(Block::from_bytes(&[BlockType::NotABlock.as_u8()]).is_none());
    }

    mod codec_properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_hash() -> impl Strategy<Value = [u8; 32]> {
            any::<[u8; 32]>()
        }

        proptest! {
            #[test]
            fn send_round_trip(prev in arb_hash(), dest in arb_hash(), balance in any::<u128>(), work in any::<u64>()) {
                let block = Block::Send(SendBlock {
                    previous: BlockHash::new(prev),
                    destination: Account::new(dest),
                    balance: Amount::new(balance),
                    signature: Signature::new([0x5A; 64]),
                    work,
                });
                let parsed = Block::from_bytes(&block.serialize()).unwrap();
                prop_assert_eq!(parsed, block);
            }

            #[test]
            fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
                let _ = Block::from_bytes(&data);
            }
        }
    }
}
