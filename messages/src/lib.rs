//! Node-to-node wire messages.
//!
//! Every message opens with the 8-byte [`MessageHeader`]. Bodies are
//! fixed-width (little-endian scalars, raw 32/64-byte fields); blocks travel
//! without a leading tag because the header's extension bits already name
//! their type. Malformed input parses to `None` and the packet is dropped.

pub mod header;

pub use header::{MessageHeader, MessageType, HEADER_SIZE};

use rai_ledger::Block;
use rai_types::{Account, BlockHash, Network, Signature, WireReader};
use std::net::{Ipv6Addr, SocketAddrV6};

/// Fixed number of peer slots in a keepalive.
pub const KEEPALIVE_PEERS: usize = 8;

/// Serialized size of one keepalive slot (16-byte ipv6 + port).
pub const PEER_SLOT_SIZE: usize = 18;

/// Body size of a bulk-pull request (start account + end hash).
pub const BULK_PULL_SIZE: usize = 64;

/// Body size of a frontier request (start + age + count).
pub const FRONTIER_REQ_SIZE: usize = 40;

const UNSPECIFIED: SocketAddrV6 = SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, 0, 0, 0);

/// Peer exchange; unknown slots are zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keepalive {
    pub peers: [SocketAddrV6; KEEPALIVE_PEERS],
}

impl Default for Keepalive {
    fn default() -> Self {
        Self {
            peers: [UNSPECIFIED; KEEPALIVE_PEERS],
        }
    }
}

impl Keepalive {
    pub fn with_peers(listed: &[SocketAddrV6]) -> Self {
        let mut keepalive = Self::default();
        for (slot, peer) in keepalive.peers.iter_mut().zip(listed) {
            *slot = *peer;
        }
        keepalive
    }
}

/// A block broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Publish {
    pub block: Block,
}

/// Ask representatives to vote on a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmReq {
    pub block: Block,
}

/// A representative's vote: signature over Blake2b(block hash ‖ sequence).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmAck {
    pub account: Account,
    pub signature: Signature,
    pub sequence: u64,
    pub block: Block,
}

/// TCP request for an account chain, newest first, back to (excluding) `end`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BulkPull {
    pub start: Account,
    pub end: BlockHash,
}

/// TCP request for (account, head) pairs from `start`, at most `count`,
/// skipping accounts untouched for more than `age` seconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrontierReq {
    pub start: Account,
    pub age: u32,
    pub count: u32,
}

/// Any wire message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Keepalive(Keepalive),
    Publish(Publish),
    ConfirmReq(ConfirmReq),
    ConfirmAck(ConfirmAck),
    BulkPull(BulkPull),
    BulkPush,
    FrontierReq(FrontierReq),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Keepalive(_) => MessageType::Keepalive,
            Self::Publish(_) => MessageType::Publish,
            Self::ConfirmReq(_) => MessageType::ConfirmReq,
            Self::ConfirmAck(_) => MessageType::ConfirmAck,
            Self::BulkPull(_) => MessageType::BulkPull,
            Self::BulkPush => MessageType::BulkPush,
            Self::FrontierReq(_) => MessageType::FrontierReq,
        }
    }

    /// Serialize header and body for `network`.
    pub fn serialize(&self, network: Network) -> Vec<u8> {
        let mut header = MessageHeader::new(network, self.message_type());
        if let Some(block) = self.block() {
            header.set_block_type(block.block_type());
        }

        let mut buf = Vec::with_capacity(HEADER_SIZE + 256);
        header.serialize(&mut buf);
        match self {
            Self::Keepalive(keepalive) => {
                for peer in &keepalive.peers {
                    buf.extend_from_slice(&peer.ip().octets());
                    buf.extend_from_slice(&peer.port().to_le_bytes());
                }
            }
            Self::Publish(publish) => publish.block.serialize_body(&mut buf),
            Self::ConfirmReq(request) => request.block.serialize_body(&mut buf),
            Self::ConfirmAck(ack) => {
                buf.extend_from_slice(ack.account.as_bytes());
                buf.extend_from_slice(ack.signature.as_bytes());
                buf.extend_from_slice(&ack.sequence.to_le_bytes());
                ack.block.serialize_body(&mut buf);
            }
            Self::BulkPull(pull) => {
                buf.extend_from_slice(pull.start.as_bytes());
                buf.extend_from_slice(pull.end.as_bytes());
            }
            Self::BulkPush => {}
            Self::FrontierReq(request) => {
                buf.extend_from_slice(request.start.as_bytes());
                buf.extend_from_slice(&request.age.to_le_bytes());
                buf.extend_from_slice(&request.count.to_le_bytes());
            }
        }
        buf
    }

    /// Parse a whole datagram for `network`. Foreign or malformed packets
    /// yield `None`.
    pub fn deserialize(buf: &[u8], network: Network) -> Option<Message> {
        let mut reader = WireReader::new(buf);
        let header = MessageHeader::deserialize(&mut reader)?;
        if header.network != network {
            return None;
        }
        let message = Self::deserialize_body(&header, &mut reader)?;
        reader.is_empty().then_some(message)
    }

    /// Parse a body given an already-read header.
    pub fn deserialize_body(header: &MessageHeader, reader: &mut WireReader) -> Option<Message> {
        match header.message_type {
            MessageType::Keepalive => {
                let mut peers = [UNSPECIFIED; KEEPALIVE_PEERS];
                for slot in &mut peers {
                    let octets = reader.read_bytes_16()?;
                    let port = reader.read_u16_le()?;
                    *slot = SocketAddrV6::new(Ipv6Addr::from(octets), port, 0, 0);
                }
                Some(Message::Keepalive(Keepalive { peers }))
            }
            MessageType::Publish => {
                let block = Block::deserialize_body(header.block_type()?, reader)?;
                Some(Message::Publish(Publish { block }))
            }
            MessageType::ConfirmReq => {
                let block = Block::deserialize_body(header.block_type()?, reader)?;
                Some(Message::ConfirmReq(ConfirmReq { block }))
            }
            MessageType::ConfirmAck => {
                let account = reader.read_account()?;
                let signature = reader.read_signature()?;
                let sequence = reader.read_u64_le()?;
                let block = Block::deserialize_body(header.block_type()?, reader)?;
                Some(Message::ConfirmAck(ConfirmAck {
                    account,
                    signature,
                    sequence,
                    block,
                }))
            }
            MessageType::BulkPull => Some(Message::BulkPull(BulkPull {
                start: reader.read_account()?,
                end: reader.read_hash()?,
            })),
            MessageType::BulkPush => Some(Message::BulkPush),
            MessageType::FrontierReq => Some(Message::FrontierReq(FrontierReq {
                start: reader.read_account()?,
                age: reader.read_u32_le()?,
                count: reader.read_u32_le()?,
            })),
            MessageType::Invalid | MessageType::NotAType => None,
        }
    }

    fn block(&self) -> Option<&Block> {
        match self {
            Self::Publish(publish) => Some(&publish.block),
            Self::ConfirmReq(request) => Some(&request.block),
            Self::ConfirmAck(ack) => Some(&ack.block),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rai_ledger::SendBlock;
    use rai_types::Amount;

    fn sample_block() -> Block {
        Block::Send(SendBlock {
            previous: BlockHash::new([1; 32]),
            destination: Account::new([2; 32]),
            balance: Amount::new(42),
            signature: Signature::new([3; 64]),
            work: 0xAABBCCDD,
        })
    }

    fn round_trip(message: Message) {
        let bytes = message.serialize(Network::Test);
        let parsed = Message::deserialize(&bytes, Network::Test).expect("round trip");
        assert_eq!(parsed, message);
    }

    #[test]
    fn keepalive_round_trip() {
        let peers = [
            SocketAddrV6::new(Ipv6Addr::LOCALHOST, 7075, 0, 0),
            SocketAddrV6::new(Ipv6Addr::new(0, 0, 0, 0, 0, 0xFFFF, 0x7F00, 1), 54000, 0, 0),
        ];
        round_trip(Message::Keepalive(Keepalive::with_peers(&peers)));
    }

    #[test]
    fn keepalive_body_is_exactly_eight_slots() {
        let bytes = Message::Keepalive(Keepalive::default()).serialize(Network::Test);
        assert_eq!(bytes.len(), HEADER_SIZE + KEEPALIVE_PEERS * PEER_SLOT_SIZE);
    }

    #[test]
    fn publish_round_trip() {
        round_trip(Message::Publish(Publish {
            block: sample_block(),
        }));
    }

    #[test]
    fn confirm_ack_round_trip() {
        round_trip(Message::ConfirmAck(ConfirmAck {
            account: Account::new([7; 32]),
            signature: Signature::new([8; 64]),
            sequence: 99,
            block: sample_block(),
        }));
    }

    #[test]
    fn bulk_pull_and_frontier_req_round_trip() {
        round_trip(Message::BulkPull(BulkPull {
            start: Account::new([9; 32]),
            end: BlockHash::ZERO,
        }));
        round_trip(Message::FrontierReq(FrontierReq {
            start: Account::ZERO,
            age: u32::MAX,
            count: 1000,
        }));
    }

    #[test]
    fn foreign_network_is_dropped() {
        let bytes = Message::BulkPush.serialize(Network::Beta);
        assert!(Message::deserialize(&bytes, Network::Test).is_none());
        assert!(Message::deserialize(&bytes, Network::Beta).is_some());
    }

    #[test]
    fn truncated_packet_is_dropped() {
        let bytes = Message::Publish(Publish {
            block: sample_block(),
        })
        .serialize(Network::Test);
        assert!(Message::deserialize(&bytes[..bytes.len() - 3], Network::Test).is_none());
    }

    #[test]
    fn trailing_bytes_are_dropped() {
        let mut bytes = Message::BulkPush.serialize(Network::Test);
        bytes.push(0);
        assert!(Message::deserialize(&bytes, Network::Test).is_none());
    }

    #[test]
    fn publish_without_block_type_is_dropped() {
        // A publish header whose extensions carry no block type.
        let mut buf = Vec::new();
        MessageHeader::new(Network::Test, MessageType::Publish).serialize(&mut buf);
        buf.extend_from_slice(&[0u8; 152]);
        assert!(Message::deserialize(&buf, Network::Test).is_none());
    }
}
