//! The 8-byte envelope preceding every message.
//!
//! Layout: magic `b'R'`, network byte, version max/using/min, type tag,
//! extensions u16 (little-endian). Extension bit 0 flags an ipv4-only
//! sender; bits 8–12 carry the block type when the message body contains a
//! block, letting receivers size their reads before parsing.

use rai_ledger::BlockType;
use rai_types::{Network, WireReader};

/// Protocol version triple advertised in every header.
pub const VERSION_MAX: u8 = 1;
pub const VERSION_USING: u8 = 1;
pub const VERSION_MIN: u8 = 1;

/// Serialized header length.
pub const HEADER_SIZE: usize = 8;

const EXTENSION_IPV4_ONLY: u16 = 0x0001;
const BLOCK_TYPE_SHIFT: u16 = 8;
const BLOCK_TYPE_MASK: u16 = 0x0F00;

/// Message type tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    Invalid = 0,
    NotAType = 1,
    Keepalive = 2,
    Publish = 3,
    ConfirmReq = 4,
    ConfirmAck = 5,
    BulkPull = 6,
    BulkPush = 7,
    FrontierReq = 8,
}

impl MessageType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Invalid),
            1 => Some(Self::NotAType),
            2 => Some(Self::Keepalive),
            3 => Some(Self::Publish),
            4 => Some(Self::ConfirmReq),
            5 => Some(Self::ConfirmAck),
            6 => Some(Self::BulkPull),
            7 => Some(Self::BulkPush),
            8 => Some(Self::FrontierReq),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageHeader {
    pub network: Network,
    pub version_max: u8,
    pub version_using: u8,
    pub version_min: u8,
    pub message_type: MessageType,
    pub extensions: u16,
}

impl MessageHeader {
    pub fn new(network: Network, message_type: MessageType) -> Self {
        Self {
            network,
            version_max: VERSION_MAX,
            version_using: VERSION_USING,
            version_min: VERSION_MIN,
            message_type,
            extensions: 0,
        }
    }

    /// Block type carried in the extension bits, for block-bearing messages.
    pub fn block_type(&self) -> Option<BlockType> {
        BlockType::from_u8(((self.extensions & BLOCK_TYPE_MASK) >> BLOCK_TYPE_SHIFT) as u8)
    }

    pub fn set_block_type(&mut self, block_type: BlockType) {
        self.extensions = (self.extensions & !BLOCK_TYPE_MASK)
            | ((block_type.as_u8() as u16) << BLOCK_TYPE_SHIFT);
    }

    pub fn ipv4_only(&self) -> bool {
        self.extensions & EXTENSION_IPV4_ONLY != 0
    }

    pub fn set_ipv4_only(&mut self, value: bool) {
        if value {
            self.extensions |= EXTENSION_IPV4_ONLY;
        } else {
            self.extensions &= !EXTENSION_IPV4_ONLY;
        }
    }

    pub fn serialize(&self, buf: &mut Vec<u8>) {
        buf.push(b'R');
        buf.push(self.network.magic());
        buf.push(self.version_max);
        buf.push(self.version_using);
        buf.push(self.version_min);
        buf.push(self.message_type.as_u8());
        buf.extend_from_slice(&self.extensions.to_le_bytes());
    }

    /// Parse a header, rejecting foreign magic and unknown types.
    pub fn deserialize(reader: &mut WireReader) -> Option<Self> {
        if reader.read_u8()? != b'R' {
            return None;
        }
        let network = match reader.read_u8()? {
            b'A' => Network::Live,
            b'B' => Network::Beta,
            b'C' => Network::Test,
            _ => return None,
        };
        let version_max = reader.read_u8()?;
        let version_using = reader.read_u8()?;
        let version_min = reader.read_u8()?;
        let message_type = MessageType::from_u8(reader.read_u8()?)?;
        let extensions = reader.read_u16_le()?;
        Some(Self {
            network,
            version_max,
            version_using,
            version_min,
            message_type,
            extensions,
        })
    }
}
