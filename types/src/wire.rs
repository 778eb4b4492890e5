//! Cursor over received bytes for the fixed-width wire codecs.
//!
//! Every read returns `None` once the buffer is exhausted; deserializers
//! propagate that and the whole packet is dropped. Scalars are little-endian,
//! 32/64-byte fields are raw.

use crate::{Account, Amount, BlockHash, Signature};

/// A non-consuming reader over a byte slice.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.remaining() < n {
            return None;
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Some(slice)
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|s| s[0])
    }

    pub fn read_u16_le(&mut self) -> Option<u16> {
        self.take(2).map(|s| u16::from_le_bytes([s[0], s[1]]))
    }

    pub fn read_u32_le(&mut self) -> Option<u32> {
        self.take(4)
            .map(|s| u32::from_le_bytes(s.try_into().unwrap()))
    }

    pub fn read_u64_le(&mut self) -> Option<u64> {
        self.take(8)
            .map(|s| u64::from_le_bytes(s.try_into().unwrap()))
    }

    pub fn read_bytes_32(&mut self) -> Option<[u8; 32]> {
        self.take(32).map(|s| s.try_into().unwrap())
    }

    pub fn read_bytes_64(&mut self) -> Option<[u8; 64]> {
        self.take(64).map(|s| s.try_into().unwrap())
    }

    pub fn read_bytes_16(&mut self) -> Option<[u8; 16]> {
        self.take(16).map(|s| s.try_into().unwrap())
    }

    pub fn read_hash(&mut self) -> Option<BlockHash> {
        self.read_bytes_32().map(BlockHash::new)
    }

    pub fn read_account(&mut self) -> Option<Account> {
        self.read_bytes_32().map(Account::new)
    }

    pub fn read_amount(&mut self) -> Option<Amount> {
        self.read_bytes_16().map(Amount::from_le_bytes)
    }

    pub fn read_signature(&mut self) -> Option<Signature> {
        self.read_bytes_64().map(Signature::new)
    }
}
