//! Network variants.
//!
//! The variant selects the genesis block, the account prefix, the message
//! magic, and the proof-of-work threshold. Nodes on different variants
//! ignore each other's traffic via the magic byte.

use serde::{Deserialize, Serialize};

/// Identifies which rai network a node participates in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// The production network.
    Live,
    /// The public staging network.
    Beta,
    /// Local development and unit tests.
    Test,
}

impl Network {
    /// Second byte of the message magic (the first is always `b'R'`).
    pub fn magic(&self) -> u8 {
        match self {
            Self::Live => b'A',
            Self::Beta => b'B',
            Self::Test => b'C',
        }
    }

    /// Default peering port.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Live => 7075,
            Self::Beta => 54000,
            Self::Test => 44000,
        }
    }

    /// Threshold a block's work value must strictly exceed.
    ///
    /// The test threshold is deliberately tiny so tests can stamp work in
    /// microseconds.
    pub fn work_threshold(&self) -> u64 {
        match self {
            Self::Live => 0xFFFF_FFC0_0000_0000,
            Self::Beta => 0xFFFF_FE00_0000_0000,
            Self::Test => 0xFF00_0000_0000_0000,
        }
    }

    /// Human-facing account prefix for this variant.
    pub fn account_prefix(&self) -> &'static str {
        match self {
            Self::Live => "xrb_",
            Self::Beta | Self::Test => "ppr_",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Beta => "beta",
            Self::Test => "test",
        }
    }
}
