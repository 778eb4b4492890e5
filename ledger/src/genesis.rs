//! Hard-coded genesis blocks.
//!
//! The genesis open block mints the entire supply (2^128 − 1 raw) to the
//! genesis account and is written directly into an empty store; it never
//! passes through the validator. Each network variant has its own genesis so
//! chains cannot be replayed across variants.
//!
//! The test key is public on purpose: unit tests need to sign blocks that
//! spend from genesis.

use crate::block::{Block, OpenBlock};
use rai_crypto::keypair_from_private;
use rai_types::{Account, BlockHash, KeyPair, Network, RawKey, Signature};

/// Private key of the test-network genesis account.
pub const TEST_GENESIS_KEY: &str =
    "34F0A37AAD20F4A260F0A5B3CB3D7FB50673212263E58A380BC10474BB039CE4";

const BETA_GENESIS_ACCOUNT: &str =
    "9D3A5B66B478670455B241D6BAC3D3FE1CBB7E7B7EAA429FA036C2704C3DC0A4";
const BETA_GENESIS_SIGNATURE: &str =
    "BD0D374FCEB33EAABDF728E9B4DCDBF3B226DA97EEAB8EA5B7EDE286B1282C24D6EB544644FE871235E4F58CD94DF66D9C555309895F67A7D1F922AAC12CE907";
const BETA_GENESIS_WORK: u64 = 0x6EB1_2D4C_42DB_A31E;

const LIVE_GENESIS_ACCOUNT: &str =
    "E89208DD038FBB269987689621D52292AE9C35941A7484756ECCED92A65093BA";
const LIVE_GENESIS_SIGNATURE: &str =
    "9F0C933C8ADE004D808EA1985FA746A7E95BA2A38F867640F53EC8F180BDFE9E2C1268DEAD7C2664F356E37ABA362BC58E46DBA03E523A7B5A19E4B6EB12BB02";
const LIVE_GENESIS_WORK: u64 = 0x62F0_5417_DD3F_B691;

/// The genesis block and account for one network variant.
#[derive(Clone)]
pub struct Genesis {
    pub account: Account,
    pub block: Block,
    pub hash: BlockHash,
}

impl Genesis {
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Test => Self::signed_from_key(test_genesis_keypair()),
            Network::Beta => Self::from_constants(
                BETA_GENESIS_ACCOUNT,
                BETA_GENESIS_SIGNATURE,
                BETA_GENESIS_WORK,
            ),
            Network::Live => Self::from_constants(
                LIVE_GENESIS_ACCOUNT,
                LIVE_GENESIS_SIGNATURE,
                LIVE_GENESIS_WORK,
            ),
        }
    }

    fn signed_from_key(keys: KeyPair) -> Self {
        let mut block = Block::Open(OpenBlock {
            source: keys.account.as_root(),
            representative: keys.account,
            account: keys.account,
            signature: Signature::ZERO,
            work: 0,
        });
        block.sign(&keys.private);
        let hash = block.hash();
        Self {
            account: keys.account,
            block,
            hash,
        }
    }

    fn from_constants(account_hex: &str, signature_hex: &str, work: u64) -> Self {
        let account = Account::from_hex(account_hex).expect("genesis account constant");
        let mut signature = [0u8; 64];
        hex::decode_to_slice(signature_hex, &mut signature).expect("genesis signature constant");
        let block = Block::Open(OpenBlock {
            source: account.as_root(),
            representative: account,
            account,
            signature: Signature::new(signature),
            work,
        });
        let hash = block.hash();
        Self {
            account,
            block,
            hash,
        }
    }
}

/// Key pair of the test genesis account.
pub fn test_genesis_keypair() -> KeyPair {
    let key = RawKey::from_hex(TEST_GENESIS_KEY).expect("test genesis key constant");
    keypair_from_private(key)
}
