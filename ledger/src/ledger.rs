//! The ledger: block storage plus the chain-walk queries shared by the
//! validator, rollback, consensus, and bootstrap.
//!
//! All derived relations (owning account, balance at a block, representative
//! at a block) are computed by walking `previous` pointers; only the
//! explicitly stored records in the account/pending/representation/frontier
//! sub-spaces are authoritative.

use crate::block::{Block, OpenBlock};
use crate::genesis::Genesis;
use crate::LedgerError;
use rai_store::{AccountInfo, RoTxn, RwTxn, Store};
use rai_types::{Account, Amount, BlockHash, Network, Timestamp, GENESIS_AMOUNT};

pub struct Ledger {
    pub store: Store,
    genesis: Genesis,
    network: Network,
}

impl Ledger {
    /// Wrap a store, writing the genesis block if the store is empty.
    ///
    /// A non-empty store that lacks this network's genesis was created for a
    /// different variant (or is damaged) and is rejected outright.
    pub fn new(store: Store, network: Network) -> Result<Self, LedgerError> {
        let genesis = Genesis::for_network(network);
        let ledger = Self {
            store,
            genesis,
            network,
        };
        ledger.ensure_genesis()?;
        Ok(ledger)
    }

    fn ensure_genesis(&self) -> Result<(), LedgerError> {
        let mut txn = self.store.begin_write()?;
        if self.store.accounts.count(&txn)? == 0 {
            let hash = self.genesis.hash;
            self.store
                .blocks
                .put(&mut txn, &hash, &self.genesis.block.serialize())?;
            self.checksum_update(&mut txn, &hash)?;
            let info = AccountInfo {
                head: hash,
                rep_block: hash,
                open_block: hash,
                balance: GENESIS_AMOUNT,
                modified: Timestamp::now().as_secs(),
                block_count: 1,
            };
            self.store
                .accounts
                .put(&mut txn, &self.genesis.account, &info)?;
            self.store
                .frontiers
                .put(&mut txn, &hash, &self.genesis.account)?;
            self.store
                .representation
                .put(&mut txn, &self.genesis.account, GENESIS_AMOUNT)?;
            txn.commit()?;
            tracing::info!(network = self.network.as_str(), genesis = %hash, "initialized empty ledger");
            Ok(())
        } else if self.store.blocks.exists(&txn, &self.genesis.hash)? {
            Ok(())
        } else {
            Err(LedgerError::GenesisMismatch)
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn supply(&self) -> Amount {
        GENESIS_AMOUNT
    }

    pub fn genesis_account(&self) -> Account {
        self.genesis.account
    }

    pub fn genesis_hash(&self) -> BlockHash {
        self.genesis.hash
    }

    // ── Point queries ──────────────────────────────────────────────────

    pub fn get_block(&self, txn: &RoTxn, hash: &BlockHash) -> Result<Option<Block>, LedgerError> {
        match self.store.blocks.get(txn, hash)? {
            Some(bytes) => Block::from_bytes(&bytes)
                .map(Some)
                .ok_or_else(|| LedgerError::Corrupt(format!("undecodable block {hash}"))),
            None => Ok(None),
        }
    }

    pub fn block_exists(&self, txn: &RoTxn, hash: &BlockHash) -> Result<bool, LedgerError> {
        Ok(self.store.blocks.exists(txn, hash)?)
    }

    pub fn block_count(&self, txn: &RoTxn) -> Result<u64, LedgerError> {
        Ok(self.store.blocks.count(txn)?)
    }

    pub fn account_info(
        &self,
        txn: &RoTxn,
        account: &Account,
    ) -> Result<Option<AccountInfo>, LedgerError> {
        Ok(self.store.accounts.get(txn, account)?)
    }

    /// Head hash of an account's chain, if opened.
    pub fn latest(&self, txn: &RoTxn, account: &Account) -> Result<Option<BlockHash>, LedgerError> {
        Ok(self.store.accounts.get(txn, account)?.map(|info| info.head))
    }

    /// Balance at an account's head (zero for unopened accounts).
    pub fn account_balance(&self, txn: &RoTxn, account: &Account) -> Result<Amount, LedgerError> {
        Ok(self
            .store
            .accounts
            .get(txn, account)?
            .map(|info| info.balance)
            .unwrap_or(Amount::ZERO))
    }

    /// Voting weight delegated to `representative`.
    pub fn weight(&self, txn: &RoTxn, representative: &Account) -> Result<Amount, LedgerError> {
        Ok(self.store.representation.get(txn, representative)?)
    }

    /// The running XOR over all stored block hashes.
    pub fn checksum(&self, txn: &RoTxn) -> Result<BlockHash, LedgerError> {
        Ok(self.store.checksum.get(txn, 0, 0)?)
    }

    pub(crate) fn checksum_update(
        &self,
        txn: &mut RwTxn,
        hash: &BlockHash,
    ) -> Result<(), LedgerError> {
        let value = self.store.checksum.get(txn, 0, 0)?;
        self.store.checksum.put(txn, 0, 0, &value.xor(hash))?;
        Ok(())
    }

    // ── Chain walks ────────────────────────────────────────────────────

    /// The account owning `hash`, or `None` if the block is unknown.
    pub fn account_of(
        &self,
        txn: &RoTxn,
        hash: &BlockHash,
    ) -> Result<Option<Account>, LedgerError> {
        let mut cur = *hash;
        loop {
            match self.get_block(txn, &cur)? {
                None => return Ok(None),
                Some(Block::Open(open)) => return Ok(Some(open.account)),
                Some(block) => cur = block.previous(),
            }
        }
    }

    /// The account balance immediately after `hash` was applied.
    pub fn balance_of(&self, txn: &RoTxn, hash: &BlockHash) -> Result<Amount, LedgerError> {
        let mut credited = Amount::ZERO;
        let mut cur = *hash;
        loop {
            let block = self
                .get_block(txn, &cur)?
                .ok_or(LedgerError::BlockNotFound(cur))?;
            match block {
                Block::Send(send) => {
                    return credited
                        .checked_add(send.balance)
                        .ok_or_else(|| LedgerError::Corrupt("balance overflow".into()))
                }
                Block::Receive(receive) => {
                    let amount = self.amount_of(txn, &receive.source)?;
                    credited = credited
                        .checked_add(amount)
                        .ok_or_else(|| LedgerError::Corrupt("balance overflow".into()))?;
                    cur = receive.previous;
                }
                Block::Open(open) => {
                    let amount = self.open_amount(txn, &open)?;
                    return credited
                        .checked_add(amount)
                        .ok_or_else(|| LedgerError::Corrupt("balance overflow".into()));
                }
                Block::Change(change) => cur = change.previous,
            }
        }
    }

    /// The amount moved by `hash`: sent, received, or zero for a change.
    pub fn amount_of(&self, txn: &RoTxn, hash: &BlockHash) -> Result<Amount, LedgerError> {
        let block = self
            .get_block(txn, hash)?
            .ok_or(LedgerError::BlockNotFound(*hash))?;
        match block {
            Block::Send(send) => {
                let previous = self.balance_of(txn, &send.previous)?;
                previous.checked_sub(send.balance).ok_or_else(|| {
                    LedgerError::Corrupt(format!("send {hash} exceeds prior balance"))
                })
            }
            Block::Receive(receive) => self.amount_of(txn, &receive.source),
            Block::Open(open) => self.open_amount(txn, &open),
            Block::Change(_) => Ok(Amount::ZERO),
        }
    }

    fn open_amount(&self, txn: &RoTxn, open: &OpenBlock) -> Result<Amount, LedgerError> {
        if open.account == self.genesis.account {
            Ok(GENESIS_AMOUNT)
        } else {
            self.amount_of(txn, &open.source)
        }
    }

    /// The representative in effect at `hash`.
    pub fn representative_of(&self, txn: &RoTxn, hash: &BlockHash) -> Result<Account, LedgerError> {
        let mut cur = *hash;
        loop {
            let block = self
                .get_block(txn, &cur)?
                .ok_or(LedgerError::BlockNotFound(cur))?;
            match block {
                Block::Open(open) => return Ok(open.representative),
                Block::Change(change) => return Ok(change.representative),
                other => cur = other.previous(),
            }
        }
    }

    /// Hash of the nearest block at or below `hash` that set a representative.
    pub fn rep_block_of(&self, txn: &RoTxn, hash: &BlockHash) -> Result<BlockHash, LedgerError> {
        let mut cur = *hash;
        loop {
            let block = self
                .get_block(txn, &cur)?
                .ok_or(LedgerError::BlockNotFound(cur))?;
            match block {
                Block::Open(_) | Block::Change(_) => return Ok(cur),
                other => cur = other.previous(),
            }
        }
    }

    /// The block that follows `hash` on its chain, if any.
    pub fn successor(&self, txn: &RoTxn, hash: &BlockHash) -> Result<Option<Block>, LedgerError> {
        let Some(account) = self.account_of(txn, hash)? else {
            return Ok(None);
        };
        let info = self
            .store
            .accounts
            .get(txn, &account)?
            .ok_or(LedgerError::AccountNotFound(account))?;
        if info.head == *hash {
            return Ok(None);
        }
        let mut cur = info.head;
        loop {
            let block = self
                .get_block(txn, &cur)?
                .ok_or(LedgerError::BlockNotFound(cur))?;
            if block.previous() == *hash {
                return Ok(Some(block));
            }
            cur = block.previous();
            if cur.is_zero() {
                return Ok(None);
            }
        }
    }

    /// The block currently occupying `root`, used to find the incumbent when
    /// a fork arrives.
    pub fn block_at_root(
        &self,
        txn: &RoTxn,
        root: &BlockHash,
    ) -> Result<Option<Block>, LedgerError> {
        if self.store.blocks.exists(txn, root)? {
            return self.successor(txn, root);
        }
        let account = Account::from(*root);
        match self.store.accounts.get(txn, &account)? {
            Some(info) => self.get_block(txn, &info.open_block),
            None => Ok(None),
        }
    }

    // ── Mutation helpers shared by process and rollback ────────────────

    pub(crate) fn move_representation(
        &self,
        txn: &mut RwTxn,
        from: &Account,
        to: &Account,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if from == to || amount.is_zero() {
            return Ok(());
        }
        self.sub_representation(txn, from, amount)?;
        self.add_representation(txn, to, amount)?;
        Ok(())
    }

    pub(crate) fn add_representation(
        &self,
        txn: &mut RwTxn,
        representative: &Account,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let weight = self.store.representation.get(txn, representative)?;
        let updated = weight
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Corrupt("representation overflow".into()))?;
        self.store
            .representation
            .put(txn, representative, updated)?;
        Ok(())
    }

    pub(crate) fn sub_representation(
        &self,
        txn: &mut RwTxn,
        representative: &Account,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let weight = self.store.representation.get(txn, representative)?;
        let updated = weight
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::Corrupt("representation underflow".into()))?;
        self.store
            .representation
            .put(txn, representative, updated)?;
        Ok(())
    }

    /// Advance (or rewind) an account head, keeping the frontier index in
    /// step with the account record.
    pub(crate) fn set_head(
        &self,
        txn: &mut RwTxn,
        account: &Account,
        old_head: Option<&BlockHash>,
        info: &AccountInfo,
    ) -> Result<(), LedgerError> {
        if let Some(old) = old_head {
            self.store.frontiers.del(txn, old)?;
        }
        self.store.frontiers.put(txn, &info.head, account)?;
        self.store.accounts.put(txn, account, info)?;
        Ok(())
    }

    /// Remove an account entirely (rollback of its open block).
    pub(crate) fn remove_account(
        &self,
        txn: &mut RwTxn,
        account: &Account,
        head: &BlockHash,
    ) -> Result<(), LedgerError> {
        self.store.frontiers.del(txn, head)?;
        self.store.accounts.del(txn, account)?;
        Ok(())
    }
}
