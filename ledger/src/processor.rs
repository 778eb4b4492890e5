//! The ledger validator: applies one block under a write transaction.
//!
//! Checks run strictly before writes, so any non-progress result leaves the
//! transaction contents untouched. Callers abort or continue the transaction
//! as they see fit; a dropped transaction never commits.

use crate::block::{Block, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock};
use crate::ledger::Ledger;
use crate::LedgerError;
use rai_store::{AccountInfo, PendingInfo, PendingKey, RwTxn};
use rai_types::{Account, Amount, Timestamp};

/// Outcome of validating one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Applied. Carries the owning account and the amount moved.
    Progress { account: Account, amount: Amount },
    /// Hash already present; harmless re-receipt.
    Old,
    /// Signature does not verify under the signing account.
    BadSignature,
    /// Send whose new balance exceeds the previous balance.
    NegativeSpend,
    /// Valid-looking block contesting an occupied root.
    Fork,
    /// Receive/open for a send that was already consumed.
    Unreceivable,
    /// `previous` is not in the store.
    GapPrevious,
    /// Referenced source block is not in the store.
    GapSource,
    /// Referenced source block exists but is not a send.
    NotReceiveFromSend,
    /// Referenced send pays a different account.
    AccountMismatch,
}

impl ProcessResult {
    pub fn is_progress(&self) -> bool {
        matches!(self, ProcessResult::Progress { .. })
    }
}

impl Ledger {
    /// Validate `block` and, on progress, apply it to the store.
    pub fn process(&self, txn: &mut RwTxn, block: &Block) -> Result<ProcessResult, LedgerError> {
        match block {
            Block::Send(send) => self.process_send(txn, send),
            Block::Receive(receive) => self.process_receive(txn, receive),
            Block::Open(open) => self.process_open(txn, open),
            Block::Change(change) => self.process_change(txn, change),
        }
    }

    fn process_send(
        &self,
        txn: &mut RwTxn,
        send: &SendBlock,
    ) -> Result<ProcessResult, LedgerError> {
        let block = Block::Send(send.clone());
        let hash = block.hash();
        if self.store.blocks.exists(txn, &hash)? {
            return Ok(ProcessResult::Old);
        }
        if !self.store.blocks.exists(txn, &send.previous)? {
            return Ok(ProcessResult::GapPrevious);
        }
        let account = self
            .account_of(txn, &send.previous)?
            .ok_or(LedgerError::BlockNotFound(send.previous))?;
        if !block.verify_signature(&account) {
            return Ok(ProcessResult::BadSignature);
        }
        let previous_balance = self.balance_of(txn, &send.previous)?;
        if send.balance > previous_balance {
            return Ok(ProcessResult::NegativeSpend);
        }
        let info = self
            .store
            .accounts
            .get(txn, &account)?
            .ok_or(LedgerError::AccountNotFound(account))?;
        if info.head != send.previous {
            return Ok(ProcessResult::Fork);
        }

        let amount = previous_balance - send.balance;
        self.store.blocks.put(txn, &hash, &block.serialize())?;
        self.checksum_update(txn, &hash)?;
        let representative = self.representative_of(txn, &info.rep_block)?;
        self.sub_representation(txn, &representative, amount)?;
        self.store.pending.put(
            txn,
            &PendingKey::new(send.destination, hash),
            &PendingInfo {
                source: account,
                amount,
            },
        )?;
        self.set_head(
            txn,
            &account,
            Some(&send.previous),
            &AccountInfo {
                head: hash,
                balance: send.balance,
                modified: Timestamp::now().as_secs(),
                block_count: info.block_count + 1,
                ..info
            },
        )?;
        Ok(ProcessResult::Progress { account, amount })
    }

    fn process_receive(
        &self,
        txn: &mut RwTxn,
        receive: &ReceiveBlock,
    ) -> Result<ProcessResult, LedgerError> {
        let block = Block::Receive(receive.clone());
        let hash = block.hash();
        if self.store.blocks.exists(txn, &hash)? {
            return Ok(ProcessResult::Old);
        }
        let source = match self.get_block(txn, &receive.source)? {
            None => return Ok(ProcessResult::GapSource),
            Some(Block::Send(send)) => send,
            Some(_) => return Ok(ProcessResult::NotReceiveFromSend),
        };
        let pending_key = PendingKey::new(source.destination, receive.source);
        let Some(pending) = self.store.pending.get(txn, &pending_key)? else {
            return Ok(ProcessResult::Unreceivable);
        };
        if !self.store.blocks.exists(txn, &receive.previous)? {
            return Ok(ProcessResult::GapPrevious);
        }
        let account = self
            .account_of(txn, &receive.previous)?
            .ok_or(LedgerError::BlockNotFound(receive.previous))?;
        if account != source.destination {
            return Ok(ProcessResult::AccountMismatch);
        }
        if !block.verify_signature(&account) {
            return Ok(ProcessResult::BadSignature);
        }
        let info = self
            .store
            .accounts
            .get(txn, &account)?
            .ok_or(LedgerError::AccountNotFound(account))?;
        if info.head != receive.previous {
            return Ok(ProcessResult::Fork);
        }

        let amount = pending.amount;
        self.store.pending.del(txn, &pending_key)?;
        self.store.blocks.put(txn, &hash, &block.serialize())?;
        self.checksum_update(txn, &hash)?;
        let representative = self.representative_of(txn, &info.rep_block)?;
        self.add_representation(txn, &representative, amount)?;
        let balance = info
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Corrupt("receive overflows balance".into()))?;
        self.set_head(
            txn,
            &account,
            Some(&receive.previous),
            &AccountInfo {
                head: hash,
                balance,
                modified: Timestamp::now().as_secs(),
                block_count: info.block_count + 1,
                ..info
            },
        )?;
        Ok(ProcessResult::Progress { account, amount })
    }

    fn process_open(
        &self,
        txn: &mut RwTxn,
        open: &OpenBlock,
    ) -> Result<ProcessResult, LedgerError> {
        let block = Block::Open(open.clone());
        let hash = block.hash();
        if self.store.blocks.exists(txn, &hash)? {
            return Ok(ProcessResult::Old);
        }
        let source = match self.get_block(txn, &open.source)? {
            None => return Ok(ProcessResult::GapSource),
            Some(Block::Send(send)) => send,
            Some(_) => return Ok(ProcessResult::NotReceiveFromSend),
        };
        if source.destination != open.account {
            return Ok(ProcessResult::AccountMismatch);
        }
        let pending_key = PendingKey::new(open.account, open.source);
        let Some(pending) = self.store.pending.get(txn, &pending_key)? else {
            return Ok(ProcessResult::Unreceivable);
        };
        if self.store.accounts.get(txn, &open.account)?.is_some() {
            return Ok(ProcessResult::Fork);
        }
        if !block.verify_signature(&open.account) {
            return Ok(ProcessResult::BadSignature);
        }

        let amount = pending.amount;
        self.store.pending.del(txn, &pending_key)?;
        self.store.blocks.put(txn, &hash, &block.serialize())?;
        self.checksum_update(txn, &hash)?;
        self.add_representation(txn, &open.representative, amount)?;
        self.set_head(
            txn,
            &open.account,
            None,
            &AccountInfo {
                head: hash,
                rep_block: hash,
                open_block: hash,
                balance: amount,
                modified: Timestamp::now().as_secs(),
                block_count: 1,
            },
        )?;
        Ok(ProcessResult::Progress {
            account: open.account,
            amount,
        })
    }

    fn process_change(
        &self,
        txn: &mut RwTxn,
        change: &ChangeBlock,
    ) -> Result<ProcessResult, LedgerError> {
        let block = Block::Change(change.clone());
        let hash = block.hash();
        if self.store.blocks.exists(txn, &hash)? {
            return Ok(ProcessResult::Old);
        }
        if !self.store.blocks.exists(txn, &change.previous)? {
            return Ok(ProcessResult::GapPrevious);
        }
        let account = self
            .account_of(txn, &change.previous)?
            .ok_or(LedgerError::BlockNotFound(change.previous))?;
        let info = self
            .store
            .accounts
            .get(txn, &account)?
            .ok_or(LedgerError::AccountNotFound(account))?;
        if info.head != change.previous {
            return Ok(ProcessResult::Fork);
        }
        if !block.verify_signature(&account) {
            return Ok(ProcessResult::BadSignature);
        }

        self.store.blocks.put(txn, &hash, &block.serialize())?;
        self.checksum_update(txn, &hash)?;
        let old_representative = self.representative_of(txn, &info.rep_block)?;
        self.move_representation(txn, &old_representative, &change.representative, info.balance)?;
        self.set_head(
            txn,
            &account,
            Some(&change.previous),
            &AccountInfo {
                head: hash,
                rep_block: hash,
                modified: Timestamp::now().as_secs(),
                block_count: info.block_count + 1,
                ..info
            },
        )?;
        Ok(ProcessResult::Progress {
            account,
            amount: Amount::ZERO,
        })
    }
}
