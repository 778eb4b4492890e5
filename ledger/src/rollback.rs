//! Rollback: the exact inverse of `process`.
//!
//! Unwinds an account chain from its head down to and including the target
//! block. Rolling back a send whose pending entry was already consumed first
//! cascades into the destination chain until the dependent receive or open is
//! undone; the recursion is bounded because every block has at most one
//! successor and every chain terminates at its open block.

use crate::block::{Block, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock};
use crate::ledger::Ledger;
use crate::LedgerError;
use rai_store::{AccountInfo, PendingInfo, PendingKey, RwTxn};
use rai_types::{Account, BlockHash, Timestamp};

impl Ledger {
    /// Undo `target` and every block above it on its chain.
    pub fn rollback(&self, txn: &mut RwTxn, target: &BlockHash) -> Result<(), LedgerError> {
        let account = self
            .account_of(txn, target)?
            .ok_or(LedgerError::RollbackTargetMissing(*target))?;
        loop {
            let info = self
                .store
                .accounts
                .get(txn, &account)?
                .ok_or(LedgerError::AccountNotFound(account))?;
            let head = info.head;
            self.rollback_head(txn, &account, &info)?;
            if head == *target {
                return Ok(());
            }
        }
    }

    fn rollback_head(
        &self,
        txn: &mut RwTxn,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), LedgerError> {
        let head = info.head;
        let block = self
            .get_block(txn, &head)?
            .ok_or(LedgerError::BlockNotFound(head))?;
        tracing::debug!(block = %head, kind = ?block.block_type(), "rolling back");
        match block {
            Block::Send(send) => self.rollback_send(txn, account, info, &head, &send),
            Block::Receive(receive) => self.rollback_receive(txn, account, info, &head, &receive),
            Block::Open(open) => self.rollback_open(txn, account, info, &head, &open),
            Block::Change(change) => self.rollback_change(txn, account, info, &head, &change),
        }
    }

    fn rollback_send(
        &self,
        txn: &mut RwTxn,
        account: &Account,
        info: &AccountInfo,
        hash: &BlockHash,
        send: &SendBlock,
    ) -> Result<(), LedgerError> {
        // If the destination already pocketed this send, unwind its chain one
        // head at a time until the dependent receive/open is undone and the
        // pending entry reappears.
        let key = PendingKey::new(send.destination, *hash);
        while self.store.pending.get(txn, &key)?.is_none() {
            let destination_head = self
                .latest(txn, &send.destination)?
                .ok_or_else(|| LedgerError::Corrupt(format!("send {hash} consumed but destination has no chain")))?;
            self.rollback(txn, &destination_head)?;
        }
        let pending = self
            .store
            .pending
            .get(txn, &key)?
            .ok_or_else(|| LedgerError::Corrupt("pending entry vanished during rollback".into()))?;
        self.store.pending.del(txn, &key)?;

        let representative = self.representative_of(txn, &info.rep_block)?;
        self.add_representation(txn, &representative, pending.amount)?;
        let balance = info
            .balance
            .checked_add(pending.amount)
            .ok_or_else(|| LedgerError::Corrupt("rollback overflows balance".into()))?;
        self.set_head(
            txn,
            account,
            Some(hash),
            &AccountInfo {
                head: send.previous,
                balance,
                modified: Timestamp::now().as_secs(),
                block_count: info.block_count - 1,
                ..*info
            },
        )?;
        self.store.blocks.del(txn, hash)?;
        self.checksum_update(txn, hash)?;
        Ok(())
    }

    fn rollback_receive(
        &self,
        txn: &mut RwTxn,
        account: &Account,
        info: &AccountInfo,
        hash: &BlockHash,
        receive: &ReceiveBlock,
    ) -> Result<(), LedgerError> {
        let amount = self.amount_of(txn, &receive.source)?;
        let source_account = self
            .account_of(txn, &receive.source)?
            .ok_or(LedgerError::BlockNotFound(receive.source))?;

        let representative = self.representative_of(txn, &info.rep_block)?;
        self.sub_representation(txn, &representative, amount)?;
        let balance = info
            .balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::Corrupt("rollback underflows balance".into()))?;
        self.set_head(
            txn,
            account,
            Some(hash),
            &AccountInfo {
                head: receive.previous,
                balance,
                modified: Timestamp::now().as_secs(),
                block_count: info.block_count - 1,
                ..*info
            },
        )?;
        self.store.blocks.del(txn, hash)?;
        self.checksum_update(txn, hash)?;
        self.store.pending.put(
            txn,
            &PendingKey::new(*account, receive.source),
            &PendingInfo {
                source: source_account,
                amount,
            },
        )?;
        Ok(())
    }

    fn rollback_open(
        &self,
        txn: &mut RwTxn,
        account: &Account,
        info: &AccountInfo,
        hash: &BlockHash,
        open: &OpenBlock,
    ) -> Result<(), LedgerError> {
        if *hash == self.genesis_hash() {
            return Err(LedgerError::Corrupt("refusing to roll back genesis".into()));
        }
        // The open is the head here, so the whole balance is the opened amount.
        let amount = info.balance;
        let source_account = self
            .account_of(txn, &open.source)?
            .ok_or(LedgerError::BlockNotFound(open.source))?;

        self.sub_representation(txn, &open.representative, amount)?;
        self.remove_account(txn, account, hash)?;
        self.store.blocks.del(txn, hash)?;
        self.checksum_update(txn, hash)?;
        self.store.pending.put(
            txn,
            &PendingKey::new(*account, open.source),
            &PendingInfo {
                source: source_account,
                amount,
            },
        )?;
        Ok(())
    }

    fn rollback_change(
        &self,
        txn: &mut RwTxn,
        account: &Account,
        info: &AccountInfo,
        hash: &BlockHash,
        change: &ChangeBlock,
    ) -> Result<(), LedgerError> {
        let previous_rep_block = self.rep_block_of(txn, &change.previous)?;
        let previous_representative = self.representative_of(txn, &previous_rep_block)?;
        self.move_representation(
            txn,
            &change.representative,
            &previous_representative,
            info.balance,
        )?;
        self.set_head(
            txn,
            account,
            Some(hash),
            &AccountInfo {
                head: change.previous,
                rep_block: previous_rep_block,
                modified: Timestamp::now().as_secs(),
                block_count: info.block_count - 1,
                ..*info
            },
        )?;
        self.store.blocks.del(txn, hash)?;
        self.checksum_update(txn, hash)?;
        Ok(())
    }
}
