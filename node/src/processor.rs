//! The block and vote pipeline.
//!
//! Inbound blocks pass the work gate, then the ledger validator. Gap results
//! park the block in the `unchecked` sub-space until the missing dependency
//! arrives; a fork starts an election on the contested root. Inbound votes
//! are signature-checked, tallied, and a crossed threshold flips the ledger
//! tip when the confirmed winner differs from it.

use crate::stats::Stats;
use rai_consensus::{Conflicts, Vote};
use rai_ledger::{Block, Ledger, ProcessResult};
use rai_store::UncheckedEntry;
use rai_types::{Account, Amount, BlockHash, Timestamp};
use std::sync::Arc;

/// Which dependency a parked block waits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GapKind {
    Previous,
    Source,
}

/// Outcome of ingesting one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestResult {
    /// Applied (and any parked dependents with it). Worth republishing.
    Progress {
        account: Account,
        amount: Amount,
        hash: BlockHash,
    },
    /// Work nonce below threshold; dropped.
    BadWork,
    /// Parked in `unchecked` awaiting a dependency.
    Parked(GapKind),
    /// Contested root; an election is running.
    Fork,
    /// Already in the ledger.
    Old,
    /// Terminal rejection.
    Rejected(ProcessResult),
}

/// What a confirmed election did to the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmOutcome {
    pub root: BlockHash,
    pub winner: BlockHash,
    /// True when the previous tip was rolled back in favour of the winner.
    pub flipped: bool,
}

pub struct Processor {
    ledger: Arc<Ledger>,
    conflicts: Arc<Conflicts>,
    stats: Arc<Stats>,
    work_threshold: u64,
}

impl Processor {
    pub fn new(ledger: Arc<Ledger>, conflicts: Arc<Conflicts>, stats: Arc<Stats>) -> Self {
        let work_threshold = ledger.network().work_threshold();
        Self {
            ledger,
            conflicts,
            stats,
            work_threshold,
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn conflicts(&self) -> &Arc<Conflicts> {
        &self.conflicts
    }

    /// Run one block through work gate and validator.
    pub fn ingest(&self, block: &Block, now: Timestamp) -> Result<IngestResult, rai_ledger::LedgerError> {
        let hash = block.hash();
        if !block.verify_work(self.work_threshold) {
            self.stats.inc("drop.bad_work");
            tracing::debug!(block = %hash, "insufficient work");
            return Ok(IngestResult::BadWork);
        }

        let mut txn = self.ledger.store.begin_write()?;
        let result = self.ledger.process(&mut txn, block)?;
        match result {
            ProcessResult::Progress { account, amount } => {
                self.stats.inc("block.accepted");
                tracing::debug!(block = %hash, %account, "block accepted");
                // Anything parked on this hash can now be retried, and each
                // success may unpark more.
                let mut queue = self.ledger.store.unchecked.drain_dependents(&mut txn, &hash)?;
                while let Some(entry) = queue.pop() {
                    let Some(dependent) = Block::from_bytes(&entry.block_bytes) else {
                        continue;
                    };
                    match self.ledger.process(&mut txn, &dependent)? {
                        ProcessResult::Progress { .. } => {
                            self.stats.inc("block.accepted");
                            let unparked = self
                                .ledger
                                .store
                                .unchecked
                                .drain_dependents(&mut txn, &dependent.hash())?;
                            queue.extend(unparked);
                        }
                        ProcessResult::GapPrevious => {
                            self.ledger.store.unchecked.put(
                                &mut txn,
                                &dependent.previous(),
                                &dependent.hash(),
                                &entry,
                            )?;
                        }
                        ProcessResult::GapSource => {
                            let source = dependent.source().unwrap_or(BlockHash::ZERO);
                            self.ledger.store.unchecked.put(
                                &mut txn,
                                &source,
                                &dependent.hash(),
                                &entry,
                            )?;
                        }
                        other => {
                            tracing::debug!(block = %dependent.hash(), code = ?other, "parked dependent rejected");
                        }
                    }
                }
                txn.commit()?;
                Ok(IngestResult::Progress {
                    account,
                    amount,
                    hash,
                })
            }
            ProcessResult::GapPrevious => {
                self.stats.inc("gap.previous");
                self.park(txn, &block.previous(), &hash, block, now)?;
                Ok(IngestResult::Parked(GapKind::Previous))
            }
            ProcessResult::GapSource => {
                self.stats.inc("gap.source");
                let source = block.source().unwrap_or(BlockHash::ZERO);
                self.park(txn, &source, &hash, block, now)?;
                Ok(IngestResult::Parked(GapKind::Source))
            }
            ProcessResult::Fork => {
                self.stats.inc("fork");
                let incumbent = self.ledger.block_at_root(&txn, &block.root())?;
                drop(txn);
                match incumbent {
                    Some(incumbent) => {
                        let root = block.root();
                        if self.conflicts.start(root, incumbent, now) {
                            tracing::info!(%root, challenger = %hash, "fork detected, election started");
                        }
                        Ok(IngestResult::Fork)
                    }
                    // Root vanished between checks; treat as a plain reject.
                    None => Ok(IngestResult::Rejected(ProcessResult::Fork)),
                }
            }
            ProcessResult::Old => {
                self.stats.inc("block.old");
                Ok(IngestResult::Old)
            }
            ProcessResult::BadSignature => {
                self.stats.inc("drop.bad_signature");
                Ok(IngestResult::Rejected(ProcessResult::BadSignature))
            }
            other => {
                self.stats.inc("block.rejected");
                tracing::debug!(block = %hash, code = ?other, "block rejected");
                Ok(IngestResult::Rejected(other))
            }
        }
    }

    fn park(
        &self,
        mut txn: rai_store::WriteTransaction<'_>,
        dependency: &BlockHash,
        hash: &BlockHash,
        block: &Block,
        now: Timestamp,
    ) -> Result<(), rai_ledger::LedgerError> {
        let entry = UncheckedEntry {
            arrival: now.as_secs(),
            block_bytes: block.serialize(),
        };
        self.ledger
            .store
            .unchecked
            .put(&mut txn, dependency, hash, &entry)?;
        txn.commit()?;
        tracing::debug!(block = %hash, waiting_on = %dependency, "block parked");
        Ok(())
    }

    /// Apply an inbound vote; flip the ledger if this confirmed a new winner.
    pub fn apply_vote(
        &self,
        vote: &Vote,
        now: Timestamp,
    ) -> Result<Option<ConfirmOutcome>, rai_ledger::LedgerError> {
        if !vote.validate() {
            self.stats.inc("drop.bad_vote");
            return Ok(None);
        }

        let confirmed = {
            let txn = self.ledger.store.begin_read()?;
            self.conflicts.update(
                vote,
                |account| {
                    self.ledger
                        .weight(&txn, account)
                        .unwrap_or(Amount::ZERO)
                },
                now,
            )
        };
        let Some(confirmed) = confirmed else {
            return Ok(None);
        };

        self.stats.inc("election.confirmed");
        let winner = confirmed.winner;
        let winner_hash = winner.hash();
        let root = winner.root();

        let mut txn = self.ledger.store.begin_write()?;
        let tip = self.ledger.block_at_root(&txn, &root)?;
        let flipped = match tip {
            Some(tip) if tip.hash() != winner_hash => {
                tracing::info!(%root, loser = %tip.hash(), winner = %winner_hash, tally = %confirmed.tally, "election flipped the tip");
                self.ledger.rollback(&mut txn, &tip.hash())?;
                let result = self.ledger.process(&mut txn, &winner)?;
                if !result.is_progress() {
                    tracing::warn!(%root, code = ?result, "confirmed winner did not apply cleanly");
                }
                self.stats.inc("election.flipped");
                true
            }
            _ => false,
        };
        txn.commit()?;
        Ok(Some(ConfirmOutcome {
            root,
            winner: winner_hash,
            flipped,
        }))
    }
}
