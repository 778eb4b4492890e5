//! Bootstrap: frontier diff plus bulk pull over TCP.
//!
//! The server side answers `frontier_req` with (account, head) pairs and
//! `bulk_pull` with a newest-to-oldest block stream ending in a
//! `not_a_block` tag. The client side diffs the remote frontiers against its
//! own store, then runs parallel pulls (the connection target scales with
//! the square root of the local block count), staging each chain in the
//! `bootstrap` sub-space and replaying it oldest-first through the block
//! pipeline. Failed pulls are retried against alternate peers a bounded
//! number of times; partial progress is kept.

use crate::processor::{IngestResult, Processor};
use crate::stats::Stats;
use crate::NodeError;
use rai_ledger::{Block, BlockType, Ledger};
use rai_messages::{
    BulkPull, FrontierReq, Message, MessageHeader, MessageType, FRONTIER_REQ_SIZE, HEADER_SIZE,
};
use rai_types::{Account, BlockHash, Timestamp, WireReader};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Attempts per account before giving up on it.
const PULL_RETRIES: usize = 3;

/// One queued bulk pull.
#[derive(Clone, Debug)]
struct PullRequest {
    account: Account,
    end: BlockHash,
    attempts: usize,
}

/// Result of a completed bootstrap run.
#[derive(Clone, Debug, Default)]
pub struct BootstrapOutcome {
    pub pulled_accounts: u64,
    pub pulled_blocks: u64,
    pub failed_accounts: u64,
}

/// Parallel-connection target: √(block count), clamped to [1, max].
pub fn target_connections(block_count: u64, max: usize) -> usize {
    let root = (block_count as f64).sqrt().ceil() as usize;
    root.clamp(1, max.max(1))
}

// ── Server ─────────────────────────────────────────────────────────────

/// Serve frontier and bulk-pull requests on one inbound connection until the
/// peer hangs up or sends something unintelligible.
pub async fn serve(mut stream: TcpStream, ledger: Arc<Ledger>) -> Result<(), NodeError> {
    let network = ledger.network();
    loop {
        let mut header_buf = [0u8; HEADER_SIZE];
        match stream.read_exact(&mut header_buf).await {
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err.into()),
        }
        let Some(header) = MessageHeader::deserialize(&mut WireReader::new(&header_buf)) else {
            return Ok(());
        };
        if header.network != network {
            return Ok(());
        }
        match header.message_type {
            MessageType::FrontierReq => {
                let mut body = [0u8; FRONTIER_REQ_SIZE];
                stream.read_exact(&mut body).await?;
                let Some(Message::FrontierReq(request)) =
                    Message::deserialize_body(&header, &mut WireReader::new(&body))
                else {
                    return Ok(());
                };
                let response = frontier_response(&ledger, &request)?;
                stream.write_all(&response).await?;
            }
            MessageType::BulkPull => {
                let mut body = [0u8; rai_messages::BULK_PULL_SIZE];
                stream.read_exact(&mut body).await?;
                let Some(Message::BulkPull(request)) =
                    Message::deserialize_body(&header, &mut WireReader::new(&body))
                else {
                    return Ok(());
                };
                let response = bulk_pull_response(&ledger, &request)?;
                stream.write_all(&response).await?;
            }
            _ => return Ok(()),
        }
    }
}

/// (account, head) pairs from `start`, oldest-modified accounts filtered by
/// `age`, terminated by a zero pair.
fn frontier_response(ledger: &Ledger, request: &FrontierReq) -> Result<Vec<u8>, NodeError> {
    let txn = ledger.store.begin_read()?;
    let now = Timestamp::now().as_secs();
    let mut out = Vec::new();
    let mut emitted: u32 = 0;
    for entry in ledger.store.accounts.iter_from(&txn, &request.start)? {
        if emitted >= request.count {
            break;
        }
        let (account, info) = entry?;
        if now.saturating_sub(info.modified) > request.age as u64 {
            continue;
        }
        out.extend_from_slice(account.as_bytes());
        out.extend_from_slice(info.head.as_bytes());
        emitted += 1;
    }
    out.extend_from_slice(&[0u8; 64]);
    Ok(out)
}

/// The account's chain from head back toward (excluding) `end`, each block
/// tag-prefixed, terminated by `not_a_block`. An `end` that is not on the
/// chain streams the whole chain, which is exactly what a client whose
/// history diverged needs.
fn bulk_pull_response(ledger: &Ledger, request: &BulkPull) -> Result<Vec<u8>, NodeError> {
    let txn = ledger.store.begin_read()?;
    let mut out = Vec::new();
    if let Some(info) = ledger.account_info(&txn, &request.start)? {
        let mut cursor = info.head;
        while cursor != request.end && !cursor.is_zero() {
            let Some(block) = ledger.get_block(&txn, &cursor)? else {
                break;
            };
            out.extend_from_slice(&block.serialize());
            cursor = block.previous();
        }
    }
    out.push(BlockType::NotABlock.as_u8());
    Ok(out)
}

// ── Client ─────────────────────────────────────────────────────────────

struct PullState {
    queue: Mutex<VecDeque<PullRequest>>,
    /// Serializes use of the shared staging sub-space.
    stage: tokio::sync::Mutex<()>,
    pulled_accounts: AtomicU64,
    pulled_blocks: AtomicU64,
    failed_accounts: AtomicU64,
}

/// Sync this node from `peers`: frontier diff against the first reachable
/// peer, then parallel bulk pulls spread across all of them.
pub async fn run(
    processor: Arc<Processor>,
    stats: Arc<Stats>,
    peers: Vec<SocketAddr>,
    max_connections: usize,
) -> Result<BootstrapOutcome, NodeError> {
    if peers.is_empty() {
        return Err(NodeError::Bootstrap("no peers to bootstrap from".into()));
    }

    let pulls = frontier_diff(&processor, &peers).await?;
    if pulls.is_empty() {
        tracing::info!("frontiers match, nothing to pull");
        return Ok(BootstrapOutcome::default());
    }

    let block_count = {
        let ledger = processor.ledger();
        let txn = ledger.store.begin_read()?;
        ledger.block_count(&txn)?
    };
    let workers = target_connections(block_count, max_connections).min(pulls.len());
    tracing::info!(
        pulls = pulls.len(),
        workers,
        "starting bulk pulls"
    );

    let state = Arc::new(PullState {
        queue: Mutex::new(pulls.into()),
        stage: tokio::sync::Mutex::new(()),
        pulled_accounts: AtomicU64::new(0),
        pulled_blocks: AtomicU64::new(0),
        failed_accounts: AtomicU64::new(0),
    });

    let mut handles = Vec::new();
    for worker in 0..workers {
        let processor = processor.clone();
        let stats = stats.clone();
        let peers = peers.clone();
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            pull_worker(worker, processor, stats, peers, state).await;
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }

    Ok(BootstrapOutcome {
        pulled_accounts: state.pulled_accounts.load(Ordering::Relaxed),
        pulled_blocks: state.pulled_blocks.load(Ordering::Relaxed),
        failed_accounts: state.failed_accounts.load(Ordering::Relaxed),
    })
}

/// Fetch remote frontiers and decide, per account, what to pull.
async fn frontier_diff(
    processor: &Arc<Processor>,
    peers: &[SocketAddr],
) -> Result<Vec<PullRequest>, NodeError> {
    let mut last_error = None;
    for peer in peers {
        match fetch_frontiers(processor, *peer).await {
            Ok(pairs) => return Ok(compare_frontiers(processor.ledger(), &pairs)?),
            Err(err) => {
                tracing::warn!(%peer, error = %err, "frontier request failed");
                last_error = Some(err);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| NodeError::Bootstrap("no peers".into())))
}

async fn fetch_frontiers(
    processor: &Arc<Processor>,
    peer: SocketAddr,
) -> Result<Vec<(Account, BlockHash)>, NodeError> {
    let network = processor.ledger().network();
    let mut stream = TcpStream::connect(peer).await?;
    let request = Message::FrontierReq(FrontierReq {
        start: Account::ZERO,
        age: u32::MAX,
        count: u32::MAX,
    });
    stream.write_all(&request.serialize(network)).await?;

    let mut pairs = Vec::new();
    loop {
        let mut pair = [0u8; 64];
        stream.read_exact(&mut pair).await?;
        let mut reader = WireReader::new(&pair);
        let account = reader.read_account().expect("sized buffer");
        let head = reader.read_hash().expect("sized buffer");
        if account.is_zero() && head.is_zero() {
            return Ok(pairs);
        }
        pairs.push((account, head));
    }
}

fn compare_frontiers(
    ledger: &Arc<Ledger>,
    pairs: &[(Account, BlockHash)],
) -> Result<Vec<PullRequest>, NodeError> {
    let txn = ledger.store.begin_read()?;
    let mut pulls = Vec::new();
    for (account, remote_head) in pairs {
        match ledger.account_info(&txn, account)? {
            None => pulls.push(PullRequest {
                account: *account,
                end: BlockHash::ZERO,
                attempts: 0,
            }),
            Some(info) if info.head == *remote_head => {}
            Some(_) if ledger.block_exists(&txn, remote_head)? => {
                // The remote head is in our chain already: we are ahead.
            }
            Some(info) => pulls.push(PullRequest {
                account: *account,
                end: info.head,
                attempts: 0,
            }),
        }
    }
    Ok(pulls)
}

async fn pull_worker(
    worker: usize,
    processor: Arc<Processor>,
    stats: Arc<Stats>,
    peers: Vec<SocketAddr>,
    state: Arc<PullState>,
) {
    loop {
        let Some(mut pull) = state.queue.lock().unwrap().pop_front() else {
            return;
        };
        let peer = peers[(worker + pull.attempts) % peers.len()];
        stats.inc("bootstrap.pull");
        match pull_account(&processor, &state, peer, &pull).await {
            Ok(blocks) => {
                state.pulled_accounts.fetch_add(1, Ordering::Relaxed);
                state.pulled_blocks.fetch_add(blocks, Ordering::Relaxed);
            }
            Err(err) => {
                pull.attempts += 1;
                if pull.attempts < PULL_RETRIES {
                    tracing::debug!(account = %pull.account, error = %err, "pull failed, requeueing");
                    stats.inc("bootstrap.retry");
                    state.queue.lock().unwrap().push_back(pull);
                } else {
                    tracing::warn!(account = %pull.account, error = %err, "giving up on account");
                    stats.inc("bootstrap.failed_account");
                    state.failed_accounts.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}

/// Pull one account chain and replay it through the validator.
async fn pull_account(
    processor: &Arc<Processor>,
    state: &Arc<PullState>,
    peer: SocketAddr,
    pull: &PullRequest,
) -> Result<u64, NodeError> {
    let ledger = processor.ledger();
    let network = ledger.network();
    let mut stream = TcpStream::connect(peer).await?;
    let request = Message::BulkPull(BulkPull {
        start: pull.account,
        end: pull.end,
    });
    stream.write_all(&request.serialize(network)).await?;

    // Newest-to-oldest stream, each block tag-prefixed.
    let mut raw_blocks = Vec::new();
    loop {
        let mut tag = [0u8; 1];
        stream.read_exact(&mut tag).await?;
        let Some(block_type) = BlockType::from_u8(tag[0]) else {
            return Err(NodeError::Bootstrap(format!("bad block tag {}", tag[0])));
        };
        if block_type == BlockType::NotABlock {
            break;
        }
        let Some(size) = block_type.body_size() else {
            return Err(NodeError::Bootstrap("tag carries no block".into()));
        };
        let mut body = vec![0u8; size];
        stream.read_exact(&mut body).await?;
        let mut bytes = Vec::with_capacity(1 + size);
        bytes.push(tag[0]);
        bytes.extend_from_slice(&body);
        raw_blocks.push(bytes);
    }

    // Stage in arrival order, replay oldest-first. The staging sub-space is
    // shared, so hold the stage lock across both steps.
    let _guard = state.stage.lock().await;
    let replay = {
        let mut txn = ledger.store.begin_write()?;
        for bytes in &raw_blocks {
            ledger.store.bootstrap.push(&mut txn, bytes)?;
        }
        let replay = ledger.store.bootstrap.drain_reverse(&mut txn)?;
        txn.commit()?;
        replay
    };

    let mut applied = 0u64;
    for bytes in replay {
        let Some(block) = Block::from_bytes(&bytes) else {
            return Err(NodeError::Bootstrap("undecodable block in pull".into()));
        };
        match processor.ingest(&block, Timestamp::now())? {
            IngestResult::Progress { .. } => applied += 1,
            IngestResult::Old => {}
            // A fork just means our history disagrees; the election decides.
            IngestResult::Fork => {}
            IngestResult::Parked(kind) => {
                return Err(NodeError::Bootstrap(format!(
                    "gap ({kind:?}) replaying {}",
                    block.hash()
                )));
            }
            IngestResult::BadWork => {
                return Err(NodeError::Bootstrap(format!(
                    "peer sent unstamped block {}",
                    block.hash()
                )));
            }
            IngestResult::Rejected(code) => {
                return Err(NodeError::Bootstrap(format!(
                    "peer sent invalid block {} ({code:?})",
                    block.hash()
                )));
            }
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_target_scales_with_sqrt() {
        assert_eq!(target_connections(0, 16), 1);
        assert_eq!(target_connections(1, 16), 1);
        assert_eq!(target_connections(100, 16), 10);
        assert_eq!(target_connections(101, 16), 11);
        assert_eq!(target_connections(1_000_000, 16), 16);
        assert_eq!(target_connections(1_000_000, 64), 64);
    }
}
