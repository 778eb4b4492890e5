//! The node: wires the ledger, the conflicts table, the peer overlay, and
//! the bootstrap protocol onto tokio services.
//!
//! One task pumps the UDP socket and dispatches messages in arrival order;
//! the ledger write transaction serializes all mutation beneath it. Timers
//! drive keepalives, election announcements, election expiry, and unchecked
//! cache cleanup. A TCP listener serves bootstrap requests.

use crate::bootstrap;
use crate::config::NodeConfig;
use crate::processor::{IngestResult, Processor};
use crate::stats::Stats;
use crate::voting::VoteGenerator;
use crate::NodeError;
use rai_consensus::Conflicts;
use rai_consensus::Vote;
use rai_crypto::keypair_from_private;
use rai_ledger::Ledger;
use rai_messages::{ConfirmAck, ConfirmReq, Keepalive, Message};
use rai_network::{PeerContainer, RecentlySeen};
use rai_store::Store;
use rai_types::{Amount, RawKey, Timestamp};
use std::net::{SocketAddr, SocketAddrV6};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::watch;

/// Period of peer keepalives.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(60);
/// Period of vote re-announcements while elections are live.
const ANNOUNCE_INTERVAL: Duration = Duration::from_secs(15);
/// Period of election expiry sweeps.
const PURGE_INTERVAL: Duration = Duration::from_secs(10);
/// Period of unchecked-cache cleanup.
const UNCHECKED_CLEAN_INTERVAL: Duration = Duration::from_secs(60);
/// Parked blocks older than this are dropped.
const UNCHECKED_CUTOFF_SECS: u64 = 3600;
/// Peers receiving each republished message.
const REPUBLISH_FANOUT: usize = 16;
/// Capacity of the recently-seen flood filter.
const SEEN_CAPACITY: usize = 65_536;
/// Largest datagram we ever produce is a confirm_ack with an open block.
const MAX_DATAGRAM: usize = 512;

/// Map any socket address onto the canonical v6 form used by the peer table.
pub fn canonical_endpoint(addr: SocketAddr) -> SocketAddrV6 {
    match addr {
        SocketAddr::V4(v4) => SocketAddrV6::new(v4.ip().to_ipv6_mapped(), v4.port(), 0, 0),
        SocketAddr::V6(v6) => v6,
    }
}

pub struct Node {
    pub config: NodeConfig,
    pub ledger: Arc<Ledger>,
    pub conflicts: Arc<Conflicts>,
    pub processor: Arc<Processor>,
    pub peers: Arc<PeerContainer>,
    pub stats: Arc<Stats>,
    seen: Arc<RecentlySeen>,
    voter: Option<Arc<VoteGenerator>>,
    shutdown: watch::Sender<bool>,
    local_port: watch::Sender<u16>,
}

impl Node {
    /// Open the store and assemble all subsystems. Fatal on a bad data path,
    /// a corrupt store, or an unusable representative key.
    pub fn new(config: NodeConfig) -> Result<Arc<Self>, NodeError> {
        let store = Store::open(&config.data_dir)?;
        let ledger = Arc::new(Ledger::new(store, config.network)?);
        let conflicts = Arc::new(Conflicts::new(ledger.supply()));
        let stats = Arc::new(Stats::default());
        let processor = Arc::new(Processor::new(
            ledger.clone(),
            conflicts.clone(),
            stats.clone(),
        ));
        let voter = match config.representative_key.as_deref() {
            Some(hex_key) => {
                let key = RawKey::from_hex(hex_key)
                    .ok_or_else(|| NodeError::Config("bad representative key".into()))?;
                let generator = VoteGenerator::new(keypair_from_private(key));
                tracing::info!(representative = %generator.account(), "voting enabled");
                Some(Arc::new(generator))
            }
            None => None,
        };
        let (shutdown, _) = watch::channel(false);
        let (local_port, _) = watch::channel(0);

        Ok(Arc::new(Self {
            config,
            ledger,
            conflicts,
            processor,
            peers: Arc::new(PeerContainer::default()),
            stats,
            seen: Arc::new(RecentlySeen::new(SEEN_CAPACITY)),
            voter,
            shutdown,
            local_port,
        }))
    }

    /// Request shutdown; `run` unwinds at its next scheduling point.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Wait until `run` has bound its sockets; returns the peering port.
    /// Useful when the configured port was zero.
    pub async fn listening_port(&self) -> u16 {
        let mut port = self.local_port.subscribe();
        let bound = port.wait_for(|p| *p != 0).await;
        bound.map(|p| *p).unwrap_or(0)
    }

    /// Bind the sockets and run all services until [`Node::stop`].
    pub async fn run(self: Arc<Self>) -> Result<(), NodeError> {
        let port = self.config.peering_port();
        let socket = Arc::new(UdpSocket::bind(("::", port)).await?);
        let listener = TcpListener::bind(("::", socket.local_addr()?.port())).await?;
        let bound_port = socket.local_addr()?.port();
        let _ = self.local_port.send(bound_port);
        tracing::info!(
            network = self.config.network.as_str(),
            port = bound_port,
            "node listening"
        );

        let mut tasks = Vec::new();

        // Bootstrap server.
        {
            let ledger = self.ledger.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    match listener.accept().await {
                        Ok((stream, peer)) => {
                            let ledger = ledger.clone();
                            tokio::spawn(async move {
                                if let Err(err) = bootstrap::serve(stream, ledger).await {
                                    tracing::debug!(%peer, error = %err, "bootstrap connection ended");
                                }
                            });
                        }
                        Err(err) => tracing::warn!(error = %err, "tcp accept failed"),
                    }
                }
            }));
        }

        // UDP message pump. Messages are handled in arrival order; the
        // ledger write transaction serializes everything below it.
        {
            let node = self.clone();
            let socket = socket.clone();
            tasks.push(tokio::spawn(async move {
                let mut buf = [0u8; MAX_DATAGRAM];
                loop {
                    match socket.recv_from(&mut buf).await {
                        Ok((len, from)) => {
                            let from = canonical_endpoint(from);
                            match Message::deserialize(&buf[..len], node.config.network) {
                                Some(message) => node.handle_message(&socket, message, from).await,
                                None => node.stats.inc("drop.malformed"),
                            }
                        }
                        Err(err) => tracing::debug!(error = %err, "udp receive failed"),
                    }
                }
            }));
        }

        // Keepalive timer.
        {
            let node = self.clone();
            let socket = socket.clone();
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(KEEPALIVE_INTERVAL);
                loop {
                    ticker.tick().await;
                    node.send_keepalives(&socket).await;
                }
            }));
        }

        // Election announcements.
        {
            let node = self.clone();
            let socket = socket.clone();
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(ANNOUNCE_INTERVAL);
                loop {
                    ticker.tick().await;
                    node.announce_votes(&socket).await;
                }
            }));
        }

        // Election expiry.
        {
            let node = self.clone();
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(PURGE_INTERVAL);
                loop {
                    ticker.tick().await;
                    for root in node.conflicts.purge(Timestamp::now()) {
                        node.stats.inc("election.expired");
                        tracing::debug!(%root, "election closed");
                    }
                }
            }));
        }

        // Unchecked cache cleanup.
        {
            let node = self.clone();
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(UNCHECKED_CLEAN_INTERVAL);
                loop {
                    ticker.tick().await;
                    if let Err(err) = node.clean_unchecked() {
                        tracing::warn!(error = %err, "unchecked cleanup failed");
                    }
                }
            }));
        }

        // First contact and initial sync against the preconfigured peers.
        if !self.config.preconfigured_peers.is_empty() {
            let node = self.clone();
            let socket = socket.clone();
            tasks.push(tokio::spawn(async move {
                let peers = node.resolve_preconfigured().await;
                for peer in &peers {
                    node.send(&socket, &node.keepalive_message(), *peer).await;
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
                match bootstrap::run(
                    node.processor.clone(),
                    node.stats.clone(),
                    peers,
                    node.config.bootstrap_connections_max,
                )
                .await
                {
                    Ok(outcome) => tracing::info!(
                        accounts = outcome.pulled_accounts,
                        blocks = outcome.pulled_blocks,
                        failed = outcome.failed_accounts,
                        "initial sync finished"
                    ),
                    Err(err) => tracing::warn!(error = %err, "initial sync failed"),
                }
            }));
        }

        let mut shutdown = self.shutdown.subscribe();
        let _ = shutdown.wait_for(|stop| *stop).await;
        for task in &tasks {
            task.abort();
        }
        tracing::info!("node stopped");
        Ok(())
    }

    // ── Message handling ───────────────────────────────────────────────

    async fn handle_message(&self, socket: &UdpSocket, message: Message, from: SocketAddrV6) {
        let now = Timestamp::now();
        match message {
            Message::Keepalive(keepalive) => {
                self.stats.inc("message.keepalive");
                let newly_seen = self.peers.observe(from, now);
                for peer in keepalive.peers {
                    if rai_network::reserved_endpoint(&peer) {
                        // Empty slots are all-zero; anything else reserved is
                        // counted and dropped.
                        if peer.port() != 0 || !peer.ip().is_unspecified() {
                            self.stats.inc("drop.reserved_sender");
                        }
                        continue;
                    }
                    self.peers.observe(peer, now);
                }
                // Reciprocate toward newly met peers only, so two nodes do
                // not ping-pong forever.
                if newly_seen {
                    self.send(socket, &self.keepalive_message(), SocketAddr::V6(from))
                        .await;
                }
            }
            Message::Publish(publish) => {
                self.stats.inc("message.publish");
                self.peers.observe(from, now);
                if !self.seen.insert(publish.block.hash().0) {
                    return;
                }
                match self.processor.ingest(&publish.block, now) {
                    Ok(IngestResult::Progress { .. }) => {
                        self.broadcast(socket, &Message::Publish(publish), now).await;
                    }
                    Ok(IngestResult::Fork) => {
                        self.request_confirmation(socket, &publish.block, now).await;
                    }
                    Ok(_) => {}
                    Err(err) => tracing::error!(error = %err, "ledger failure on publish"),
                }
            }
            Message::ConfirmReq(request) => {
                self.stats.inc("message.confirm_req");
                self.peers.observe(from, now);
                if let Err(err) = self.processor.ingest(&request.block, now) {
                    tracing::error!(error = %err, "ledger failure on confirm_req");
                    return;
                }
                self.answer_confirm_req(socket, &request, from, now).await;
            }
            Message::ConfirmAck(ack) => {
                self.stats.inc("message.confirm_ack");
                self.peers.observe(from, now);
                let vote = Vote {
                    account: ack.account,
                    signature: ack.signature,
                    sequence: ack.sequence,
                    block: ack.block.clone(),
                };
                if !self.seen.insert(vote.digest()) {
                    return;
                }
                let _ = self.processor.ingest(&ack.block, now);
                match self.processor.apply_vote(&vote, now) {
                    Ok(_) => {}
                    Err(err) => tracing::error!(error = %err, "ledger failure on vote"),
                }
                // Everyone forwards vote traffic, representatives or not.
                self.broadcast(socket, &Message::ConfirmAck(ack), now).await;
            }
            Message::BulkPull(_) | Message::FrontierReq(_) | Message::BulkPush => {
                // TCP-only requests have no business on the UDP socket.
                self.stats.inc("drop.malformed");
            }
        }
    }

    /// Vote back on a confirmation request if we represent any weight.
    async fn answer_confirm_req(
        &self,
        socket: &UdpSocket,
        request: &ConfirmReq,
        from: SocketAddrV6,
        now: Timestamp,
    ) {
        let Some(voter) = &self.voter else { return };
        let weight = {
            let Ok(txn) = self.ledger.store.begin_read() else {
                return;
            };
            self.ledger
                .weight(&txn, &voter.account())
                .unwrap_or(Amount::ZERO)
        };
        if weight.is_zero() {
            return;
        }

        // Vote for our view of the root, falling back to the requested block
        // when the root is new to us.
        let preferred = {
            let Ok(txn) = self.ledger.store.begin_read() else {
                return;
            };
            self.ledger
                .block_at_root(&txn, &request.block.root())
                .ok()
                .flatten()
                .unwrap_or_else(|| request.block.clone())
        };
        let vote = voter.vote(preferred);
        if let Err(err) = self.processor.apply_vote(&vote, now) {
            tracing::error!(error = %err, "ledger failure applying own vote");
        }
        let ack = Message::ConfirmAck(ConfirmAck {
            account: vote.account,
            signature: vote.signature,
            sequence: vote.sequence,
            block: vote.block,
        });
        self.send(socket, &ack, SocketAddr::V6(from)).await;
        self.broadcast(socket, &ack, now).await;
    }

    // ── Periodic work ──────────────────────────────────────────────────

    async fn send_keepalives(&self, socket: &UdpSocket) {
        let now = Timestamp::now();
        let message = self.keepalive_message();
        for peer in self.peers.sample(rai_messages::KEEPALIVE_PEERS, now) {
            self.send(socket, &message, SocketAddr::V6(peer)).await;
        }
    }

    /// Re-announce our vote on every live election.
    async fn announce_votes(&self, socket: &UdpSocket) {
        let Some(voter) = &self.voter else { return };
        let now = Timestamp::now();
        let weight = {
            let Ok(txn) = self.ledger.store.begin_read() else {
                return;
            };
            self.ledger
                .weight(&txn, &voter.account())
                .unwrap_or(Amount::ZERO)
        };
        if weight.is_zero() {
            return;
        }
        for winner in self.conflicts.announcements() {
            let vote = voter.vote(winner);
            if let Err(err) = self.processor.apply_vote(&vote, now) {
                tracing::error!(error = %err, "ledger failure applying own vote");
                continue;
            }
            let ack = Message::ConfirmAck(ConfirmAck {
                account: vote.account,
                signature: vote.signature,
                sequence: vote.sequence,
                block: vote.block,
            });
            self.broadcast(socket, &ack, now).await;
        }
    }

    fn clean_unchecked(&self) -> Result<(), NodeError> {
        let mut txn = self.ledger.store.begin_write()?;
        let removed = self.ledger.store.unchecked.clear_older_than(
            &mut txn,
            UNCHECKED_CUTOFF_SECS,
            Timestamp::now().as_secs(),
        )?;
        txn.commit()?;
        if removed > 0 {
            tracing::debug!(removed, "expired parked blocks dropped");
        }
        Ok(())
    }

    /// Ask peers to vote on the tip occupying a freshly contested root.
    async fn request_confirmation(
        &self,
        socket: &UdpSocket,
        challenger: &rai_ledger::Block,
        now: Timestamp,
    ) {
        let tip = {
            let Ok(txn) = self.ledger.store.begin_read() else {
                return;
            };
            self.ledger
                .block_at_root(&txn, &challenger.root())
                .ok()
                .flatten()
        };
        if let Some(tip) = tip {
            self.broadcast(socket, &Message::ConfirmReq(ConfirmReq { block: tip }), now)
                .await;
        }
    }

    // ── Plumbing ───────────────────────────────────────────────────────

    fn keepalive_message(&self) -> Message {
        let sample = self
            .peers
            .sample(rai_messages::KEEPALIVE_PEERS, Timestamp::now());
        Message::Keepalive(Keepalive::with_peers(&sample))
    }

    async fn send(&self, socket: &UdpSocket, message: &Message, to: SocketAddr) {
        let bytes = message.serialize(self.config.network);
        if let Err(err) = socket.send_to(&bytes, to).await {
            tracing::debug!(%to, error = %err, "udp send failed");
        }
    }

    async fn broadcast(&self, socket: &UdpSocket, message: &Message, now: Timestamp) {
        let bytes = message.serialize(self.config.network);
        for peer in self.peers.sample(REPUBLISH_FANOUT, now) {
            if let Err(err) = socket.send_to(&bytes, SocketAddr::V6(peer)).await {
                tracing::debug!(peer = %peer, error = %err, "udp send failed");
            }
        }
    }

    async fn resolve_preconfigured(&self) -> Vec<SocketAddr> {
        let mut peers = Vec::new();
        for name in &self.config.preconfigured_peers {
            match tokio::net::lookup_host(name).await {
                Ok(mut addrs) => {
                    if let Some(addr) = addrs.next() {
                        peers.push(addr);
                    }
                }
                Err(err) => tracing::warn!(peer = %name, error = %err, "resolve failed"),
            }
        }
        peers
    }
}
