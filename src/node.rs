//! Node lifecycle: bind the datagram socket, wire the peer table / seen
//! store / PoW / handlers together, bootstrap, and run the single-owner
//! event loop.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::config::{Mode, NodeConfig};
use crate::error::NodeError;
use crate::identity::NodeIdentity;
use crate::peer_table::PeerTable;
use crate::protocol::{codec, Envelope, EnvelopeBuilder};
use crate::pow;
use crate::protocol::PowToken;
use crate::seen::SeenStore;

/// In-process, typed mirror of the external log-line contract: tests and
/// embedders subscribe to this instead of scraping text.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    PeerAdded { addr: String },
    PeerRemoved { addr: String },
    PeerEvicted { addr: String },
    HelloFrom { addr: String },
    HelloRejected { addr: String },
    GossipNew { msg_id: String },
    GossipRecv { msg_id: String },
    GossipForward { msg_id: String, target: String },
    Sent { kind: &'static str, target: String },
    Stats { sent: u64, peers: usize, seen: usize },
}

enum NodeCommand {
    Gossip(String),
    Shutdown,
}

/// All mutable state owned by the single task driving one node. Never
/// shared across tasks; every handler and periodic tick runs to
/// completion before the next is polled.
pub struct NodeState {
    pub identity: NodeIdentity,
    pub config: NodeConfig,
    pub peers: PeerTable,
    pub seen: SeenStore,
    pub pending_pings: HashMap<String, u64>,
    pub rng: StdRng,
    pub ping_seq: u64,
    pub stats_sent: u64,
    pub pow_token: Option<PowToken>,
    pub(crate) socket: Arc<UdpSocket>,
    pub(crate) events: broadcast::Sender<NodeEvent>,
}

impl NodeState {
    pub fn builder(&self) -> EnvelopeBuilder {
        EnvelopeBuilder::new(self.identity.id.clone(), self.identity.addr.clone(), self.config.ttl)
    }

    pub fn emit(&self, event: NodeEvent) {
        let _ = self.events.send(event);
    }

    /// Best-effort send: a failure to reach one target is logged and
    /// swallowed, never propagated, never aborts a fan-out.
    pub async fn send_to(&mut self, addr: &str, envelope: &Envelope) {
        let bytes = codec::encode(envelope);
        match self.socket.send_to(&bytes, addr).await {
            Ok(_) => {
                self.stats_sent += 1;
                let kind = envelope.kind().as_wire();
                info!("SENT {kind} -> {addr}");
                self.emit(NodeEvent::Sent { kind, target: addr.to_string() });
            }
            Err(e) => {
                warn!("send to {addr} failed: {e}");
            }
        }
    }

    /// Touch the peer table and translate the result into a log line /
    /// typed event.
    pub fn touch_peer(&mut self, addr: &str, node_id: &str) {
        if addr == self.identity.addr {
            return;
        }
        let was_known = self.peers.contains(addr);
        let evicted = self.peers.touch(addr, node_id, crate::identity::now_ms());
        if let Some(evicted_addr) = evicted {
            info!("peer evicted {evicted_addr}");
            self.emit(NodeEvent::PeerEvicted { addr: evicted_addr });
        }
        if !was_known {
            info!("peer added   {addr}");
            self.emit(NodeEvent::PeerAdded { addr: addr.to_string() });
        }
    }
}

/// Handle given to embedders/tests: inject application payloads and shut
/// the node down without touching process stdin.
#[derive(Clone)]
pub struct GossipHandle {
    commands: mpsc::UnboundedSender<NodeCommand>,
    events: broadcast::Sender<NodeEvent>,
    pub addr: String,
}

impl GossipHandle {
    pub fn inject_gossip(&self, data: impl Into<String>) {
        let _ = self.commands.send(NodeCommand::Gossip(data.into()));
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(NodeCommand::Shutdown);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NodeEvent> {
        self.events.subscribe()
    }
}

pub struct GossipNode {
    pub(crate) state: NodeState,
    pub(crate) commands: mpsc::UnboundedReceiver<NodeCommand>,
}

impl GossipNode {
    pub async fn bind(config: NodeConfig) -> Result<(GossipNode, GossipHandle), NodeError> {
        config.validate()?;

        let self_addr = config.self_addr();
        let socket = UdpSocket::bind(&self_addr)
            .await
            .map_err(|source| NodeError::Bind { addr: self_addr.clone(), source })?;

        let identity = NodeIdentity::generate(self_addr.clone());
        let (events_tx, _) = broadcast::channel(1024);
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let pow_token = if config.pow_k > 0 {
            let started = std::time::Instant::now();
            let token = pow::compute(&identity.id, config.pow_k);
            info!(
                "computed PoW k={} nonce={} in {:.1}ms",
                config.pow_k,
                token.nonce,
                started.elapsed().as_secs_f64() * 1000.0
            );
            Some(token)
        } else {
            None
        };

        let state = NodeState {
            peers: PeerTable::new(identity.addr.clone(), config.peer_limit),
            seen: SeenStore::new(crate::seen::CAPACITY),
            pending_pings: HashMap::new(),
            rng: StdRng::seed_from_u64(config.seed),
            ping_seq: 0,
            stats_sent: 0,
            pow_token,
            socket: Arc::new(socket),
            events: events_tx.clone(),
            identity,
            config,
        };

        let handle = GossipHandle {
            commands: cmd_tx,
            events: events_tx,
            addr: state.identity.addr.clone(),
        };

        Ok((GossipNode { state, commands: cmd_rx }, handle))
    }

    /// Sends one HELLO and one GET_PEERS to the configured bootstrap
    /// address. No retries, no confirmation.
    async fn bootstrap(&mut self) {
        let Some(bootstrap_addr) = self.state.config.bootstrap.clone() else {
            return;
        };
        let builder = self.state.builder();
        let hello = builder.hello(vec!["udp".into(), "json".into()], self.state.pow_token.clone());
        self.state.send_to(&bootstrap_addr, &hello).await;
        let get_peers = builder.get_peers(self.state.config.peer_limit as u32);
        self.state.send_to(&bootstrap_addr, &get_peers).await;
    }

    /// Runs the node to completion: binds nothing further, drives the
    /// single-owner event loop until `shutdown()` is called on the handle.
    pub async fn run(mut self) {
        self.bootstrap().await;

        let mut ping_tick = interval(Duration::from_secs_f64(self.state.config.ping_interval.max(0.001)));
        let mut pull_tick = interval(Duration::from_secs_f64(self.state.config.pull_interval.max(0.001)));
        let hybrid = self.state.config.mode == Mode::Hybrid;

        let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_eof = false;

        let mut buf = [0u8; 65536];

        loop {
            tokio::select! {
                recv = self.state.socket.recv_from(&mut buf) => {
                    match recv {
                        Ok((n, from)) => {
                            self.on_datagram(&buf[..n], from.to_string()).await;
                        }
                        Err(e) => warn!("recv_from failed: {e}"),
                    }
                }
                _ = ping_tick.tick() => {
                    self.on_ping_tick().await;
                }
                _ = pull_tick.tick(), if hybrid => {
                    self.on_pull_tick().await;
                }
                line = stdin_lines.next_line(), if !stdin_eof => {
                    match line {
                        Ok(Some(l)) => {
                            let trimmed = l.trim().to_string();
                            if !trimmed.is_empty() {
                                self.on_gossip_injection(trimmed).await;
                            }
                        }
                        Ok(None) => stdin_eof = true,
                        Err(_) => stdin_eof = true,
                    }
                }
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(NodeCommand::Gossip(data)) => self.on_gossip_injection(data).await,
                        Some(NodeCommand::Shutdown) | None => break,
                    }
                }
            }
        }

        let peers = self.state.peers.len();
        let seen = self.state.seen.len();
        let sent = self.state.stats_sent;
        info!("STATS sent={sent} peers={peers} seen={seen}");
        self.state.emit(NodeEvent::Stats { sent, peers, seen });
    }

    async fn on_datagram(&mut self, bytes: &[u8], from: String) {
        match codec::decode(bytes) {
            Ok(envelope) => self.dispatch(envelope, from).await,
            Err(e) => debug!("dropped malformed datagram from {from}: {e}"),
        }
    }

    async fn on_gossip_injection(&mut self, data: String) {
        self.broadcast_gossip(data).await;
    }
}
