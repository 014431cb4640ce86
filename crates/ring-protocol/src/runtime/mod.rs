//! Protocol runtime: drives the token state machine from a live socket.
//!
//! The runtime owns a `RingNode` (transport) and all protocol state
//! (membership, pending queue, join tracker). It exposes a channel-based
//! API so the console never touches the queue or raw datagrams.

pub mod effect;
pub(crate) mod executor;
mod r#loop;
pub mod state;
pub mod transport;

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use ring_transport::RingNode;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::RingProtocolError;
use crate::join::JoinState;
use crate::token::TokenKind;
use crate::types::{MessageText, PeerName, RingMessage};

pub use effect::RuntimeEffect;
pub use state::RingState;
pub use transport::Transport;

// ── Configuration ─────────────────────────────────────────────────────

/// Configuration for the protocol runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Local peer name; messages addressed to it are delivered here.
    pub name: PeerName,
    /// Own listen endpoint as other peers should reach it.
    pub advertised: SocketAddrV4,
    /// Dynamic ring: peers join at runtime through the handshake.
    pub dynamic_join: bool,
    /// Static ring: the fixed successor. Dynamic ring: the member to join through.
    pub successor: Option<SocketAddrV4>,
    /// Static ring: inject the first empty token at startup.
    pub starts_with_token: bool,
    /// Delay before every token send.
    pub pacing: Duration,
    /// How long a join waits for its `ConnectAck`.
    pub join_timeout: Duration,
    /// Interval for join deadline checks.
    pub join_check_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            name: PeerName("peer".to_string()),
            advertised: SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0),
            dynamic_join: true,
            successor: None,
            starts_with_token: false,
            pacing: Duration::from_secs(1),
            join_timeout: Duration::from_secs(10),
            join_check_interval: Duration::from_millis(500),
        }
    }
}

// ── Commands (app → runtime) ──────────────────────────────────────────

/// Commands the application sends to the runtime event loop.
#[derive(Debug)]
pub enum RuntimeCommand {
    /// Queue a message until an empty token arrives.
    Enqueue { message: RingMessage },
    /// Join an existing ring through `contact`.
    Join { contact: SocketAddrV4 },
    /// Snapshot of membership and queue.
    GetStatus { reply: oneshot::Sender<RingStatus> },
    /// Graceful shutdown.
    Shutdown,
}

// ── Events (runtime → app) ───────────────────────────────────────────

/// A message addressed to this peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub from: PeerName,
    pub body: MessageText,
    pub token_id: i32,
}

/// Protocol-level events the application may want to observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    /// Our own message came back unclaimed.
    DeliveryFailed { to: PeerName, body: MessageText },
    /// Token from a stale or foreign epoch, ignored.
    TokenRejected { kind: TokenKind, id: i32 },
    /// Token not forwarded (no successor yet, or not handled by this ring variant).
    TokenDropped { kind: TokenKind, id: i32, reason: String },
    /// Forwarding target changed.
    SuccessorChanged { successor: SocketAddrV4 },
    /// A ring-of-one accepted its first peer and minted the epoch.
    RingFormed { successor: SocketAddrV4, epoch: i32 },
    /// Our `ConnectAck` arrived.
    Joined {
        successor: SocketAddrV4,
        epoch: Option<i32>,
    },
    /// No `ConnectAck` before the join timeout.
    JoinFailed { contact: SocketAddrV4 },
    /// Non-fatal runtime problem.
    Error { description: String },
}

/// Snapshot of a peer's protocol state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingStatus {
    pub name: PeerName,
    pub successor: Option<SocketAddrV4>,
    pub accepted_id: Option<i32>,
    pub queued: usize,
    pub join: JoinState,
}

// ── RuntimeHandle (app-facing API) ───────────────────────────────────

/// Handle to communicate with a running ProtocolRuntime.
///
/// Cheap to clone. All methods are channel sends.
#[derive(Clone)]
pub struct RuntimeHandle {
    cmd_tx: mpsc::Sender<RuntimeCommand>,
    name: PeerName,
}

impl RuntimeHandle {
    /// This peer's name.
    pub fn name(&self) -> &PeerName {
        &self.name
    }

    /// Queue a message for the next empty token.
    pub async fn enqueue(&self, message: RingMessage) -> Result<(), RingProtocolError> {
        self.cmd_tx
            .send(RuntimeCommand::Enqueue { message })
            .await
            .map_err(|_| RingProtocolError::RuntimeShutdown)
    }

    /// Join an existing ring through `contact` (dynamic ring only).
    pub async fn join(&self, contact: SocketAddrV4) -> Result<(), RingProtocolError> {
        self.cmd_tx
            .send(RuntimeCommand::Join { contact })
            .await
            .map_err(|_| RingProtocolError::RuntimeShutdown)
    }

    /// Current membership, epoch and queue depth.
    pub async fn status(&self) -> Result<RingStatus, RingProtocolError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(RuntimeCommand::GetStatus { reply: tx })
            .await
            .map_err(|_| RingProtocolError::RuntimeShutdown)?;
        rx.await.map_err(|_| RingProtocolError::RuntimeShutdown)
    }

    /// Graceful shutdown.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown).await;
    }
}

// ── RuntimeChannels ──────────────────────────────────────────────────

/// Channels returned to the application when the runtime starts.
pub struct RuntimeChannels {
    /// Handle to send commands to the runtime.
    pub handle: RuntimeHandle,
    /// Messages addressed to this peer.
    pub messages: mpsc::Receiver<DeliveredMessage>,
    /// Protocol-level events.
    pub events: mpsc::Receiver<ProtocolEvent>,
    /// The listener task. Resolves to `Err` on a fatal transport failure.
    pub task: JoinHandle<Result<(), RingProtocolError>>,
}

// ── ProtocolRuntime ──────────────────────────────────────────────────

/// The protocol runtime. Spawn it and communicate via channels.
pub struct ProtocolRuntime;

impl ProtocolRuntime {
    /// Create and start the protocol runtime.
    ///
    /// Takes ownership of the `RingNode`. Spawns the listener loop as a
    /// tokio task; the socket is released when that task ends.
    pub fn spawn(node: RingNode, config: RuntimeConfig) -> RuntimeChannels {
        let name = config.name.clone();

        // Command channel (app → runtime)
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>(64);

        // Event channels (runtime → app)
        let (msg_tx, msg_rx) = mpsc::channel::<DeliveredMessage>(256);
        let (event_tx, event_rx) = mpsc::channel::<ProtocolEvent>(256);

        let task = tokio::spawn(r#loop::ring_loop(node, config, cmd_rx, msg_tx, event_tx));

        RuntimeChannels {
            handle: RuntimeHandle { cmd_tx, name },
            messages: msg_rx,
            events: event_rx,
            task,
        }
    }
}
