use std::net::SocketAddrV4;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::join::JoinTracker;
use crate::membership::RingMembership;
use crate::queue::PendingQueue;
use crate::token::{ConnectionInfo, Token, TokenBody, TokenKind};
use crate::types::{epoch_from_wire, epoch_to_wire, RingMessage};
use crate::RingProtocolError;

use super::effect::RuntimeEffect;
use super::{DeliveredMessage, ProtocolEvent, RingStatus, RuntimeCommand, RuntimeConfig};

/// Complete protocol state: pure logic, no async, no network.
///
/// Every `handle_*` / `tick_*` method returns `Vec<RuntimeEffect>`.
/// No method touches the socket or the channels.
pub struct RingState {
    pub(crate) config: RuntimeConfig,
    pub(crate) membership: RingMembership,
    pub(crate) queue: PendingQueue,
    pub(crate) join: JoinTracker,
    rng: StdRng,
}

impl RingState {
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Deterministic epoch and join ids, for tests and simulations.
    pub fn with_rng(config: RuntimeConfig, rng: StdRng) -> Self {
        // A dynamic peer only learns its successor through the handshake.
        let successor = if config.dynamic_join {
            None
        } else {
            config.successor
        };
        Self {
            membership: RingMembership::new(successor),
            queue: PendingQueue::new(),
            join: JoinTracker::new(config.join_timeout),
            config,
            rng,
        }
    }

    /// Effects to run once, before the first datagram is read.
    pub fn bootstrap(&mut self, now: u64) -> Vec<RuntimeEffect> {
        if self.config.dynamic_join {
            match self.config.successor {
                Some(contact) => self.initiate_join(contact, now),
                None => {
                    tracing::info!("no contact given, starting as ring-of-one");
                    Vec::new()
                }
            }
        } else if self.config.starts_with_token {
            tracing::info!("injecting the first empty token");
            self.forward(Token::empty(0))
        } else {
            Vec::new()
        }
    }

    // ── Inbound tokens ──────────────────────────────────────────────

    /// Decode one datagram and run it through the state machine.
    ///
    /// Undecodable datagrams are logged and dropped; they never fail the loop.
    pub fn handle_incoming(&mut self, data: &[u8], now: u64) -> Vec<RuntimeEffect> {
        match Token::decode(data) {
            Ok(token) => self.handle_token(token, now),
            Err(e @ RingProtocolError::UnknownTokenKind { .. }) => {
                tracing::error!("{e}");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("dropping datagram: {e}");
                Vec::new()
            }
        }
    }

    /// Validate a decoded token and dispatch on its kind.
    pub fn handle_token(&mut self, token: Token, _now: u64) -> Vec<RuntimeEffect> {
        let kind = token.kind();
        tracing::debug!(%kind, id = token.id, "token received");

        if !self.membership.is_authentic(&token) {
            tracing::warn!(
                %kind,
                id = token.id,
                accepted = ?self.membership.accepted_id(),
                "received token from a foreign ring, ignoring"
            );
            return vec![RuntimeEffect::Emit(ProtocolEvent::TokenRejected {
                kind,
                id: token.id,
            })];
        }

        let id = token.id;
        match token.body {
            TokenBody::Empty => self.on_empty(id),
            TokenBody::Message(message) => self.on_message(id, message),
            TokenBody::ConnectRequest(_) | TokenBody::ConnectAck(_)
                if !self.config.dynamic_join =>
            {
                tracing::warn!(%kind, id, "join tokens are not handled in a static ring");
                vec![RuntimeEffect::Emit(ProtocolEvent::TokenDropped {
                    kind,
                    id,
                    reason: "static ring".to_string(),
                })]
            }
            TokenBody::ConnectRequest(info) => self.on_connect_request(info),
            TokenBody::ConnectAck(info) => self.on_connect_ack(id, info),
        }
    }

    /// Splice the oldest queued message into the free token.
    fn on_empty(&mut self, id: i32) -> Vec<RuntimeEffect> {
        if self.queue.is_empty() {
            return self.forward(Token::empty(id));
        }
        match self.queue.dequeue() {
            Ok(message) => {
                tracing::debug!(to = %message.to, "sending queued message");
                self.forward(Token::message(id, message))
            }
            Err(e) => {
                tracing::error!("{e}");
                self.forward(Token::empty(id))
            }
        }
    }

    fn on_message(&mut self, id: i32, message: RingMessage) -> Vec<RuntimeEffect> {
        let local = &self.config.name;

        if &message.to == local {
            tracing::info!(from = %message.from, "message delivered");
            let mut effects = vec![RuntimeEffect::DeliverMessage(DeliveredMessage {
                from: message.from,
                body: message.body,
                token_id: id,
            })];
            effects.extend(self.forward(Token::empty(id)));
            return effects;
        }

        if &message.from == local {
            tracing::warn!(
                "Message could not be delivered to \"{}\" - no such client in network",
                message.to
            );
            let mut effects = vec![RuntimeEffect::Emit(ProtocolEvent::DeliveryFailed {
                to: message.to,
                body: message.body,
            })];
            effects.extend(self.forward(Token::empty(id)));
            return effects;
        }

        self.forward(Token::message(id, message))
    }

    /// A peer wants to be inserted right after us.
    fn on_connect_request(&mut self, info: ConnectionInfo) -> Vec<RuntimeEffect> {
        let requester = info.endpoint();

        match self.membership.successor() {
            Some(previous) => {
                tracing::info!(%requester, %previous, "peer joining after us");
                let ack = Token::connect_ack(
                    epoch_to_wire(self.membership.accepted_id()),
                    ConnectionInfo::from(previous),
                );
                self.membership.set_successor(requester);
                let mut effects = vec![RuntimeEffect::Emit(ProtocolEvent::SuccessorChanged {
                    successor: requester,
                })];
                effects.extend(self.forward(ack));
                effects
            }
            None => {
                self.membership.set_successor(requester);
                let epoch = self.rng.random_range(0..i32::MAX);
                self.membership.adopt_epoch(Some(epoch));
                tracing::info!(%requester, epoch, "ring formed");

                let ack = Token::connect_ack(epoch, ConnectionInfo::from(self.config.advertised));
                let mut effects = vec![RuntimeEffect::Emit(ProtocolEvent::RingFormed {
                    successor: requester,
                    epoch,
                })];
                effects.extend(self.forward(ack));
                effects.extend(self.forward(Token::empty(epoch)));
                effects
            }
        }
    }

    /// Our join completed: adopt the ring's epoch and our new successor.
    fn on_connect_ack(&mut self, id: i32, info: ConnectionInfo) -> Vec<RuntimeEffect> {
        let successor = info.endpoint();
        let epoch = epoch_from_wire(id);
        self.membership.adopt_epoch(epoch);
        self.membership.set_successor(successor);
        self.join.complete();
        tracing::info!(%successor, ?epoch, "joined ring");
        vec![RuntimeEffect::Emit(ProtocolEvent::Joined { successor, epoch })]
    }

    /// Send a token to the successor, or drop it if there is none yet.
    fn forward(&self, token: Token) -> Vec<RuntimeEffect> {
        match self.membership.successor() {
            Some(target) => vec![RuntimeEffect::SendToken { target, token }],
            None => {
                tracing::error!(kind = %token.kind(), "no output address set, dropping token");
                vec![RuntimeEffect::Emit(ProtocolEvent::TokenDropped {
                    kind: token.kind(),
                    id: token.id,
                    reason: "no successor".to_string(),
                })]
            }
        }
    }

    // ── Join ────────────────────────────────────────────────────────

    /// Ask `contact` to insert us into its ring.
    ///
    /// The contact becomes our provisional successor until the ack names
    /// the real one.
    pub fn initiate_join(&mut self, contact: SocketAddrV4, now: u64) -> Vec<RuntimeEffect> {
        if !self.config.dynamic_join {
            return vec![RuntimeEffect::Emit(ProtocolEvent::Error {
                description: "cannot join: this peer runs a static ring".to_string(),
            })];
        }

        self.membership.set_successor(contact);
        self.join.start(contact, now);
        tracing::info!(%contact, "requesting to join ring");

        let id = self.rng.random_range(0..i32::MAX);
        self.forward(Token::connect_request(
            id,
            ConnectionInfo::from(self.config.advertised),
        ))
    }

    /// Report a join whose ack never came and fall back to ring-of-one.
    pub fn tick_join(&mut self, now: u64) -> Vec<RuntimeEffect> {
        match self.join.check_timeout(now) {
            Some(contact) => {
                tracing::error!(%contact, "join timed out, no answer from ring");
                // Drop the provisional successor so we can still host a ring.
                if self.membership.successor() == Some(contact) {
                    self.membership.clear_successor();
                    self.membership.adopt_epoch(None);
                }
                vec![RuntimeEffect::Emit(ProtocolEvent::JoinFailed { contact })]
            }
            None => Vec::new(),
        }
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Apply an application command. `GetStatus` and `Shutdown` are
    /// answered by the loop itself.
    pub fn handle_command(&mut self, cmd: RuntimeCommand, now: u64) -> Vec<RuntimeEffect> {
        match cmd {
            RuntimeCommand::Enqueue { message } => {
                tracing::debug!(to = %message.to, queued = self.queue.len() + 1, "message queued");
                self.queue.enqueue(message);
                Vec::new()
            }
            RuntimeCommand::Join { contact } => self.initiate_join(contact, now),
            RuntimeCommand::GetStatus { reply } => {
                let _ = reply.send(self.status());
                Vec::new()
            }
            RuntimeCommand::Shutdown => Vec::new(),
        }
    }

    pub fn status(&self) -> RingStatus {
        RingStatus {
            name: self.config.name.clone(),
            successor: self.membership.successor(),
            accepted_id: self.membership.accepted_id(),
            queued: self.queue.len(),
            join: self.join.state(),
        }
    }
}
