//! Token ring protocol layer.
//!
//! Implements the token codec, epoch validation, the pending-message
//! queue, the join handshake and the token state machine on top of
//! `ring-transport` (one UDP datagram per token).
//!
//! Wire format: fixed 125-byte frame, big-endian integers.

pub mod console;
pub mod error;
pub mod join;
pub mod membership;
pub mod queue;
pub mod runtime;
pub mod telemetry;
pub mod token;
pub mod types;

pub use console::parse_console_line;
pub use error::RingProtocolError;
pub use join::{JoinState, JoinTracker};
pub use membership::RingMembership;
pub use queue::PendingQueue;
pub use runtime::{
    DeliveredMessage, ProtocolEvent, ProtocolRuntime, RingStatus, RuntimeChannels,
    RuntimeCommand, RuntimeConfig, RuntimeHandle,
};
pub use telemetry::TelemetryRecord;
pub use token::{ConnectionInfo, Token, TokenBody, TokenKind, TOKEN_WIRE_SIZE};
pub use types::{now_ms, MessageText, PeerName, RingMessage, MAX_MESSAGE_LEN, MAX_NAME_LEN, NO_EPOCH};
