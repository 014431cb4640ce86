use std::net::SocketAddrV4;

use crate::token::Token;

use super::{DeliveredMessage, ProtocolEvent};

/// Intent produced by the pure logic in `RingState`.
///
/// Every `handle_*` / `tick_*` method returns `Vec<RuntimeEffect>`.
/// The event loop then executes them through `Transport` + channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEffect {
    /// Send a token to an explicit hop (usually the successor).
    SendToken { target: SocketAddrV4, token: Token },

    /// Hand a message addressed to this peer to the application.
    DeliverMessage(DeliveredMessage),

    /// Emit a protocol event (delivery failure, join outcome, etc.).
    Emit(ProtocolEvent),
}
