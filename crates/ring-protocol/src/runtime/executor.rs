//! Effect executor: the only place that touches I/O.
//!
//! Takes a list of RuntimeEffect and executes them concretely:
//! - SendToken -> pacing delay, transport.send_raw(), telemetry record
//! - DeliverMessage -> msg_tx.try_send()
//! - Emit -> event_tx.try_send()

use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::RingProtocolError;
use crate::telemetry::TelemetryRecord;
use crate::token::Token;
use crate::types::PeerName;

use super::effect::RuntimeEffect;
use super::transport::Transport;
use super::{DeliveredMessage, ProtocolEvent};

/// Where executed effects end up, besides the transport.
pub(super) struct EffectSinks<'a> {
    pub name: &'a PeerName,
    pub pacing: Duration,
    pub msg_tx: &'a mpsc::Sender<DeliveredMessage>,
    pub event_tx: &'a mpsc::Sender<ProtocolEvent>,
}

/// Execute a list of effects in order.
///
/// A failed token send is fatal and stops execution of the remaining effects.
pub(super) async fn execute_effects<T: Transport>(
    effects: Vec<RuntimeEffect>,
    transport: &T,
    sinks: &EffectSinks<'_>,
) -> Result<(), RingProtocolError> {
    for effect in effects {
        match effect {
            RuntimeEffect::SendToken { target, token } => {
                send_token(transport, sinks, target, &token).await?;
            }
            RuntimeEffect::DeliverMessage(msg) => {
                // try_send: never block the ring on a slow consumer
                if sinks.msg_tx.try_send(msg).is_err() {
                    tracing::warn!("message channel full or closed, delivery dropped");
                }
            }
            RuntimeEffect::Emit(event) => {
                if let Err(e) = sinks.event_tx.try_send(event) {
                    tracing::warn!(
                        event = ?e.into_inner(),
                        "event channel full or closed, event dropped"
                    );
                }
            }
        }
    }
    Ok(())
}

async fn send_token<T: Transport>(
    transport: &T,
    sinks: &EffectSinks<'_>,
    target: std::net::SocketAddrV4,
    token: &Token,
) -> Result<(), RingProtocolError> {
    tokio::time::sleep(sinks.pacing).await;

    transport.send_raw(target, &token.encode()).await?;
    tracing::debug!(kind = %token.kind(), id = token.id, %target, "token sent");

    let record = TelemetryRecord::for_token(sinks.name, token);
    if let Err(e) = transport.send_telemetry(&record.to_string()).await {
        tracing::warn!("telemetry send failed: {e}");
    }
    Ok(())
}
