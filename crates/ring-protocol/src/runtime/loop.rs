//! The protocol runtime event loop.
//!
//! A single async task that owns all mutable protocol state and
//! multiplexes over inbound datagrams, application commands and the
//! join deadline timer.

use ring_transport::RingNode;
use tokio::sync::mpsc;

use crate::error::RingProtocolError;
use crate::types::now_ms;

use super::executor::{execute_effects, EffectSinks};
use super::state::RingState;
use super::{DeliveredMessage, ProtocolEvent, RuntimeCommand, RuntimeConfig};

/// Main event loop. Owns the socket and all protocol state.
///
/// The socket is released on every exit path, fatal or not.
pub(super) async fn ring_loop(
    node: RingNode,
    config: RuntimeConfig,
    cmd_rx: mpsc::Receiver<RuntimeCommand>,
    msg_tx: mpsc::Sender<DeliveredMessage>,
    event_tx: mpsc::Sender<ProtocolEvent>,
) -> Result<(), RingProtocolError> {
    let result = run(&node, config, cmd_rx, &msg_tx, &event_tx).await;
    if let Err(e) = &result {
        tracing::error!("ring listener stopped: {e}");
        let _ = event_tx.try_send(ProtocolEvent::Error {
            description: e.to_string(),
        });
    }
    node.shutdown();
    result
}

async fn run(
    node: &RingNode,
    config: RuntimeConfig,
    mut cmd_rx: mpsc::Receiver<RuntimeCommand>,
    msg_tx: &mpsc::Sender<DeliveredMessage>,
    event_tx: &mpsc::Sender<ProtocolEvent>,
) -> Result<(), RingProtocolError> {
    let name = config.name.clone();
    let sinks = EffectSinks {
        name: &name,
        pacing: config.pacing,
        msg_tx,
        event_tx,
    };

    // ── Timers ──────────────────────────────────────────────────────
    let mut join_check = tokio::time::interval(config.join_check_interval);
    join_check.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Skip the immediate first tick
    join_check.tick().await;

    let mut state = RingState::new(config);
    tracing::info!(
        name = %name,
        addr = %node.local_addr(),
        dynamic = state.config.dynamic_join,
        "ring listener started"
    );

    let effects = state.bootstrap(now_ms());
    execute_effects(effects, node, &sinks).await?;

    loop {
        tokio::select! {
            // ── 1. Incoming datagram ────────────────────────────────
            result = node.recv_raw() => {
                let (from, data) = result?;
                tracing::trace!(%from, len = data.len(), "datagram received");
                let effects = state.handle_incoming(&data, now_ms());
                execute_effects(effects, node, &sinks).await?;
            }

            // ── 2. Commands from the application ────────────────────
            Some(cmd) = cmd_rx.recv() => {
                if matches!(cmd, RuntimeCommand::Shutdown) {
                    tracing::info!("shutdown requested");
                    return Ok(());
                }
                let effects = state.handle_command(cmd, now_ms());
                execute_effects(effects, node, &sinks).await?;
            }

            // ── 3. Join deadline ────────────────────────────────────
            _ = join_check.tick() => {
                let effects = state.tick_join(now_ms());
                execute_effects(effects, node, &sinks).await?;
            }
        }
    }
}
