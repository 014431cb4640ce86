//! Token ring transport layer.
//!
//! Thin wrapper over a single UDP socket: one datagram per token, sent to
//! the current successor, plus a best-effort multicast telemetry sidecar.
//! No protocol state lives here.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::net::{Ipv4Addr, SocketAddrV4};
//! use ring_transport::{RingNode, RingNodeConfig};
//!
//! # async fn example() -> Result<(), ring_transport::RingTransportError> {
//! let node = RingNode::bind(RingNodeConfig::new().port(6000)).await?;
//! println!("Listening on {}", node.local_addr());
//!
//! let successor = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 6001);
//! node.send_raw(successor, b"token bytes").await?;
//!
//! let (from, data) = node.recv_raw().await?;
//! println!("{} bytes from {from}", data.len());
//!
//! node.shutdown();
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod node;
mod telemetry;

pub use config::RingNodeConfig;
pub use error::RingTransportError;
pub use node::RingNode;
pub use telemetry::TelemetryListener;

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::{SystemTime, UNIX_EPOCH};

/// Well-known multicast group the telemetry sidecar publishes to.
pub const DEFAULT_TELEMETRY_GROUP: SocketAddrV4 =
    SocketAddrV4::new(Ipv4Addr::new(224, 3, 2, 1), 9999);

/// Current time in milliseconds since Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
