use std::net::SocketAddrV4;

/// Errors returned by the ring transport layer.
///
/// Everything except [`RingTransportError::Telemetry`] means the socket is
/// unusable and the peer cannot keep its place in the ring.
#[derive(Debug, thiserror::Error)]
pub enum RingTransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddrV4,
        #[source]
        source: std::io::Error,
    },

    #[error("send to {target} failed: {source}")]
    Send {
        target: SocketAddrV4,
        #[source]
        source: std::io::Error,
    },

    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),

    #[error("telemetry send to {group} failed: {source}")]
    Telemetry {
        group: SocketAddrV4,
        #[source]
        source: std::io::Error,
    },

    #[error("datagram too large: {size} bytes (max {max})")]
    DatagramTooLarge { size: usize, max: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}
