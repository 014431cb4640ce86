use crate::config::RingNodeConfig;
use crate::RingTransportError;

use std::net::{SocketAddr, SocketAddrV4};
use tokio::net::UdpSocket;

/// A ring transport node: bind, send to a successor, receive from anyone.
///
/// Owns the one UDP socket a peer uses for ring traffic and telemetry.
/// Dropping the node (or calling [`shutdown`](Self::shutdown)) releases it.
pub struct RingNode {
    socket: UdpSocket,
    local_addr: SocketAddrV4,
    telemetry_group: Option<SocketAddrV4>,
    max_datagram_size: usize,
}

impl RingNode {
    /// Create and bind a new ring node.
    pub async fn bind(config: RingNodeConfig) -> Result<Self, RingTransportError> {
        let bind_err = |source| RingTransportError::Bind {
            addr: config.listen,
            source,
        };

        let socket = UdpSocket::bind(config.listen).await.map_err(bind_err)?;

        let local_addr = match socket.local_addr().map_err(bind_err)? {
            SocketAddr::V4(addr) => addr,
            SocketAddr::V6(addr) => {
                return Err(RingTransportError::Config(format!(
                    "expected an IPv4 socket, bound {addr}"
                )))
            }
        };

        if config.telemetry_group.is_some() {
            // Telemetry stays on the local segment.
            socket.set_multicast_ttl_v4(1).map_err(bind_err)?;
        }

        tracing::trace!("socket bound successfully on {local_addr}");

        Ok(Self {
            socket,
            local_addr,
            telemetry_group: config.telemetry_group,
            max_datagram_size: config.max_datagram_size,
        })
    }

    /// The address the socket is bound to (resolved port if 0 was requested).
    pub fn local_addr(&self) -> SocketAddrV4 {
        self.local_addr
    }

    /// The telemetry multicast group, if the sidecar is enabled.
    pub fn telemetry_group(&self) -> Option<SocketAddrV4> {
        self.telemetry_group
    }

    /// Send one datagram to `target`.
    pub async fn send_raw(
        &self,
        target: SocketAddrV4,
        data: &[u8],
    ) -> Result<(), RingTransportError> {
        if data.len() > self.max_datagram_size {
            return Err(RingTransportError::DatagramTooLarge {
                size: data.len(),
                max: self.max_datagram_size,
            });
        }

        self.socket
            .send_to(data, target)
            .await
            .map_err(|source| RingTransportError::Send { target, source })?;

        Ok(())
    }

    /// Receive the next datagram. Blocks until one arrives.
    ///
    /// Cancel safe: usable as a `tokio::select!` branch.
    pub async fn recv_raw(&self) -> Result<(SocketAddr, Vec<u8>), RingTransportError> {
        let mut buf = vec![0u8; self.max_datagram_size];
        let (len, from) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(RingTransportError::Receive)?;
        buf.truncate(len);
        Ok((from, buf))
    }

    /// Publish a text record to the telemetry group.
    ///
    /// A no-op when the sidecar is disabled.
    pub async fn send_telemetry(&self, record: &str) -> Result<(), RingTransportError> {
        let Some(group) = self.telemetry_group else {
            return Ok(());
        };

        self.socket
            .send_to(record.as_bytes(), group)
            .await
            .map_err(|source| RingTransportError::Telemetry { group, source })?;

        tracing::trace!("multicast to telemetry group {group} has been sent");
        Ok(())
    }

    /// Release the socket.
    pub fn shutdown(self) {
        let addr = self.local_addr;
        drop(self.socket);
        tracing::trace!("socket on {addr} closed");
    }
}
