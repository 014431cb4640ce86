use crate::RingTransportError;

use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::UdpSocket;

/// Receiving side of the telemetry sidecar.
///
/// Joins the multicast group with address reuse so several monitors can
/// run on one host.
pub struct TelemetryListener {
    socket: UdpSocket,
    group: SocketAddrV4,
}

impl TelemetryListener {
    /// Bind the group port and join the multicast group on the default interface.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(group: SocketAddrV4) -> Result<Self, RingTransportError> {
        let bind_err = |source| RingTransportError::Bind {
            addr: group,
            source,
        };

        if !group.ip().is_multicast() {
            return Err(RingTransportError::Config(format!(
                "{} is not a multicast address",
                group.ip()
            )));
        }

        let socket =
            Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(bind_err)?;
        socket.set_reuse_address(true).map_err(bind_err)?;

        let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, group.port());
        socket
            .bind(&SocketAddr::V4(bind_addr).into())
            .map_err(bind_err)?;
        socket
            .join_multicast_v4(group.ip(), &Ipv4Addr::UNSPECIFIED)
            .map_err(bind_err)?;
        socket.set_nonblocking(true).map_err(bind_err)?;

        let socket = UdpSocket::from_std(socket.into()).map_err(bind_err)?;
        tracing::debug!("joined telemetry group {group}");

        Ok(Self { socket, group })
    }

    /// The multicast group this listener joined.
    pub fn group(&self) -> SocketAddrV4 {
        self.group
    }

    /// Receive the next telemetry record as text.
    pub async fn recv(&self) -> Result<(SocketAddr, String), RingTransportError> {
        let mut buf = [0u8; 512];
        let (len, from) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(RingTransportError::Receive)?;
        Ok((from, String::from_utf8_lossy(&buf[..len]).into_owned()))
    }
}
