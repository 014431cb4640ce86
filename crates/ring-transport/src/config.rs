use std::net::{Ipv4Addr, SocketAddrV4};

/// Configuration for a [`RingNode`](crate::RingNode).
///
/// All fields have sensible defaults. Use the builder pattern:
///
/// ```rust
/// use ring_transport::RingNodeConfig;
///
/// let config = RingNodeConfig::new()
///     .port(6000)
///     .without_telemetry();
/// ```
#[derive(Debug, Clone)]
pub struct RingNodeConfig {
    /// Address the ring socket binds to.
    pub(crate) listen: SocketAddrV4,
    /// Multicast group for telemetry records. `None` disables the sidecar.
    pub(crate) telemetry_group: Option<SocketAddrV4>,
    /// Largest datagram accepted for send or receive.
    pub(crate) max_datagram_size: usize,
}

impl Default for RingNodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RingNodeConfig {
    /// Create a new config with defaults: all interfaces, ephemeral port,
    /// telemetry to [`DEFAULT_TELEMETRY_GROUP`](crate::DEFAULT_TELEMETRY_GROUP).
    ///
    /// If the `RING_TELEMETRY_GROUP` environment variable holds an
    /// `ip:port` pair, it replaces the default group. This can be
    /// overridden with [`.telemetry_group()`](Self::telemetry_group).
    pub fn new() -> Self {
        let telemetry_group = std::env::var("RING_TELEMETRY_GROUP")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(crate::DEFAULT_TELEMETRY_GROUP);

        Self {
            listen: SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0),
            telemetry_group: Some(telemetry_group),
            max_datagram_size: 1024,
        }
    }

    /// Bind to a specific address and port.
    pub fn listen(mut self, addr: SocketAddrV4) -> Self {
        self.listen = addr;
        self
    }

    /// Bind to `port` on all interfaces.
    pub fn port(mut self, port: u16) -> Self {
        self.listen = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
        self
    }

    /// Publish telemetry records to a custom multicast group.
    pub fn telemetry_group(mut self, group: SocketAddrV4) -> Self {
        self.telemetry_group = Some(group);
        self
    }

    /// Disable the telemetry sidecar.
    pub fn without_telemetry(mut self) -> Self {
        self.telemetry_group = None;
        self
    }

    /// Set the largest datagram size (default: 1024 bytes).
    pub fn max_datagram_size(mut self, bytes: usize) -> Self {
        self.max_datagram_size = bytes;
        self
    }
}
