use std::net::SocketAddrV4;

use ring_transport::{RingNode, RingTransportError};

/// Network abstraction for the runtime.
///
/// Production: implemented by `RingNode` (UDP).
/// Tests: implemented by `MockTransport` (records sends).
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to a target peer.
    async fn send_raw(&self, target: SocketAddrV4, data: &[u8]) -> Result<(), RingTransportError>;

    /// Publish a telemetry line to the monitoring group.
    async fn send_telemetry(&self, line: &str) -> Result<(), RingTransportError>;
}

// ── Impl for RingNode (production) ──────────────────────────────────

#[async_trait::async_trait]
impl Transport for RingNode {
    async fn send_raw(&self, target: SocketAddrV4, data: &[u8]) -> Result<(), RingTransportError> {
        RingNode::send_raw(self, target, data).await
    }

    async fn send_telemetry(&self, line: &str) -> Result<(), RingTransportError> {
        RingNode::send_telemetry(self, line).await
    }
}

// ── MockTransport (tests) ───────────────────────────────────────────

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Fake transport that records sends for verification.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        sent: Arc<Mutex<Vec<(SocketAddrV4, Vec<u8>)>>>,
        telemetry: Arc<Mutex<Vec<String>>>,
        fail_sends: Arc<Mutex<bool>>,
        fail_telemetry: Arc<Mutex<bool>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<(SocketAddrV4, Vec<u8>)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn telemetry(&self) -> Vec<String> {
            self.telemetry.lock().unwrap().clone()
        }

        pub fn set_fail_sends(&self, fail: bool) {
            *self.fail_sends.lock().unwrap() = fail;
        }

        pub fn set_fail_telemetry(&self, fail: bool) {
            *self.fail_telemetry.lock().unwrap() = fail;
        }
    }

    #[async_trait::async_trait]
    impl Transport for MockTransport {
        async fn send_raw(
            &self,
            target: SocketAddrV4,
            data: &[u8],
        ) -> Result<(), RingTransportError> {
            if *self.fail_sends.lock().unwrap() {
                return Err(RingTransportError::Send {
                    target,
                    source: io::Error::other("mock: send failed"),
                });
            }
            self.sent.lock().unwrap().push((target, data.to_vec()));
            Ok(())
        }

        async fn send_telemetry(&self, line: &str) -> Result<(), RingTransportError> {
            if *self.fail_telemetry.lock().unwrap() {
                return Err(RingTransportError::Telemetry {
                    group: ring_transport::DEFAULT_TELEMETRY_GROUP,
                    source: io::Error::other("mock: telemetry failed"),
                });
            }
            self.telemetry.lock().unwrap().push(line.to_string());
            Ok(())
        }
    }
}
