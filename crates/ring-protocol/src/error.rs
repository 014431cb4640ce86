/// Protocol-level errors for the token ring.
///
/// Wraps transport errors (always fatal to the listener) and adds
/// codec, text-bound and producer-side variants.
#[derive(Debug, thiserror::Error)]
pub enum RingProtocolError {
    #[error("transport error: {0}")]
    Transport(#[from] ring_transport::RingTransportError),

    #[error("invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("unknown token kind {kind} (id={id})")]
    UnknownTokenKind { kind: u8, id: i32 },

    #[error("{field} too long: {len} bytes (max {max})")]
    TextTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid {field}: {reason}")]
    InvalidText { field: &'static str, reason: String },

    #[error("pending queue is empty")]
    QueueEmpty,

    #[error("malformed console input: {reason}")]
    ConsoleInput { reason: String },

    #[error("runtime shut down")]
    RuntimeShutdown,
}
