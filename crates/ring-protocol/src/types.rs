use std::fmt;
use std::str::FromStr;

use crate::error::RingProtocolError;

pub use ring_transport::now_ms;

/// Maximum peer name length in bytes.
pub const MAX_NAME_LEN: usize = 10;

/// Maximum message body length in bytes.
pub const MAX_MESSAGE_LEN: usize = 100;

/// Wire value of the epoch id meaning "no epoch, accept any token".
pub const NO_EPOCH: i32 = -1;

/// Map a wire epoch id to the membership view (`-1` → unset).
pub fn epoch_from_wire(id: i32) -> Option<i32> {
    (id != NO_EPOCH).then_some(id)
}

/// Map an optional epoch to its wire value.
pub fn epoch_to_wire(epoch: Option<i32>) -> i32 {
    epoch.unwrap_or(NO_EPOCH)
}

/// Name of a ring peer: 1..=10 bytes, no whitespace, no NUL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerName(pub(crate) String);

impl PeerName {
    pub fn new(name: impl Into<String>) -> Result<Self, RingProtocolError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RingProtocolError::InvalidText {
                field: "peer name",
                reason: "empty".into(),
            });
        }
        check_len("peer name", &name, MAX_NAME_LEN)?;
        if name.chars().any(|c| c.is_whitespace() || c == '\0') {
            return Err(RingProtocolError::InvalidText {
                field: "peer name",
                reason: format!("{name:?} contains whitespace or NUL"),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PeerName {
    type Err = RingProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Message body: at most 100 bytes, no NUL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageText(String);

impl MessageText {
    pub fn new(text: impl Into<String>) -> Result<Self, RingProtocolError> {
        let text = text.into();
        check_len("message", &text, MAX_MESSAGE_LEN)?;
        if text.contains('\0') {
            return Err(RingProtocolError::InvalidText {
                field: "message",
                reason: "contains NUL".into(),
            });
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn check_len(field: &'static str, text: &str, max: usize) -> Result<(), RingProtocolError> {
    if text.len() > max {
        return Err(RingProtocolError::TextTooLong {
            field,
            len: text.len(),
            max,
        });
    }
    Ok(())
}

/// A locally originated message riding on a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingMessage {
    pub from: PeerName,
    pub to: PeerName,
    pub body: MessageText,
}
