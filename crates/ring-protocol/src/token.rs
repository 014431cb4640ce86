//! Token model and fixed-size wire codec.
//!
//! One token per datagram, always `TOKEN_WIRE_SIZE` bytes, big-endian:
//!
//! ```text
//! [kind:1][id:4][payload:120]
//!   Message:         [from:10][to:10][body:100]
//!   ConnectionInfo:  [address:16 text][port:4][unused:100]
//! ```
//!
//! Text fields are NUL-padded; a field filling its whole slot carries no
//! terminator. Payload bytes not covered by the active variant are zero on
//! send and ignored on receive.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

use crate::error::RingProtocolError;
use crate::types::{MessageText, PeerName, RingMessage, MAX_MESSAGE_LEN, MAX_NAME_LEN};

const ID_OFFSET: usize = 1;
const PAYLOAD_OFFSET: usize = 5;
const PAYLOAD_SIZE: usize = MAX_NAME_LEN * 2 + MAX_MESSAGE_LEN;

const FROM_RANGE: std::ops::Range<usize> = 0..MAX_NAME_LEN;
const TO_RANGE: std::ops::Range<usize> = MAX_NAME_LEN..MAX_NAME_LEN * 2;
const BODY_RANGE: std::ops::Range<usize> = MAX_NAME_LEN * 2..PAYLOAD_SIZE;

/// INET_ADDRSTRLEN: dotted quad plus terminator.
const ADDRESS_LEN: usize = 16;
const ADDRESS_RANGE: std::ops::Range<usize> = 0..ADDRESS_LEN;
const PORT_RANGE: std::ops::Range<usize> = ADDRESS_LEN..ADDRESS_LEN + 4;

/// Size of every token datagram.
pub const TOKEN_WIRE_SIZE: usize = PAYLOAD_OFFSET + PAYLOAD_SIZE;

/// Token kind, the first byte of every datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenKind {
    Empty = 0,
    Message = 1,
    ConnectRequest = 10,
    ConnectAck = 11,
}

impl TokenKind {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Empty),
            1 => Some(Self::Message),
            10 => Some(Self::ConnectRequest),
            11 => Some(Self::ConnectAck),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "EMPTY",
            Self::Message => "MESSAGE",
            Self::ConnectRequest => "CONN",
            Self::ConnectAck => "CONN_ACK",
        };
        f.write_str(name)
    }
}

/// Listen endpoint carried by join handshake tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub address: Ipv4Addr,
    pub port: u16,
}

impl ConnectionInfo {
    pub fn endpoint(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.address, self.port)
    }
}

impl From<SocketAddrV4> for ConnectionInfo {
    fn from(addr: SocketAddrV4) -> Self {
        Self {
            address: *addr.ip(),
            port: addr.port(),
        }
    }
}

/// Kind-specific content. The variant *is* the kind, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenBody {
    Empty,
    Message(RingMessage),
    ConnectRequest(ConnectionInfo),
    ConnectAck(ConnectionInfo),
}

/// The unit of circulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Ring epoch id. Sticky: forwarding and splicing never change it.
    pub id: i32,
    pub body: TokenBody,
}

impl Token {
    pub fn empty(id: i32) -> Self {
        Self {
            id,
            body: TokenBody::Empty,
        }
    }

    pub fn message(id: i32, message: RingMessage) -> Self {
        Self {
            id,
            body: TokenBody::Message(message),
        }
    }

    pub fn connect_request(id: i32, info: ConnectionInfo) -> Self {
        Self {
            id,
            body: TokenBody::ConnectRequest(info),
        }
    }

    pub fn connect_ack(id: i32, info: ConnectionInfo) -> Self {
        Self {
            id,
            body: TokenBody::ConnectAck(info),
        }
    }

    pub fn kind(&self) -> TokenKind {
        match self.body {
            TokenBody::Empty => TokenKind::Empty,
            TokenBody::Message(_) => TokenKind::Message,
            TokenBody::ConnectRequest(_) => TokenKind::ConnectRequest,
            TokenBody::ConnectAck(_) => TokenKind::ConnectAck,
        }
    }

    /// Serialize to the fixed-size datagram.
    pub fn encode(&self) -> [u8; TOKEN_WIRE_SIZE] {
        let mut buf = [0u8; TOKEN_WIRE_SIZE];
        buf[0] = self.kind().as_u8();
        buf[ID_OFFSET..PAYLOAD_OFFSET].copy_from_slice(&self.id.to_be_bytes());

        let payload = &mut buf[PAYLOAD_OFFSET..];
        match &self.body {
            TokenBody::Empty => {}
            TokenBody::Message(message) => {
                put_text(&mut payload[FROM_RANGE], message.from.as_str());
                put_text(&mut payload[TO_RANGE], message.to.as_str());
                put_text(&mut payload[BODY_RANGE], message.body.as_str());
            }
            TokenBody::ConnectRequest(info) | TokenBody::ConnectAck(info) => {
                put_text(&mut payload[ADDRESS_RANGE], &info.address.to_string());
                payload[PORT_RANGE].copy_from_slice(&u32::from(info.port).to_be_bytes());
            }
        }
        buf
    }

    /// Parse a datagram. Extra trailing bytes are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, RingProtocolError> {
        if data.len() < TOKEN_WIRE_SIZE {
            return Err(RingProtocolError::InvalidToken {
                reason: format!(
                    "datagram of {} bytes, expected {TOKEN_WIRE_SIZE}",
                    data.len()
                ),
            });
        }

        let id = i32::from_be_bytes([data[1], data[2], data[3], data[4]]);
        let kind = TokenKind::from_u8(data[0])
            .ok_or(RingProtocolError::UnknownTokenKind { kind: data[0], id })?;

        let payload = &data[PAYLOAD_OFFSET..TOKEN_WIRE_SIZE];
        let body = match kind {
            TokenKind::Empty => TokenBody::Empty,
            TokenKind::Message => TokenBody::Message(RingMessage {
                from: PeerName::new(get_text(&payload[FROM_RANGE], "from")?)
                    .map_err(invalid)?,
                to: PeerName::new(get_text(&payload[TO_RANGE], "to")?).map_err(invalid)?,
                body: MessageText::new(get_text(&payload[BODY_RANGE], "body")?)
                    .map_err(invalid)?,
            }),
            TokenKind::ConnectRequest => TokenBody::ConnectRequest(get_connection(payload)?),
            TokenKind::ConnectAck => TokenBody::ConnectAck(get_connection(payload)?),
        };

        Ok(Self { id, body })
    }
}

fn invalid(e: RingProtocolError) -> RingProtocolError {
    RingProtocolError::InvalidToken {
        reason: e.to_string(),
    }
}

/// Copy `text` into a zeroed slot. Callers guarantee it fits.
fn put_text(slot: &mut [u8], text: &str) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(slot.len());
    slot[..len].copy_from_slice(&bytes[..len]);
}

/// Read a NUL-terminated (or slot-filling) UTF-8 field.
fn get_text(slot: &[u8], field: &str) -> Result<String, RingProtocolError> {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    String::from_utf8(slot[..end].to_vec()).map_err(|_| RingProtocolError::InvalidToken {
        reason: format!("{field} is not valid UTF-8"),
    })
}

fn get_connection(payload: &[u8]) -> Result<ConnectionInfo, RingProtocolError> {
    let text = get_text(&payload[ADDRESS_RANGE], "address")?;
    let address = text
        .parse::<Ipv4Addr>()
        .map_err(|_| RingProtocolError::InvalidToken {
            reason: format!("address {text:?} not in IPv4 format"),
        })?;

    let raw_port = u32::from_be_bytes([
        payload[PORT_RANGE.start],
        payload[PORT_RANGE.start + 1],
        payload[PORT_RANGE.start + 2],
        payload[PORT_RANGE.start + 3],
    ]);
    let port = u16::try_from(raw_port).map_err(|_| RingProtocolError::InvalidToken {
        reason: format!("port {raw_port} out of range"),
    })?;

    Ok(ConnectionInfo { address, port })
}
