use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RingProtocolError;
use crate::token::Token;
use crate::types::PeerName;

/// One telemetry sidecar record: `"<name> <kind> <id>"`, kind as its wire number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryRecord {
    pub name: String,
    pub kind: u8,
    pub id: i32,
}

impl TelemetryRecord {
    pub fn for_token(name: &PeerName, token: &Token) -> Self {
        Self {
            name: name.to_string(),
            kind: token.kind().as_u8(),
            id: token.id,
        }
    }
}

impl fmt::Display for TelemetryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.kind, self.id)
    }
}

impl FromStr for TelemetryRecord {
    type Err = RingProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RingProtocolError::InvalidText {
            field: "telemetry record",
            reason: format!("{s:?} is not `<name> <kind> <id>`"),
        };

        // Fixed-size senders pad the record with NULs.
        let mut parts = s.trim_end_matches('\0').split_whitespace();
        let (Some(name), Some(kind), Some(id), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        Ok(Self {
            name: name.to_string(),
            kind: kind.parse().map_err(|_| malformed())?,
            id: id.parse().map_err(|_| malformed())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_the_sidecar_expects() {
        let name = PeerName::new("alice").unwrap();
        let record = TelemetryRecord::for_token(&name, &Token::empty(1804289383));
        assert_eq!(record.to_string(), "alice 0 1804289383");
    }

    #[test]
    fn parses_back() {
        let record: TelemetryRecord = "bob 11 -1".parse().unwrap();
        assert_eq!(
            record,
            TelemetryRecord {
                name: "bob".into(),
                kind: 11,
                id: -1,
            }
        );
    }

    #[test]
    fn rejects_malformed() {
        assert!("bob 11".parse::<TelemetryRecord>().is_err());
        assert!("bob eleven 3".parse::<TelemetryRecord>().is_err());
        assert!("bob 1 2 3".parse::<TelemetryRecord>().is_err());
    }

    #[test]
    fn tolerates_nul_padding() {
        let record: TelemetryRecord = "carol 1 42\0\0\0".parse().unwrap();
        assert_eq!(record.name, "carol");
        assert_eq!(record.id, 42);
    }
}
