use crate::error::RingProtocolError;
use crate::types::{MessageText, PeerName, RingMessage};

/// Parse a console line of the form `<recipient> < <message>`.
///
/// The recipient is a single word; everything after the first `<` (minus
/// leading blanks) is the body.
pub fn parse_console_line(line: &str, local: &PeerName) -> Result<RingMessage, RingProtocolError> {
    let line = line.trim();
    let (recipient, body) = line
        .split_once('<')
        .ok_or_else(|| console_err("expected `<client name> < <message>`"))?;

    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err(console_err("missing client name"));
    }
    if recipient.split_whitespace().count() > 1 {
        return Err(console_err("client name must be a single word"));
    }

    let body = body.trim_start();
    if body.is_empty() {
        return Err(console_err("missing message"));
    }

    Ok(RingMessage {
        from: local.clone(),
        to: PeerName::new(recipient)?,
        body: MessageText::new(body)?,
    })
}

fn console_err(reason: &str) -> RingProtocolError {
    RingProtocolError::ConsoleInput {
        reason: reason.to_string(),
    }
}
