//! Token validation and ring membership.
//!
//! Tracks the successor this peer forwards to and the epoch id that
//! authenticates the current ring. Pure state, mutated only by the
//! runtime task.

use std::net::SocketAddrV4;

use crate::token::{Token, TokenKind};

#[derive(Debug, Clone, Default)]
pub struct RingMembership {
    successor: Option<SocketAddrV4>,
    accepted_id: Option<i32>,
}

impl RingMembership {
    pub fn new(successor: Option<SocketAddrV4>) -> Self {
        Self {
            successor,
            accepted_id: None,
        }
    }

    pub fn successor(&self) -> Option<SocketAddrV4> {
        self.successor
    }

    /// `None` means the ring is not formed yet and any epoch is accepted.
    pub fn accepted_id(&self) -> Option<i32> {
        self.accepted_id
    }

    /// Whether an inbound token belongs to the current ring.
    ///
    /// Join requests always pass: the joining peer cannot know the epoch.
    pub fn is_authentic(&self, token: &Token) -> bool {
        token.kind() == TokenKind::ConnectRequest
            || self.accepted_id.map_or(true, |id| id == token.id)
    }

    /// Overwrite the successor, returning the previous one.
    pub fn set_successor(&mut self, successor: SocketAddrV4) -> Option<SocketAddrV4> {
        let previous = self.successor.replace(successor);
        tracing::debug!("output address set to {successor}");
        previous
    }

    /// Forget the successor, returning to the ring-of-one state.
    pub fn clear_successor(&mut self) -> Option<SocketAddrV4> {
        let previous = self.successor.take();
        tracing::debug!("output address cleared");
        previous
    }

    /// Overwrite the accepted epoch id.
    pub fn adopt_epoch(&mut self, epoch: Option<i32>) {
        self.accepted_id = epoch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::ConnectionInfo;
    use std::net::Ipv4Addr;

    fn addr(port: u16) -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)
    }

    #[test]
    fn accepts_anything_before_ring_formation() {
        let membership = RingMembership::new(None);
        assert!(membership.is_authentic(&Token::empty(5)));
        assert!(membership.is_authentic(&Token::empty(-1)));
        assert!(membership.is_authentic(&Token::connect_ack(9, addr(1).into())));
    }

    #[test]
    fn rejects_foreign_epoch_once_set() {
        let mut membership = RingMembership::new(Some(addr(6001)));
        membership.adopt_epoch(Some(42));

        assert!(membership.is_authentic(&Token::empty(42)));
        assert!(!membership.is_authentic(&Token::empty(41)));
        assert!(!membership.is_authentic(&Token::connect_ack(7, addr(1).into())));
    }

    #[test]
    fn connect_request_bypasses_epoch_filter() {
        let mut membership = RingMembership::new(Some(addr(6001)));
        membership.adopt_epoch(Some(42));

        let info = ConnectionInfo::from(addr(7000));
        assert!(membership.is_authentic(&Token::connect_request(0, info)));
        assert!(membership.is_authentic(&Token::connect_request(-1, info)));
    }

    #[test]
    fn set_successor_is_idempotent_and_returns_previous() {
        let mut membership = RingMembership::new(None);
        assert_eq!(membership.set_successor(addr(1)), None);
        assert_eq!(membership.set_successor(addr(1)), Some(addr(1)));
        assert_eq!(membership.set_successor(addr(2)), Some(addr(1)));
        assert_eq!(membership.successor(), Some(addr(2)));
    }

    #[test]
    fn adopt_epoch_can_reset() {
        let mut membership = RingMembership::new(None);
        membership.adopt_epoch(Some(3));
        assert_eq!(membership.accepted_id(), Some(3));
        membership.adopt_epoch(None);
        assert!(membership.is_authentic(&Token::empty(1000)));
    }

    #[test]
    fn clear_successor_returns_previous() {
        let mut membership = RingMembership::new(Some(addr(6001)));
        assert_eq!(membership.clear_successor(), Some(addr(6001)));
        assert_eq!(membership.successor(), None);
        assert_eq!(membership.clear_successor(), None);
    }
}
