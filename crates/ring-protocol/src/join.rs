//! Join handshake bookkeeping.
//!
//! A join is fire-and-forget on the wire; this tracker adds the deadline
//! that turns a lost `ConnectAck` into a visible failure.

use std::net::SocketAddrV4;
use std::time::Duration;

/// Where this peer stands in its own join handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    /// No join attempted (static ring, or ring-of-one waiting for others).
    Idle,
    /// `ConnectRequest` sent, waiting for `ConnectAck`.
    Pending {
        contact: SocketAddrV4,
        deadline_ms: u64,
    },
    /// A `ConnectAck` has been adopted.
    Joined,
    /// No `ConnectAck` before the deadline. Not retried.
    Failed { contact: SocketAddrV4 },
}

#[derive(Debug)]
pub struct JoinTracker {
    state: JoinState,
    timeout: Duration,
}

impl JoinTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: JoinState::Idle,
            timeout,
        }
    }

    pub fn state(&self) -> JoinState {
        self.state
    }

    /// Record a `ConnectRequest` sent to `contact` at `now_ms`.
    pub fn start(&mut self, contact: SocketAddrV4, now_ms: u64) {
        self.state = JoinState::Pending {
            contact,
            deadline_ms: now_ms.saturating_add(self.timeout.as_millis() as u64),
        };
    }

    /// A `ConnectAck` arrived. Late acks after a failure still count.
    pub fn complete(&mut self) {
        self.state = JoinState::Joined;
    }

    /// Move an expired pending join to `Failed`, returning its contact.
    pub fn check_timeout(&mut self, now_ms: u64) -> Option<SocketAddrV4> {
        match self.state {
            JoinState::Pending {
                contact,
                deadline_ms,
            } if now_ms >= deadline_ms => {
                self.state = JoinState::Failed { contact };
                Some(contact)
            }
            _ => None,
        }
    }
}
