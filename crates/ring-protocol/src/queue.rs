use std::collections::VecDeque;

use crate::error::RingProtocolError;
use crate::types::RingMessage;

/// FIFO of locally originated messages waiting for an empty token.
///
/// Owned by the runtime task; the console producer reaches it only
/// through `RuntimeCommand::Enqueue`.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: VecDeque<RingMessage>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail.
    pub fn enqueue(&mut self, message: RingMessage) {
        self.entries.push_back(message);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Remove and return the head.
    ///
    /// Callers check [`is_empty`](Self::is_empty) first; an empty queue is an error.
    pub fn dequeue(&mut self) -> Result<RingMessage, RingProtocolError> {
        self.entries.pop_front().ok_or(RingProtocolError::QueueEmpty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MessageText, PeerName};

    fn msg(body: &str) -> RingMessage {
        RingMessage {
            from: PeerName::new("alice").unwrap(),
            to: PeerName::new("bob").unwrap(),
            body: MessageText::new(body).unwrap(),
        }
    }

    #[test]
    fn fifo_order() {
        let mut queue = PendingQueue::new();
        queue.enqueue(msg("m1"));
        queue.enqueue(msg("m2"));
        queue.enqueue(msg("m3"));
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.dequeue().unwrap().body.as_str(), "m1");
        assert_eq!(queue.dequeue().unwrap().body.as_str(), "m2");
        assert_eq!(queue.dequeue().unwrap().body.as_str(), "m3");
        assert!(queue.is_empty());
    }

    #[test]
    fn dequeue_empty_fails() {
        let mut queue = PendingQueue::new();
        assert!(queue.is_empty());
        assert!(matches!(queue.dequeue(), Err(RingProtocolError::QueueEmpty)));
    }

    #[test]
    fn duplicates_are_kept() {
        let mut queue = PendingQueue::new();
        queue.enqueue(msg("same"));
        queue.enqueue(msg("same"));
        assert_eq!(queue.len(), 2);
    }
}
