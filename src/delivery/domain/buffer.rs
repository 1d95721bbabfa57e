//! Per-user FIFO of messages awaiting delivery.

use std::collections::VecDeque;

use super::OutboundMessage;

/// Default number of messages buffered per user.
pub const DEFAULT_BUFFER_LIMIT: usize = 200;

/// Bounded FIFO of undelivered messages for one user.
///
/// When the bound is exceeded the oldest messages are evicted, never the
/// newest.
#[derive(Debug, Clone)]
pub struct DeliveryBuffer {
    messages: VecDeque<OutboundMessage>,
    limit: usize,
}

impl DeliveryBuffer {
    /// Creates an empty buffer holding at most `limit` messages (at least one).
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Returns the bound.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of buffered messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends a message, returning the messages evicted to respect the bound.
    pub fn push_back(&mut self, message: OutboundMessage) -> Vec<OutboundMessage> {
        self.messages.push_back(message);
        self.evict_overflow()
    }

    /// Puts undelivered messages back at the head, keeping their order ahead
    /// of anything appended meanwhile.
    ///
    /// Returns the messages evicted to respect the bound.
    pub fn requeue_front(&mut self, undelivered: Vec<OutboundMessage>) -> Vec<OutboundMessage> {
        for message in undelivered.into_iter().rev() {
            self.messages.push_front(message);
        }
        self.evict_overflow()
    }

    /// Removes and returns every buffered message in order.
    pub fn drain(&mut self) -> Vec<OutboundMessage> {
        self.messages.drain(..).collect()
    }

    /// Returns the buffered messages in order without removing them.
    pub fn iter(&self) -> impl Iterator<Item = &OutboundMessage> {
        self.messages.iter()
    }

    fn evict_overflow(&mut self) -> Vec<OutboundMessage> {
        let excess = self.messages.len().saturating_sub(self.limit);
        self.messages.drain(..excess).collect()
    }
}

impl Default for DeliveryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_LIMIT)
    }
}

/// Outcome of one flush of a user's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlushReport {
    /// Messages delivered to every live connection.
    pub delivered: usize,
    /// Messages left in the buffer afterwards.
    pub pending: usize,
    /// Whether a send failed and the remainder was re-queued.
    pub interrupted: bool,
}
