//! Bounded per-subscription message queue.

use std::collections::VecDeque;

use crate::message::Payload;

/// A bounded FIFO that drops its oldest entry on overflow.
///
/// Control topics carry "latest value wins" state, so losing stale entries
/// under a burst is harmless while blocking the publisher would not be.
///
/// # Example
///
/// ```
/// use sim_transport::{MessageQueue, Payload};
///
/// let mut queue = MessageQueue::new(2);
/// queue.push(Payload::Float32(1.0));
/// queue.push(Payload::Float32(2.0));
/// queue.push(Payload::Float32(3.0));
///
/// assert_eq!(queue.dropped(), 1);
/// let pending = queue.take();
/// assert_eq!(pending, [Payload::Float32(2.0), Payload::Float32(3.0)]);
/// ```
#[derive(Debug, Clone)]
pub struct MessageQueue {
    /// Maximum number of queued messages.
    depth: usize,

    /// Queued messages, oldest first.
    items: VecDeque<Payload>,

    /// Messages discarded because the queue was full.
    dropped: u64,
}

impl MessageQueue {
    /// Creates a queue holding at most `depth` messages (minimum 1).
    #[must_use]
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            depth,
            items: VecDeque::with_capacity(depth.min(1024)),
            dropped: 0,
        }
    }

    /// Returns the configured depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no messages are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of messages dropped on overflow so far.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Enqueues a message. Returns `true` if an older message was dropped to
    /// make room.
    pub fn push(&mut self, payload: Payload) -> bool {
        let overflowed = self.items.len() >= self.depth;
        if overflowed {
            self.items.pop_front();
            self.dropped += 1;
        }
        self.items.push_back(payload);
        overflowed
    }

    /// Moves all queued messages out, leaving the queue empty.
    #[must_use]
    pub fn take(&mut self) -> VecDeque<Payload> {
        std::mem::take(&mut self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_depth_is_one() {
        let mut queue = MessageQueue::new(0);
        assert_eq!(queue.depth(), 1);
        queue.push(Payload::Bool(true));
        assert!(queue.push(Payload::Bool(false)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_burst_keeps_newest() {
        let mut queue = MessageQueue::new(10);
        for i in 0..100u8 {
            queue.push(Payload::Float32(f32::from(i)));
        }
        assert_eq!(queue.len(), 10);
        assert_eq!(queue.dropped(), 90);

        let items = queue.take();
        assert_eq!(items.front(), Some(&Payload::Float32(90.0)));
        assert_eq!(items.back(), Some(&Payload::Float32(99.0)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = MessageQueue::new(4);
        assert!(!queue.push(Payload::Float32(1.0)));
        assert!(!queue.push(Payload::Bool(true)));
        let pending: Vec<_> = queue.take().into_iter().collect();
        assert_eq!(pending, vec![Payload::Float32(1.0), Payload::Bool(true)]);
        assert_eq!(queue.dropped(), 0);
    }
}
