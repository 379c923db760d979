//! Outbound message buffer.
//!
//! FIFO queue holding application messages that could not be sent because
//! the transport was not open. Messages stay unserialized until they are
//! actually transmitted.
//!
//! The buffer drains in *passes*: [`OutboundBuffer::take_pass`] removes the
//! current contents in one step, so anything enqueued while the pass is
//! being transmitted (e.g. the transport closed mid-flush and a send was
//! re-buffered) belongs to the next pass, not the current one.
//!
//! There is no size bound and no backpressure signal; unbounded growth
//! under sustained disconnection is a documented limitation.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

// ============================================================================
// OutboundBuffer
// ============================================================================

/// FIFO queue of not-yet-sent application messages.
#[derive(Debug)]
pub struct OutboundBuffer<T> {
    queue: VecDeque<T>,
}

impl<T> OutboundBuffer<T> {
    /// Creates an empty buffer.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Appends a message at the back of the queue.
    #[inline]
    pub fn push(&mut self, message: T) {
        self.queue.push_back(message);
    }

    /// Removes and returns the current contents as one flush pass.
    ///
    /// Messages pushed after this call are not part of the returned pass.
    #[inline]
    #[must_use]
    pub fn take_pass(&mut self) -> VecDeque<T> {
        std::mem::take(&mut self.queue)
    }

    /// Returns the number of buffered messages.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if no messages are buffered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for OutboundBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
