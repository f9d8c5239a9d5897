//! The [`Queue`] trait every edge buffer implements.
//!
//! A queue connects exactly one producer endpoint to exactly one consumer
//! endpoint. Implementations differ only in how they bound storage and how
//! they synchronise; all of them are FIFO. The engine never blocks inside a
//! queue call: it asks [`has_room`](Queue::has_room) and
//! [`is_empty`](Queue::is_empty) before activating a kernel, so `try_push`
//! and `try_pop` are the only operations that change the queue's depth.

use crate::token::Token;

/// Counters kept by every queue implementation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Tokens accepted by `try_push`.
    pub pushed: u64,
    /// Tokens handed out by `try_pop`.
    pub popped: u64,
    /// Highest depth observed after a push.
    pub max_depth: u64,
}

/// A FIFO buffer behind one edge of the kernel graph.
pub trait Queue: Send + Sync {
    /// Short strategy name for logging.
    fn name(&self) -> &'static str;

    /// Maximum number of buffered tokens, or `None` if unbounded.
    fn capacity(&self) -> Option<usize>;

    /// Number of buffered tokens.
    fn len(&self) -> usize;

    /// Whether no token is buffered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a push would be accepted right now.
    fn has_room(&self) -> bool {
        match self.capacity() {
            Some(cap) => self.len() < cap,
            None => true,
        }
    }

    /// Append a token. Hands the token back if the queue is full.
    fn try_push(&self, token: Token) -> Result<(), Token>;

    /// Remove the oldest token, if any.
    fn try_pop(&self) -> Option<Token>;

    /// A copy of the oldest token, if any. The token stays buffered and
    /// keeps counting against the capacity.
    fn peek(&self) -> Option<Token>;

    /// Snapshot of the queue's counters.
    fn stats(&self) -> QueueStats;
}
