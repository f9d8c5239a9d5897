//! Edge buffer implementations.
//!
//! Three [`Queue`] implementations, one per allocation strategy:
//!
//! - [`FixedQueue`]: ring of `capacity` slots with monotonic head and tail
//!   positions. A push on a full ring is refused.
//! - [`DynamicQueue`]: growable buffer. A push is never refused.
//! - [`LockFreeQueue`]: bounded array channel from `crossbeam-channel`,
//!   observably identical to [`FixedQueue`]. A channel cannot be inspected
//!   in place, so a peeked token is parked on the consumer side and still
//!   counts toward the depth.
//!
//! Every edge has exactly one producer endpoint and one consumer endpoint,
//! but the threads behind them may change between activations under the
//! worker pool, so all three are `Send + Sync`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use parking_lot::Mutex;
use yeeflow_core::{Queue, QueueStats, Token};

// ── FixedQueue ─────────────────────────────────────────────────────

/// A bounded FIFO ring of token slots.
///
/// Head (next pop) and tail (next push) positions only ever increase; the
/// slot index is `pos % capacity` and the depth is `tail - head`. The
/// producer alone advances `tail` and the consumer alone advances `head`.
pub struct FixedQueue {
    slots: Vec<Mutex<Option<Token>>>,
    head: AtomicU64,
    tail: AtomicU64,
    max_depth: AtomicU64,
    capacity: usize,
}

// Compile-time assertion: every queue must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<FixedQueue>();
    assert::<DynamicQueue>();
    assert::<LockFreeQueue>();
};

impl FixedQueue {
    /// Create a ring with room for `capacity` tokens.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`. Allocation strategies reject zero
    /// capacity before a queue is built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "FixedQueue capacity must be >= 1, got {capacity}");
        let slots = (0..capacity).map(|_| Mutex::new(None)).collect();
        Self {
            slots,
            head: AtomicU64::new(0),
            tail: AtomicU64::new(0),
            max_depth: AtomicU64::new(0),
            capacity,
        }
    }

    fn slot(&self, pos: u64) -> &Mutex<Option<Token>> {
        &self.slots[(pos % self.capacity as u64) as usize]
    }
}

impl Queue for FixedQueue {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }

    fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.saturating_sub(head) as usize
    }

    fn try_push(&self, token: Token) -> Result<(), Token> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if tail - head >= self.capacity as u64 {
            return Err(token);
        }
        *self.slot(tail).lock() = Some(token);
        // Release: the slot write is visible before the consumer sees the
        // new tail.
        self.tail.store(tail + 1, Ordering::Release);
        self.max_depth.fetch_max(tail + 1 - head, Ordering::Relaxed);
        Ok(())
    }

    fn try_pop(&self) -> Option<Token> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let token = self.slot(head).lock().take();
        self.head.store(head + 1, Ordering::Release);
        token
    }

    fn peek(&self) -> Option<Token> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        // The producer never writes the head slot while it is occupied.
        self.slot(head).lock().clone()
    }

    fn stats(&self) -> QueueStats {
        QueueStats {
            pushed: self.tail.load(Ordering::Acquire),
            popped: self.head.load(Ordering::Acquire),
            max_depth: self.max_depth.load(Ordering::Relaxed),
        }
    }
}

// ── DynamicQueue ───────────────────────────────────────────────────

/// An unbounded FIFO that grows on demand.
pub struct DynamicQueue {
    inner: Mutex<DynamicInner>,
}

struct DynamicInner {
    buf: VecDeque<Token>,
    stats: QueueStats,
}

impl DynamicQueue {
    /// Create a queue with storage pre-reserved for `initial_capacity` tokens.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(DynamicInner {
                buf: VecDeque::with_capacity(initial_capacity),
                stats: QueueStats::default(),
            }),
        }
    }
}

impl Queue for DynamicQueue {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    fn capacity(&self) -> Option<usize> {
        None
    }

    fn len(&self) -> usize {
        self.inner.lock().buf.len()
    }

    fn try_push(&self, token: Token) -> Result<(), Token> {
        let mut inner = self.inner.lock();
        inner.buf.push_back(token);
        let depth = inner.buf.len() as u64;
        inner.stats.pushed += 1;
        inner.stats.max_depth = inner.stats.max_depth.max(depth);
        Ok(())
    }

    fn try_pop(&self) -> Option<Token> {
        let mut inner = self.inner.lock();
        let token = inner.buf.pop_front()?;
        inner.stats.popped += 1;
        Some(token)
    }

    fn peek(&self) -> Option<Token> {
        self.inner.lock().buf.front().cloned()
    }

    fn stats(&self) -> QueueStats {
        self.inner.lock().stats.clone()
    }
}

// ── LockFreeQueue ──────────────────────────────────────────────────

/// A bounded FIFO over a lock-free crossbeam array channel.
///
/// `depth` counts tokens pushed and not yet popped, including one that a
/// peek moved out of the channel into `front`. Pushes are refused on
/// `depth`, not on the channel's own bound.
pub struct LockFreeQueue {
    tx: Sender<Token>,
    rx: Receiver<Token>,
    front: Mutex<Option<Token>>,
    capacity: usize,
    depth: AtomicU64,
    pushed: AtomicU64,
    popped: AtomicU64,
    max_depth: AtomicU64,
}

impl LockFreeQueue {
    /// Create a channel with room for `capacity` tokens.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`: a zero-capacity crossbeam channel is a
    /// rendezvous channel and can never hold a token between activations.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity >= 1,
            "LockFreeQueue capacity must be >= 1, got {capacity}"
        );
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            tx,
            rx,
            front: Mutex::new(None),
            capacity,
            depth: AtomicU64::new(0),
            pushed: AtomicU64::new(0),
            popped: AtomicU64::new(0),
            max_depth: AtomicU64::new(0),
        }
    }
}

impl Queue for LockFreeQueue {
    fn name(&self) -> &'static str {
        "lock-free"
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }

    fn len(&self) -> usize {
        self.depth.load(Ordering::Acquire) as usize
    }

    fn try_push(&self, token: Token) -> Result<(), Token> {
        // Only the producer raises the depth, so room seen here is still
        // there at the send.
        if self.depth.load(Ordering::Acquire) >= self.capacity as u64 {
            return Err(token);
        }
        // Reserve before sending so a racing pop never sees depth 0.
        let depth = self.depth.fetch_add(1, Ordering::AcqRel) + 1;
        match self.tx.try_send(token) {
            Ok(()) => {
                self.pushed.fetch_add(1, Ordering::Relaxed);
                self.max_depth.fetch_max(depth, Ordering::Relaxed);
                Ok(())
            }
            // Both halves live in `self`, so the channel never disconnects.
            Err(TrySendError::Full(t) | TrySendError::Disconnected(t)) => {
                self.depth.fetch_sub(1, Ordering::AcqRel);
                Err(t)
            }
        }
    }

    fn try_pop(&self) -> Option<Token> {
        let token = match self.front.lock().take() {
            Some(t) => t,
            None => match self.rx.try_recv() {
                Ok(t) => t,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return None,
            },
        };
        self.depth.fetch_sub(1, Ordering::AcqRel);
        self.popped.fetch_add(1, Ordering::Relaxed);
        Some(token)
    }

    fn peek(&self) -> Option<Token> {
        let mut front = self.front.lock();
        if front.is_none() {
            *front = self.rx.try_recv().ok();
        }
        front.clone()
    }

    fn stats(&self) -> QueueStats {
        QueueStats {
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            max_depth: self.max_depth.load(Ordering::Relaxed),
        }
    }
}
