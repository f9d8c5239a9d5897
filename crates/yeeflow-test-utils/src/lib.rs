//! Test utilities and mock types for yeeflow development.
//!
//! Provides [`MockQueue`], a minimal [`Queue`] implementation for exercising
//! port endpoints without the engine, plus the [`fixtures`] module of mock
//! kernels and naive reference stencils.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::VecDeque;

use parking_lot::Mutex;
use yeeflow_core::{Queue, QueueStats, Token};

/// Mock implementation of [`Queue`].
///
/// Backed by a `Mutex<VecDeque<Token>>`. `None` capacity means unbounded.
pub struct MockQueue {
    capacity: Option<usize>,
    inner: Mutex<(VecDeque<Token>, QueueStats)>,
}

impl MockQueue {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            inner: Mutex::new((VecDeque::new(), QueueStats::default())),
        }
    }

    /// Snapshot of the buffered tokens, oldest first.
    pub fn contents(&self) -> Vec<Token> {
        self.inner.lock().0.iter().cloned().collect()
    }
}

impl Default for MockQueue {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Queue for MockQueue {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn len(&self) -> usize {
        self.inner.lock().0.len()
    }

    fn try_push(&self, token: Token) -> Result<(), Token> {
        let mut guard = self.inner.lock();
        let (buf, stats) = &mut *guard;
        if self.capacity.is_some_and(|cap| buf.len() >= cap) {
            return Err(token);
        }
        buf.push_back(token);
        stats.pushed += 1;
        stats.max_depth = stats.max_depth.max(buf.len() as u64);
        Ok(())
    }

    fn try_pop(&self) -> Option<Token> {
        let mut guard = self.inner.lock();
        let (buf, stats) = &mut *guard;
        let token = buf.pop_front()?;
        stats.popped += 1;
        Some(token)
    }

    fn peek(&self) -> Option<Token> {
        self.inner.lock().0.front().cloned()
    }

    fn stats(&self) -> QueueStats {
        self.inner.lock().1.clone()
    }
}
