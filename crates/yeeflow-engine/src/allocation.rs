//! Queue allocation strategies.
//!
//! An [`AllocationStrategy`] builds the [`Queue`] behind every edge when a
//! topology is built. The strategy is chosen at runtime and applies to the
//! whole graph.

use std::fmt;
use std::sync::Arc;

use yeeflow_core::{EdgeId, PayloadKind, Queue};

use crate::queue::{DynamicQueue, FixedQueue, LockFreeQueue};

/// What an allocation strategy knows about the edge it is allocating for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeInfo {
    /// Edge id, in connection order.
    pub id: EdgeId,
    /// `kernel.port` of the producer.
    pub producer: String,
    /// `kernel.port` of the consumer.
    pub consumer: String,
    /// Payload kind carried by the edge.
    pub kind: PayloadKind,
}

impl fmt::Display for EdgeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.producer, self.consumer)
    }
}

/// Builds one queue per edge.
pub trait AllocationStrategy: Send + Sync {
    /// Short strategy name for logging and reports.
    fn name(&self) -> &'static str;

    /// Check the strategy's parameters.
    ///
    /// # Errors
    ///
    /// A description of the invalid parameter.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Build the queue for `edge`.
    fn allocate(&self, edge: &EdgeInfo) -> Arc<dyn Queue>;
}

/// Bounded rings of `capacity` slots. Full queues apply backpressure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedCapacity {
    /// Slots per edge. Must be at least 1.
    pub capacity: usize,
}

impl Default for FixedCapacity {
    fn default() -> Self {
        Self { capacity: 1 }
    }
}

impl AllocationStrategy for FixedCapacity {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("fixed queue capacity must be at least 1".into());
        }
        Ok(())
    }

    fn allocate(&self, _edge: &EdgeInfo) -> Arc<dyn Queue> {
        Arc::new(FixedQueue::new(self.capacity))
    }
}

/// Unbounded growable queues. Pushes never wait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Growable {
    /// Storage reserved up front per edge.
    pub initial_capacity: usize,
}

impl AllocationStrategy for Growable {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    fn allocate(&self, _edge: &EdgeInfo) -> Arc<dyn Queue> {
        Arc::new(DynamicQueue::new(self.initial_capacity))
    }
}

/// Bounded lock-free channels of `capacity` tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockFree {
    /// Tokens per edge. Must be at least 1.
    pub capacity: usize,
}

impl Default for LockFree {
    fn default() -> Self {
        Self { capacity: 1 }
    }
}

impl AllocationStrategy for LockFree {
    fn name(&self) -> &'static str {
        "lock-free"
    }

    fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("lock-free queue capacity must be at least 1".into());
        }
        Ok(())
    }

    fn allocate(&self, _edge: &EdgeInfo) -> Arc<dyn Queue> {
        Arc::new(LockFreeQueue::new(self.capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge() -> EdgeInfo {
        EdgeInfo {
            id: EdgeId(3),
            producer: "a.out".into(),
            consumer: "b.in".into(),
            kind: PayloadKind::Grid,
        }
    }

    #[test]
    fn strategies_build_matching_queues() {
        let fixed = FixedCapacity { capacity: 4 }.allocate(&edge());
        assert_eq!((fixed.name(), fixed.capacity()), ("fixed", Some(4)));
        let dynamic = Growable::default().allocate(&edge());
        assert_eq!((dynamic.name(), dynamic.capacity()), ("dynamic", None));
        let lock_free = LockFree { capacity: 2 }.allocate(&edge());
        assert_eq!((lock_free.name(), lock_free.capacity()), ("lock-free", Some(2)));
    }

    #[test]
    fn zero_capacity_is_invalid() {
        assert!(FixedCapacity { capacity: 0 }.validate().is_err());
        assert!(LockFree { capacity: 0 }.validate().is_err());
        assert!(Growable { initial_capacity: 0 }.validate().is_ok());
    }

    #[test]
    fn edge_info_display() {
        assert_eq!(edge().to_string(), "a.out -> b.in");
    }
}
