//! Queue allocation, partitioning and scheduling for yeeflow kernel graphs.
//!
//! Build a graph with [`TopologyBuilder`], pick an [`EngineConfig`] (one
//! partition, one schedule and one allocation strategy, each chosen at
//! runtime), and run it with an [`Executor`]. The engine activates a
//! kernel only when the [`Demand`](yeeflow_kernel::Demand) it declared is
//! satisfied, waits on a doorbell otherwise, and reports a stall instead of
//! hanging when no kernel can ever become ready again.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocation;
pub mod config;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod partition;
pub mod queue;
pub mod runtime;
pub mod schedule;
pub mod topology;

pub use allocation::{AllocationStrategy, EdgeInfo, FixedCapacity, Growable, LockFree};
pub use config::{ConfigError, EngineConfig};
pub use error::ExecError;
pub use executor::Executor;
pub use metrics::{EdgeMetrics, KernelMetrics, RunReport};
pub use partition::{
    CostBalanced, KernelInfo, KernelPerThread, PartitionStrategy, Partitioning, SinglePartition,
};
pub use queue::{DynamicQueue, FixedQueue, LockFreeQueue};
pub use runtime::{Activation, Doorbell, Runtime, Wake};
pub use schedule::{Cooperative, ScheduleStrategy, WorkerPool};
pub use topology::{Edge, Graph, TopologyBuilder};
