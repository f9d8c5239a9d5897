//! Per-run performance metrics.
//!
//! [`RunReport`] is returned by every successful run: wall time, one
//! [`KernelMetrics`] per kernel (in id order) and one [`EdgeMetrics`] per
//! edge (in id order).

use std::time::Duration;

use yeeflow_core::QueueStats;

/// Activity counters for one kernel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KernelMetrics {
    /// Kernel name.
    pub name: String,
    /// Completed `step()` calls.
    pub activations: u64,
    /// Time spent inside `step()`, in microseconds.
    pub busy_us: u64,
    /// Whether the kernel returned `Stop`.
    pub stopped: bool,
}

/// Traffic counters for one edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeMetrics {
    /// `producer.port -> consumer.port`.
    pub label: String,
    /// Queue implementation name.
    pub queue: &'static str,
    /// Counters at the end of the run.
    pub stats: QueueStats,
    /// Tokens still buffered at the end of the run.
    pub residual: usize,
}

/// Summary of a completed run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    /// Wall-clock time from first activation to last, inclusive of joins.
    pub wall_time: Duration,
    /// Schedule strategy name.
    pub schedule: &'static str,
    /// Partition strategy name.
    pub partition: &'static str,
    /// Allocation strategy name.
    pub allocation: &'static str,
    /// Number of execution units used.
    pub units: usize,
    /// Per-kernel counters, in id order.
    pub kernels: Vec<KernelMetrics>,
    /// Per-edge counters, in id order.
    pub edges: Vec<EdgeMetrics>,
}

impl RunReport {
    /// Sum of all kernels' activations.
    pub fn total_activations(&self) -> u64 {
        self.kernels.iter().map(|k| k.activations).sum()
    }

    /// Metrics of the first kernel called `name`.
    pub fn kernel(&self, name: &str) -> Option<&KernelMetrics> {
        self.kernels.iter().find(|k| k.name == name)
    }

    /// Tokens still buffered anywhere in the graph.
    pub fn residual_tokens(&self) -> usize {
        self.edges.iter().map(|e| e.residual).sum()
    }
}
