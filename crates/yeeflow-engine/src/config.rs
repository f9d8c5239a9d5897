//! Engine configuration, validation and error types.
//!
//! [`EngineConfig`] bundles the three runtime-injected strategies. Each is
//! independent of the others: any partition strategy combines with any
//! schedule and any allocation.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use yeeflow_kernel::TopologyError;

use crate::allocation::{AllocationStrategy, FixedCapacity};
use crate::partition::{PartitionStrategy, SinglePartition};
use crate::schedule::{Cooperative, ScheduleStrategy, WorkerPool};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected before a run starts.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// A strategy rejected its own parameters.
    InvalidStrategy {
        /// `"partition"`, `"schedule"` or `"allocation"`.
        role: &'static str,
        /// Strategy name.
        name: &'static str,
        /// What was wrong.
        reason: String,
    },
    /// Topology validation failed.
    Topology(TopologyError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStrategy { role, name, reason } => {
                write!(f, "invalid {role} strategy '{name}': {reason}")
            }
            Self::Topology(e) => write!(f, "topology: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Topology(e) => Some(e),
            Self::InvalidStrategy { .. } => None,
        }
    }
}

impl From<TopologyError> for ConfigError {
    fn from(e: TopologyError) -> Self {
        Self::Topology(e)
    }
}

// ── EngineConfig ───────────────────────────────────────────────────

/// The strategy set for one run.
///
/// Defaults to a single partition driven cooperatively on the calling
/// thread, with fixed capacity-1 queues.
#[derive(Clone)]
pub struct EngineConfig {
    /// Groups kernels into execution units.
    pub partition: Arc<dyn PartitionStrategy>,
    /// Drives execution units.
    pub schedule: Arc<dyn ScheduleStrategy>,
    /// Builds edge queues.
    pub allocation: Arc<dyn AllocationStrategy>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            partition: Arc::new(SinglePartition),
            schedule: Arc::new(Cooperative),
            allocation: Arc::new(FixedCapacity::default()),
        }
    }
}

impl EngineConfig {
    /// The default configuration.
    pub fn cooperative() -> Self {
        Self::default()
    }

    /// A worker pool of `workers` threads over fixed capacity-1 queues.
    pub fn pool(workers: usize) -> Self {
        Self::default().with_schedule(WorkerPool { workers })
    }

    /// Replace the partition strategy.
    pub fn with_partition(mut self, strategy: impl PartitionStrategy + 'static) -> Self {
        self.partition = Arc::new(strategy);
        self
    }

    /// Replace the schedule strategy.
    pub fn with_schedule(mut self, strategy: impl ScheduleStrategy + 'static) -> Self {
        self.schedule = Arc::new(strategy);
        self
    }

    /// Replace the allocation strategy.
    pub fn with_allocation(mut self, strategy: impl AllocationStrategy + 'static) -> Self {
        self.allocation = Arc::new(strategy);
        self
    }

    /// Check every strategy's parameters.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidStrategy`] naming the first strategy that
    /// rejected its parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("partition", self.partition.name(), self.partition.validate()),
            ("schedule", self.schedule.name(), self.schedule.validate()),
            ("allocation", self.allocation.name(), self.allocation.validate()),
        ];
        for (role, name, result) in checks {
            result.map_err(|reason| ConfigError::InvalidStrategy { role, name, reason })?;
        }
        Ok(())
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("partition", &self.partition.name())
            .field("schedule", &self.schedule.name())
            .field("allocation", &self.allocation.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::LockFree;
    use crate::partition::CostBalanced;

    #[test]
    fn default_is_single_cooperative_fixed() {
        let c = EngineConfig::default();
        assert_eq!(c.partition.name(), "single");
        assert_eq!(c.schedule.name(), "cooperative");
        assert_eq!(c.allocation.name(), "fixed");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn builders_replace_strategies() {
        let c = EngineConfig::pool(3)
            .with_partition(CostBalanced { partitions: 2 })
            .with_allocation(LockFree { capacity: 4 });
        assert_eq!(c.schedule.name(), "worker-pool");
        assert_eq!(c.partition.name(), "cost");
        assert_eq!(c.allocation.name(), "lock-free");
        assert_eq!(
            format!("{c:?}"),
            "EngineConfig { partition: \"cost\", schedule: \"worker-pool\", allocation: \"lock-free\" }"
        );
    }

    #[test]
    fn invalid_strategies_reported_by_role() {
        let err = EngineConfig::pool(0).validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidStrategy {
                role: "schedule",
                ..
            }
        ));
        let err = EngineConfig::default()
            .with_allocation(FixedCapacity { capacity: 0 })
            .validate()
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid allocation strategy 'fixed'"));
    }

    #[test]
    fn topology_error_is_source() {
        let err = ConfigError::from(TopologyError::EmptyGraph);
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "topology: topology has no kernels");
    }
}
