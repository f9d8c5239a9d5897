//! The [`Executor`]: runs a built [`Graph`] under an [`EngineConfig`].

use std::time::Instant;

use tracing::info;

use crate::config::{ConfigError, EngineConfig};
use crate::error::ExecError;
use crate::metrics::{EdgeMetrics, RunReport};
use crate::runtime::Runtime;
use crate::topology::{Graph, TopologyBuilder};

/// Runs a graph to completion.
///
/// # Examples
///
/// ```
/// use yeeflow_engine::{EngineConfig, Executor, TopologyBuilder};
/// use yeeflow_test_utils::fixtures::{CollectSink, ScalarSource};
///
/// let mut b = TopologyBuilder::new();
/// let src = b.add_kernel(ScalarSource::new("src", 3));
/// let (sink, log) = CollectSink::new("dst", 3);
/// let dst = b.add_kernel(sink);
/// b.connect(src, "out", dst, "in").unwrap();
///
/// let report = Executor::from_builder(b, EngineConfig::default())
///     .unwrap()
///     .run()
///     .unwrap();
/// assert_eq!(*log.lock(), vec![0.0, 1.0, 2.0]);
/// assert_eq!(report.total_activations(), 6);
/// ```
#[derive(Debug)]
pub struct Executor {
    graph: Graph,
    config: EngineConfig,
}

impl Executor {
    /// Wrap an already built graph.
    ///
    /// The graph's queues were allocated by whatever strategy built it;
    /// prefer [`from_builder`](Self::from_builder) so they match
    /// `config.allocation`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidStrategy`] if the configuration is invalid.
    pub fn new(graph: Graph, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { graph, config })
    }

    /// Validate `config`, then build `builder` with its allocation strategy.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidStrategy`] or [`ConfigError::Topology`].
    pub fn from_builder(builder: TopologyBuilder, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let graph = builder.build(config.allocation.as_ref())?;
        Ok(Self { graph, config })
    }

    /// Run until every kernel has stopped.
    ///
    /// # Errors
    ///
    /// [`ExecError`] if a kernel fails, the graph stalls, or an execution
    /// unit cannot be spawned or panics.
    pub fn run(self) -> Result<RunReport, ExecError> {
        self.execute(None)
    }

    /// Run with a cap on the total number of activations.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run), plus [`ExecError::ActivationCapReached`] if
    /// the cap is hit before every kernel has stopped.
    pub fn run_for(self, max_activations: u64) -> Result<RunReport, ExecError> {
        self.execute(Some(max_activations))
    }

    fn execute(self, cap: Option<u64>) -> Result<RunReport, ExecError> {
        let Self { graph, config } = self;
        let infos = graph.kernel_infos();
        let partitioning = config.partition.partition(&infos);
        partitioning
            .check_covers(infos.len())
            .map_err(|reason| ExecError::InvalidPartitioning { reason })?;

        info!(
            kernels = graph.kernel_count(),
            edges = graph.edge_count(),
            partition = config.partition.name(),
            schedule = config.schedule.name(),
            allocation = config.allocation.name(),
            "run starting"
        );

        let Graph { nodes, edges } = graph;
        let rt = Runtime::new(nodes, cap);
        let start = Instant::now();
        let units = config.schedule.run(&rt, &partitioning)?;
        let wall_time = start.elapsed();

        let report = RunReport {
            wall_time,
            schedule: config.schedule.name(),
            partition: config.partition.name(),
            allocation: config.allocation.name(),
            units,
            kernels: rt.into_metrics(),
            edges: edges
                .iter()
                .map(|e| EdgeMetrics {
                    label: e.info.to_string(),
                    queue: e.queue.name(),
                    stats: e.queue.stats(),
                    residual: e.queue.len(),
                })
                .collect(),
        };
        info!(
            wall_ms = report.wall_time.as_millis() as u64,
            activations = report.total_activations(),
            units,
            "run finished"
        );
        Ok(report)
    }
}
