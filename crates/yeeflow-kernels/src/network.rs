//! Wiring of the six-kernel Yee network and end-to-end simulation.
//!
//! [`YeeNetwork`] describes a run (grid size, iteration budget, initial
//! grids, physical constants). [`YeeNetwork::into_topology`] turns it into a
//! [`TopologyBuilder`] holding:
//!
//! - six [`FieldKernel`]s, `Hx Hy Hz Ex Ey Ez`, cross-coupled by twelve
//!   edges (`Hα` feeds `Eβ, Eγ`; `Eα` feeds `Hβ, Hγ`);
//! - six [`SeedGenerator`]s, one per field kernel's `seed` input;
//! - six [`GridSink`]s, one per field kernel's `Final` output.
//!
//! [`Simulation::run`] builds, executes and collects in one call.

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use indexmap::IndexMap;
use tracing::info;
use yeeflow_core::{Component, Grid, GridError, KernelId, PhysConstants, PhysParams};
use yeeflow_engine::{ConfigError, EngineConfig, ExecError, Executor, RunReport, TopologyBuilder};
use yeeflow_kernel::TopologyError;

use crate::field::{FieldKernel, Iterations};
use crate::generator::{SeedFill, SeedGenerator};
use crate::sink::{GridSink, SinkMode};

// ── Errors ─────────────────────────────────────────────────────────

/// Errors from assembling or running a Yee network.
#[derive(Debug, PartialEq)]
pub enum NetworkError {
    /// Invalid grid dimensions or seed grid.
    Grid(GridError),
    /// An explicit seed grid does not match the network's dimensions.
    SeedMismatch {
        /// The component whose seed is wrong.
        component: Component,
        /// The network's dimensions.
        expected: (usize, usize, usize),
        /// The seed grid's dimensions.
        actual: (usize, usize, usize),
    },
    /// An impulse seed lies outside the grid.
    ImpulseOutOfRange {
        /// The requested cell.
        at: (usize, usize, usize),
        /// The network's dimensions.
        dims: (usize, usize, usize),
    },
    /// Wiring failed.
    Topology(TopologyError),
    /// The engine configuration was rejected.
    Config(ConfigError),
    /// The run failed.
    Exec(ExecError),
    /// A field kernel never delivered its final grid.
    MissingGrid {
        /// The missing component.
        component: Component,
    },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(e) => write!(f, "grid: {e}"),
            Self::SeedMismatch {
                component,
                expected,
                actual,
            } => write!(
                f,
                "seed for {component} is {actual:?}, network is {expected:?}"
            ),
            Self::ImpulseOutOfRange { at, dims } => {
                write!(f, "impulse at {at:?} is outside a {dims:?} grid")
            }
            Self::Topology(e) => write!(f, "topology: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Exec(e) => write!(f, "run: {e}"),
            Self::MissingGrid { component } => write!(f, "no final grid for {component}"),
        }
    }
}

impl Error for NetworkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            Self::Topology(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Exec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for NetworkError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<TopologyError> for NetworkError {
    fn from(e: TopologyError) -> Self {
        Self::Topology(e)
    }
}

impl From<ConfigError> for NetworkError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ExecError> for NetworkError {
    fn from(e: ExecError) -> Self {
        Self::Exec(e)
    }
}

// ── Seeding ────────────────────────────────────────────────────────

/// Initial grids for the six field kernels.
#[derive(Clone, Debug, PartialEq)]
pub enum SeedPlan {
    /// Uniform `[0, 1)` samples. Each component draws from its own ChaCha8
    /// stream seeded with `seed ^ salt(component)`.
    Random {
        /// Network seed.
        seed: u64,
    },
    /// All zeros.
    Zeros,
    /// All zeros except `value` at `(x, y, z)` of `component`.
    Impulse {
        /// The excited component.
        component: Component,
        /// Cell x.
        x: usize,
        /// Cell y.
        y: usize,
        /// Cell z.
        z: usize,
        /// Sample value.
        value: f64,
    },
    /// Caller-supplied grids. Components without an entry start at zero.
    Explicit(IndexMap<Component, Grid>),
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self::Random { seed: 0 }
    }
}

/// Per-component salt for random seeding.
fn salt(c: Component) -> u64 {
    0x9E37_79B9_7F4A_7C15u64.wrapping_mul(c.ordinal() as u64 + 1)
}

impl SeedPlan {
    fn fill_for(
        &self,
        c: Component,
        dims: (usize, usize, usize),
    ) -> Result<SeedFill, NetworkError> {
        Ok(match self {
            Self::Random { seed } => SeedFill::Random {
                seed: seed ^ salt(c),
            },
            Self::Zeros => SeedFill::Zeros,
            Self::Impulse {
                component,
                x,
                y,
                z,
                value,
            } if *component == c => {
                let mut g = Grid::zeros(dims.0, dims.1, dims.2)?;
                if g.get(*x, *y, *z).is_none() {
                    return Err(NetworkError::ImpulseOutOfRange {
                        at: (*x, *y, *z),
                        dims,
                    });
                }
                *g.at_mut(*x, *y, *z) = *value;
                SeedFill::Provided(g)
            }
            Self::Impulse { .. } => SeedFill::Zeros,
            Self::Explicit(grids) => match grids.get(&c) {
                Some(g) if g.dims() != dims => {
                    return Err(NetworkError::SeedMismatch {
                        component: c,
                        expected: dims,
                        actual: g.dims(),
                    })
                }
                Some(g) => SeedFill::Provided(g.clone()),
                None => SeedFill::Zeros,
            },
        })
    }
}

// ── Network ────────────────────────────────────────────────────────

/// A Yee network description.
#[derive(Clone, Debug, PartialEq)]
pub struct YeeNetwork {
    dims: (usize, usize, usize),
    iterations: Iterations,
    seed: SeedPlan,
    constants: PhysConstants,
    forward_final: bool,
}

/// Builder for [`YeeNetwork`].
#[derive(Clone, Debug)]
pub struct YeeNetworkBuilder {
    dims: (usize, usize, usize),
    iterations: Iterations,
    seed: SeedPlan,
    constants: PhysConstants,
    forward_final: bool,
}

impl Default for YeeNetworkBuilder {
    fn default() -> Self {
        Self {
            dims: (1, 1, 1),
            iterations: Iterations::Bounded(1),
            seed: SeedPlan::default(),
            constants: PhysConstants::default(),
            forward_final: true,
        }
    }
}

impl YeeNetworkBuilder {
    /// Grid dimensions. Default `(1, 1, 1)`.
    pub fn dims(mut self, nx: usize, ny: usize, nz: usize) -> Self {
        self.dims = (nx, ny, nz);
        self
    }

    /// Update budget per field kernel. Default one update.
    pub fn iterations(mut self, iterations: Iterations) -> Self {
        self.iterations = iterations;
        self
    }

    /// Initial grids. Default `Random { seed: 0 }`.
    pub fn seed(mut self, seed: SeedPlan) -> Self {
        self.seed = seed;
        self
    }

    /// Physical constants. Default [`PhysConstants::default`].
    pub fn constants(mut self, constants: PhysConstants) -> Self {
        self.constants = constants;
        self
    }

    /// Whether sinks forward final grids (default) or discard them.
    pub fn forward_final(mut self, forward: bool) -> Self {
        self.forward_final = forward;
        self
    }

    /// Validate dimensions and seeds.
    ///
    /// # Errors
    ///
    /// [`NetworkError::Grid`] for a zero or overflowing dimension,
    /// [`NetworkError::SeedMismatch`] / [`NetworkError::ImpulseOutOfRange`]
    /// for seeds that do not fit the grid.
    pub fn build(self) -> Result<YeeNetwork, NetworkError> {
        let (nx, ny, nz) = self.dims;
        // Dimension check only; the grid itself is discarded.
        Grid::zeros(nx, ny, nz)?;
        for c in Component::ALL {
            self.seed.fill_for(c, self.dims)?;
        }
        Ok(YeeNetwork {
            dims: self.dims,
            iterations: self.iterations,
            seed: self.seed,
            constants: self.constants,
            forward_final: self.forward_final,
        })
    }
}

impl YeeNetwork {
    /// Start describing a network.
    pub fn builder() -> YeeNetworkBuilder {
        YeeNetworkBuilder::default()
    }

    /// Grid dimensions.
    pub fn dims(&self) -> (usize, usize, usize) {
        self.dims
    }

    /// Update budget per field kernel.
    pub fn iterations(&self) -> Iterations {
        self.iterations
    }

    /// Derived physical parameters.
    pub fn params(&self) -> PhysParams {
        let (nx, ny, nz) = self.dims;
        PhysParams::with_constants(nx, ny, nz, &self.constants)
    }

    /// Build the eighteen-kernel topology and the handle that collects the
    /// final grids.
    ///
    /// # Errors
    ///
    /// Seed errors (see [`YeeNetworkBuilder::build`]) or wiring errors.
    pub fn into_topology(self) -> Result<(TopologyBuilder, FinalGrids), NetworkError> {
        let params = self.params();
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut b = TopologyBuilder::new();

        let mut fields: IndexMap<Component, KernelId> = IndexMap::new();
        let mut counters = Vec::with_capacity(Component::ALL.len());
        for c in Component::ALL {
            let k = FieldKernel::new(c, self.dims, params, self.iterations);
            counters.push((c, k.update_counter()));
            fields.insert(c, b.add_kernel(k));
        }

        for (&c, &id) in &fields {
            let seed = b.add_kernel(SeedGenerator::new(
                format!("seed_{c}"),
                self.dims,
                self.seed.fill_for(c, self.dims)?,
            ));
            b.connect(seed, "out", id, "seed")?;

            let mode = if self.forward_final {
                SinkMode::Forward(tx.clone())
            } else {
                SinkMode::Discard
            };
            let sink = b.add_kernel(GridSink::new(c, mode));
            b.connect(id, "Final", sink, "grid")?;

            for d in c.dependents() {
                let to = fields[&d];
                b.connect(id, &format!("out_{d}"), to, &c.to_string())?;
            }
        }

        Ok((
            b,
            FinalGrids {
                rx,
                counters,
                forwarded: self.forward_final,
            },
        ))
    }
}

// ── Results ────────────────────────────────────────────────────────

/// Receives the final grids of a network built by
/// [`YeeNetwork::into_topology`].
#[derive(Debug)]
pub struct FinalGrids {
    rx: Receiver<(Component, Grid)>,
    counters: Vec<(Component, Arc<AtomicU64>)>,
    forwarded: bool,
}

impl FinalGrids {
    /// Updates performed so far by each field kernel, in output order.
    pub fn updates(&self) -> IndexMap<Component, u64> {
        self.counters
            .iter()
            .map(|(c, n)| (*c, n.load(Ordering::Relaxed)))
            .collect()
    }

    /// The six final grids in output order (`Hx Hy Hz Ex Ey Ez`).
    ///
    /// Empty when the network was built with `forward_final(false)`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::MissingGrid`] if a forwarded grid never arrived.
    pub fn collect(&self) -> Result<IndexMap<Component, Grid>, NetworkError> {
        let mut received: IndexMap<Component, Grid> = self.rx.try_iter().collect();
        if !self.forwarded {
            return Ok(IndexMap::new());
        }
        Component::ALL
            .into_iter()
            .map(|c| {
                received
                    .swap_remove(&c)
                    .map(|g| (c, g))
                    .ok_or(NetworkError::MissingGrid { component: c })
            })
            .collect()
    }
}

/// Everything a completed simulation produced.
#[derive(Debug)]
pub struct SimulationOutput {
    /// Final grids in output order. Empty when final grids were discarded.
    pub grids: IndexMap<Component, Grid>,
    /// Updates performed by each field kernel, in output order.
    pub updates: IndexMap<Component, u64>,
    /// Engine metrics.
    pub report: RunReport,
}

/// One-call simulation driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct Simulation;

impl Simulation {
    /// Build, run and collect a network under `config`.
    ///
    /// # Errors
    ///
    /// Any [`NetworkError`] from assembly, configuration, execution or
    /// collection.
    pub fn run(network: YeeNetwork, config: EngineConfig) -> Result<SimulationOutput, NetworkError> {
        Self::execute(network, config, None)
    }

    /// As [`run`](Self::run), with a cap on total activations.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run); hitting the cap is
    /// `NetworkError::Exec(ExecError::ActivationCapReached { .. })`.
    pub fn run_for(
        network: YeeNetwork,
        config: EngineConfig,
        max_activations: u64,
    ) -> Result<SimulationOutput, NetworkError> {
        Self::execute(network, config, Some(max_activations))
    }

    fn execute(
        network: YeeNetwork,
        config: EngineConfig,
        cap: Option<u64>,
    ) -> Result<SimulationOutput, NetworkError> {
        info!(
            dims = ?network.dims(),
            iterations = ?network.iterations(),
            "simulating Yee network"
        );
        let (topology, finals) = network.into_topology()?;
        let executor = Executor::from_builder(topology, config)?;
        let report = match cap {
            Some(n) => executor.run_for(n)?,
            None => executor.run()?,
        };
        Ok(SimulationOutput {
            grids: finals.collect()?,
            updates: finals.updates(),
            report,
        })
    }
}
