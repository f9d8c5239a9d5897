//! Yeeflow: a dataflow engine for Yee-scheme FDTD electromagnetic simulation.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! yeeflow sub-crates. For most users, adding `yeeflow` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use yeeflow::prelude::*;
//!
//! // Four leapfrog steps on an 8×8×8 grid, one thread per kernel,
//! // lock-free queues.
//! let network = YeeNetwork::builder()
//!     .dims(8, 8, 8)
//!     .iterations(Iterations::Bounded(4))
//!     .seed(SeedPlan::Random { seed: 42 })
//!     .build()
//!     .unwrap();
//! let config = EngineConfig::default()
//!     .with_partition(KernelPerThread)
//!     .with_allocation(LockFree { capacity: 1 });
//! let out = Simulation::run(network, config).unwrap();
//!
//! assert_eq!(out.grids[&Component::EZ].dims(), (8, 8, 8));
//! assert_eq!(out.report.units, 18);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `yeeflow-core` | Grids, components, physical parameters, tokens, the `Queue` trait |
//! | [`kernel`] | `yeeflow-kernel` | Kernel trait, ports, demands and topology validation |
//! | [`engine`] | `yeeflow-engine` | Queues, strategies, topology builder and executor |
//! | [`kernels`] | `yeeflow-kernels` | Field kernels, seeds, sinks and the Yee network |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core value types and contracts (`yeeflow-core`).
///
/// Contains [`types::Grid`], [`types::Component`], [`types::PhysParams`],
/// the [`types::Queue`] trait and the shared error types.
pub use yeeflow_core as types;

/// Kernel trait, ports and topology validation (`yeeflow-kernel`).
///
/// The [`kernel::Kernel`] trait is the main extension point for
/// user-defined operators.
pub use yeeflow_kernel as kernel;

/// Queue implementations, strategies and the executor (`yeeflow-engine`).
///
/// Build graphs with [`engine::TopologyBuilder`], choose strategies through
/// [`engine::EngineConfig`], and run them with [`engine::Executor`].
pub use yeeflow_engine as engine;

/// Yee field kernels and network wiring (`yeeflow-kernels`).
///
/// [`kernels::YeeNetwork`] assembles the six-component network;
/// [`kernels::Simulation`] runs it end to end.
pub use yeeflow_kernels as kernels;

/// Common imports for typical yeeflow usage.
///
/// ```rust
/// use yeeflow::prelude::*;
/// ```
///
/// This imports the most frequently used types: the network builder, the
/// engine configuration and its strategies, the kernel trait, and core
/// field types.
pub mod prelude {
    // Core types
    pub use yeeflow_core::{Component, FieldKind, Grid, PhysConstants, PhysParams, Token};

    // Errors
    pub use yeeflow_core::{GridError, KernelError};
    pub use yeeflow_engine::{ConfigError, ExecError};
    pub use yeeflow_kernel::TopologyError;
    pub use yeeflow_kernels::NetworkError;

    // Kernels
    pub use yeeflow_kernel::{Demand, Kernel, KernelContext, KernelStatus, PortSpec};

    // Engine
    pub use yeeflow_engine::{
        CostBalanced, Cooperative, EngineConfig, Executor, FixedCapacity, Growable,
        KernelPerThread, LockFree, RunReport, SinglePartition, TopologyBuilder, WorkerPool,
    };

    // Network
    pub use yeeflow_kernels::{Iterations, SeedPlan, Simulation, SimulationOutput, YeeNetwork};
}
