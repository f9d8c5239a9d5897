//! Yee field kernels and the six-component FDTD network.
//!
//! [`FieldKernel`] applies one leapfrog update of a single field component
//! per step, using the stencils in [`stencil`]. [`SeedGenerator`]s provide
//! the initial grids that break the `H ↔ E` dependency cycle, and
//! [`GridSink`]s receive each component's final grid.
//!
//! [`YeeNetwork`] wires all eighteen kernels into a
//! [`TopologyBuilder`](yeeflow_engine::TopologyBuilder);
//! [`Simulation::run`] builds, executes and collects in one call.
//!
//! ```
//! use yeeflow_engine::EngineConfig;
//! use yeeflow_kernels::{Iterations, SeedPlan, Simulation, YeeNetwork};
//!
//! let network = YeeNetwork::builder()
//!     .dims(3, 3, 3)
//!     .iterations(Iterations::Bounded(2))
//!     .seed(SeedPlan::Random { seed: 7 })
//!     .build()
//!     .unwrap();
//! let out = Simulation::run(network, EngineConfig::default()).unwrap();
//! assert_eq!(out.grids.len(), 6);
//! assert!(out.updates.values().all(|&n| n == 2));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod field;
pub mod generator;
pub mod network;
pub mod sink;
pub mod stencil;

pub use field::{FieldKernel, Iterations};
pub use generator::{SeedFill, SeedGenerator};
pub use network::{
    FinalGrids, NetworkError, SeedPlan, Simulation, SimulationOutput, YeeNetwork, YeeNetworkBuilder,
};
pub use sink::{GridSink, SinkMode};
pub use stencil::{apply_electric, apply_magnetic};
