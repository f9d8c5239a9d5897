//! Kernel trait, port endpoints and topology validation for yeeflow.
//!
//! A [`Kernel`] is a stateful dataflow unit with named input and output
//! ports. Before every activation it declares a [`Demand`]: the inputs it
//! will pop and the outputs it will push. The engine only calls
//! [`Kernel::step`] once that demand is satisfied, which is how pops on
//! empty ports and pushes on full ports suspend a kernel without blocking
//! a thread.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod kernel;
pub mod port;
pub mod validate;

pub use context::{demand_satisfied, KernelContext};
pub use kernel::{Demand, Kernel, KernelStatus, PortSpec};
pub use port::{InputPort, OutputPort};
pub use validate::{
    validate_topology, Connection, Direction, KernelDecl, TopologyError, WiringPlan,
};
