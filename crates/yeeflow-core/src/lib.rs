//! Core types and traits for the yeeflow FDTD dataflow engine.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! values that flow through a kernel graph and the contracts every layer
//! above it relies on: the [`Grid`] buffer, physical parameters, field
//! components, port tokens, identifiers, the [`Queue`] trait, and the
//! error types shared across the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod grid;
pub mod id;
pub mod phys;
pub mod queue;
pub mod token;

pub use error::{GridError, KernelError};
pub use field::{Axis, Component, FieldKind};
pub use grid::Grid;
pub use id::{EdgeId, KernelId};
pub use phys::{PhysConstants, PhysParams};
pub use queue::{Queue, QueueStats};
pub use token::{PayloadKind, Token};
