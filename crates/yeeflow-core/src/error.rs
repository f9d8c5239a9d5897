//! Error types shared across the yeeflow workspace.
//!
//! Construction-time failures (bad grid shapes) and kernel contract
//! failures live here because both the kernel layer and the engine need
//! them. Topology, configuration, and execution errors are defined next to
//! the code that raises them.

use std::error::Error;
use std::fmt;

use crate::token::PayloadKind;

/// Errors from constructing a [`Grid`](crate::Grid).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GridError {
    /// One or more extents is zero.
    ZeroDimension {
        /// The requested `(nx, ny, nz)`.
        dims: (usize, usize, usize),
    },
    /// `nx * ny * nz` overflows `usize`.
    TooLarge {
        /// The requested `(nx, ny, nz)`.
        dims: (usize, usize, usize),
    },
    /// A flat buffer does not match the requested shape.
    LengthMismatch {
        /// `nx * ny * nz`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDimension { dims } => {
                write!(f, "grid dimensions must be positive, got {dims:?}")
            }
            Self::TooLarge { dims } => {
                write!(f, "grid dimensions {dims:?} overflow the element count")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "buffer has {actual} samples, shape needs {expected}")
            }
        }
    }
}

impl Error for GridError {}

/// Errors raised by a kernel's `step()`.
///
/// None of these are recoverable: the executor aborts the run and reports
/// the failing kernel. With a correct demand declaration a kernel never sees
/// `PortEmpty` or `PortFull`; they indicate a kernel that touched a port it
/// did not declare.
#[derive(Clone, Debug, PartialEq)]
pub enum KernelError {
    /// `pop` on an input with no buffered token.
    PortEmpty {
        /// Name of the input port.
        port: String,
    },
    /// `push` on an output whose queue has no room.
    PortFull {
        /// Name of the output port.
        port: String,
    },
    /// A token of the wrong payload kind was pushed or popped.
    WrongPayload {
        /// Name of the port.
        port: String,
        /// The kind declared for the port.
        expected: PayloadKind,
        /// The kind actually seen.
        actual: PayloadKind,
    },
    /// The port index does not exist on this kernel.
    NoSuchPort {
        /// The offending index.
        index: usize,
    },
    /// A kernel-specific invariant was violated.
    Contract {
        /// Human-readable description.
        reason: String,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PortEmpty { port } => write!(f, "pop on empty port '{port}'"),
            Self::PortFull { port } => write!(f, "push on full port '{port}'"),
            Self::WrongPayload {
                port,
                expected,
                actual,
            } => write!(
                f,
                "port '{port}' carries {expected} tokens, got {actual}"
            ),
            Self::NoSuchPort { index } => write!(f, "no port at index {index}"),
            Self::Contract { reason } => write!(f, "contract violation: {reason}"),
        }
    }
}

impl Error for KernelError {}

impl From<GridError> for KernelError {
    fn from(e: GridError) -> Self {
        Self::Contract {
            reason: e.to_string(),
        }
    }
}
