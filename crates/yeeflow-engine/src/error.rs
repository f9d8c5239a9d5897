//! Errors raised while running a graph.

use std::error::Error;
use std::fmt;

use yeeflow_core::KernelError;

/// Errors from [`Executor::run`](crate::Executor::run).
#[derive(Clone, Debug, PartialEq)]
pub enum ExecError {
    /// A kernel's `step` returned an error. The run was aborted.
    KernelFailed {
        /// Name of the failing kernel.
        kernel: String,
        /// The kernel's error.
        reason: KernelError,
    },
    /// No kernel can ever become ready again but some have not stopped.
    Stalled {
        /// Names of the kernels that never stopped.
        pending: Vec<String>,
    },
    /// The external activation cap passed to
    /// [`Executor::run_for`](crate::Executor::run_for) was reached.
    ActivationCapReached {
        /// The cap.
        activations: u64,
    },
    /// The partitioning did not assign every kernel exactly once.
    InvalidPartitioning {
        /// What was wrong.
        reason: String,
    },
    /// An execution unit panicked.
    WorkerPanicked {
        /// Thread name of the unit.
        unit: String,
    },
    /// An execution unit thread could not be spawned.
    SpawnFailed {
        /// The OS error, rendered.
        reason: String,
    },
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KernelFailed { kernel, reason } => {
                write!(f, "kernel '{kernel}' failed: {reason}")
            }
            Self::Stalled { pending } => {
                write!(f, "graph stalled with {} kernel(s) pending: ", pending.len())?;
                write!(f, "{}", pending.join(", "))
            }
            Self::ActivationCapReached { activations } => {
                write!(f, "activation cap of {activations} reached")
            }
            Self::InvalidPartitioning { reason } => {
                write!(f, "invalid partitioning: {reason}")
            }
            Self::WorkerPanicked { unit } => write!(f, "execution unit '{unit}' panicked"),
            Self::SpawnFailed { reason } => write!(f, "thread spawn failed: {reason}"),
        }
    }
}

impl Error for ExecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::KernelFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
