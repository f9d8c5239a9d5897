//! The [`Kernel`] trait, [`Demand`], [`PortSpec`] and [`KernelStatus`].
//!
//! Kernels are stateful operators activated repeatedly by the engine until
//! they return [`KernelStatus::Stop`]. They declare their ports once, at
//! graph construction, and their per-activation port usage through
//! [`Kernel::demand`] before every step.

use smallvec::SmallVec;
use yeeflow_core::{KernelError, PayloadKind};

use crate::context::KernelContext;

/// Name and payload kind of one port.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortSpec {
    /// Port name, unique within one direction of one kernel.
    pub name: String,
    /// Payload kind carried by the port.
    pub kind: PayloadKind,
}

impl PortSpec {
    /// A port carrying whole grids.
    pub fn grid(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PayloadKind::Grid,
        }
    }

    /// A port carrying single samples.
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PayloadKind::Scalar,
        }
    }
}

/// Result of one activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelStatus {
    /// Activate again once the next demand is satisfied.
    Continue,
    /// Terminal. The engine never activates this kernel again.
    Stop,
}

/// The ports the next activation will pop from and push to.
///
/// Indices refer to the kernel's [`inputs`](Kernel::inputs) and
/// [`outputs`](Kernel::outputs) in declaration order. The engine activates
/// the kernel only when every `pops` input holds at least one token and
/// every `pushes` output has room for one more. An empty demand is always
/// satisfied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Demand {
    pops: SmallVec<[usize; 4]>,
    pushes: SmallVec<[usize; 4]>,
}

impl Demand {
    /// A demand with no ports: always satisfied.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add inputs that must hold a token.
    pub fn pops(mut self, inputs: impl IntoIterator<Item = usize>) -> Self {
        self.pops.extend(inputs);
        self
    }

    /// Add outputs that must have room.
    pub fn pushes(mut self, outputs: impl IntoIterator<Item = usize>) -> Self {
        self.pushes.extend(outputs);
        self
    }

    /// Inputs that must hold a token.
    pub fn pop_ports(&self) -> &[usize] {
        &self.pops
    }

    /// Outputs that must have room.
    pub fn push_ports(&self) -> &[usize] {
        &self.pushes
    }

    /// Whether the demand names no ports.
    pub fn is_empty(&self) -> bool {
        self.pops.is_empty() && self.pushes.is_empty()
    }
}

/// A stateful unit in the dataflow graph.
///
/// # Contract
///
/// - `inputs()` and `outputs()` are called once at graph construction.
/// - `demand()` is called before every activation. On a kernel that has
///   never been stepped it describes the *first* activation, which the
///   topology validator uses to prove the graph can start.
/// - `step()` must only touch the ports named in the demand it just
///   returned. It may pop each declared input once and push each declared
///   output once.
/// - Returning [`KernelStatus::Stop`] is terminal; any final output must
///   already have been pushed.
///
/// # Examples
///
/// A source that emits `n` scalars and stops:
///
/// ```
/// use yeeflow_kernel::{Demand, Kernel, KernelContext, KernelStatus, PortSpec};
/// use yeeflow_core::{KernelError, Token};
///
/// struct Countdown {
///     n: u32,
/// }
///
/// impl Kernel for Countdown {
///     fn name(&self) -> &str { "countdown" }
///     fn inputs(&self) -> Vec<PortSpec> { vec![] }
///     fn outputs(&self) -> Vec<PortSpec> { vec![PortSpec::scalar("out")] }
///     fn demand(&self) -> Demand { Demand::none().pushes([0]) }
///     fn step(&mut self, ctx: &mut KernelContext<'_>) -> Result<KernelStatus, KernelError> {
///         ctx.push(0, Token::Scalar(f64::from(self.n)))?;
///         self.n -= 1;
///         Ok(if self.n == 0 { KernelStatus::Stop } else { KernelStatus::Continue })
///     }
/// }
///
/// let k = Countdown { n: 3 };
/// assert_eq!(k.name(), "countdown");
/// assert_eq!(k.demand().push_ports(), &[0]);
/// ```
pub trait Kernel: Send + 'static {
    /// Human-readable name for errors and logs.
    fn name(&self) -> &str;

    /// Input ports, in index order.
    fn inputs(&self) -> Vec<PortSpec>;

    /// Output ports, in index order.
    fn outputs(&self) -> Vec<PortSpec>;

    /// Ports the next activation pops from and pushes to.
    fn demand(&self) -> Demand;

    /// Relative cost of one activation, used by cost-balanced partitioning.
    ///
    /// Default: 1.
    fn cost(&self) -> u64 {
        1
    }

    /// Run one activation.
    fn step(&mut self, ctx: &mut KernelContext<'_>) -> Result<KernelStatus, KernelError>;
}
