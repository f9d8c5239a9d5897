//! Execution context passed to kernels during an activation.
//!
//! [`KernelContext`] borrows the activated kernel's port endpoints for the
//! duration of one `step()`. Ports are addressed by index in declaration
//! order; the engine owns the endpoints between activations.

use yeeflow_core::{Grid, KernelError, KernelId, Token};

use crate::kernel::Demand;
use crate::port::{InputPort, OutputPort};

/// Port access for one activation.
pub struct KernelContext<'a> {
    id: KernelId,
    inputs: &'a mut [InputPort],
    outputs: &'a mut [OutputPort],
    activation: u64,
}

impl<'a> KernelContext<'a> {
    /// Construct a context over a kernel's endpoints.
    ///
    /// Typically called by the engine. Tests build one directly from
    /// endpoints bound to mock queues.
    pub fn new(
        id: KernelId,
        inputs: &'a mut [InputPort],
        outputs: &'a mut [OutputPort],
        activation: u64,
    ) -> Self {
        Self {
            id,
            inputs,
            outputs,
            activation,
        }
    }

    /// Id of the kernel being activated.
    pub fn kernel_id(&self) -> KernelId {
        self.id
    }

    /// Zero-based count of this kernel's previous activations.
    pub fn activation(&self) -> u64 {
        self.activation
    }

    fn input(&mut self, index: usize) -> Result<&mut InputPort, KernelError> {
        self.inputs
            .get_mut(index)
            .ok_or(KernelError::NoSuchPort { index })
    }

    fn output(&mut self, index: usize) -> Result<&mut OutputPort, KernelError> {
        self.outputs
            .get_mut(index)
            .ok_or(KernelError::NoSuchPort { index })
    }

    /// Pop the oldest token from input `index`.
    pub fn pop(&mut self, index: usize) -> Result<Token, KernelError> {
        self.input(index)?.pop()
    }

    /// Pop a grid from input `index`.
    pub fn pop_grid(&mut self, index: usize) -> Result<Grid, KernelError> {
        let port = self.input(index)?;
        let token = port.pop()?;
        token.into_grid().map_err(|t| KernelError::WrongPayload {
            port: port.spec().name.clone(),
            expected: yeeflow_core::PayloadKind::Grid,
            actual: t.kind(),
        })
    }

    /// A copy of the oldest token on input `index`, left in place.
    pub fn peek(&self, index: usize) -> Result<Option<Token>, KernelError> {
        self.inputs
            .get(index)
            .map(InputPort::peek)
            .ok_or(KernelError::NoSuchPort { index })
    }

    /// Number of tokens buffered on input `index`.
    pub fn input_len(&self, index: usize) -> Result<usize, KernelError> {
        self.inputs
            .get(index)
            .map(InputPort::len)
            .ok_or(KernelError::NoSuchPort { index })
    }

    /// Push a token to output `index`.
    pub fn push(&mut self, index: usize, token: Token) -> Result<(), KernelError> {
        self.output(index)?.push(token)
    }

    /// Push a grid to output `index`.
    pub fn push_grid(&mut self, index: usize, grid: Grid) -> Result<(), KernelError> {
        self.push(index, Token::Grid(grid))
    }

    /// Whether output `index` has room for one more token.
    pub fn has_room(&self, index: usize) -> Result<bool, KernelError> {
        self.outputs
            .get(index)
            .map(OutputPort::has_room)
            .ok_or(KernelError::NoSuchPort { index })
    }
}

/// Whether `demand` is satisfied by the given endpoints.
///
/// # Errors
///
/// [`KernelError::NoSuchPort`] if the demand names a port the kernel does
/// not have.
pub fn demand_satisfied(
    demand: &Demand,
    inputs: &[InputPort],
    outputs: &[OutputPort],
) -> Result<bool, KernelError> {
    for &i in demand.pop_ports() {
        let port = inputs.get(i).ok_or(KernelError::NoSuchPort { index: i })?;
        if port.is_empty() {
            return Ok(false);
        }
    }
    for &o in demand.push_ports() {
        let port = outputs.get(o).ok_or(KernelError::NoSuchPort { index: o })?;
        if !port.has_room() {
            return Ok(false);
        }
    }
    Ok(true)
}
