//! Terminal kernels that receive each field's final grid.

use crossbeam_channel::Sender;
use tracing::debug;
use yeeflow_core::{Component, Grid, KernelError};
use yeeflow_kernel::{Demand, Kernel, KernelContext, KernelStatus, PortSpec};

/// Where a [`GridSink`] sends what it receives.
#[derive(Clone, Debug)]
pub enum SinkMode {
    /// Forward `(component, grid)` to a channel.
    Forward(Sender<(Component, Grid)>),
    /// Drop the grid. The simulation still runs in full.
    Discard,
}

/// Pops one grid from `grid`, hands it to its [`SinkMode`], and stops.
pub struct GridSink {
    name: String,
    component: Component,
    mode: SinkMode,
}

impl GridSink {
    /// A sink for the final grid of `component`.
    pub fn new(component: Component, mode: SinkMode) -> Self {
        Self {
            name: format!("final_{component}"),
            component,
            mode,
        }
    }
}

impl Kernel for GridSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> Vec<PortSpec> {
        vec![PortSpec::grid("grid")]
    }

    fn outputs(&self) -> Vec<PortSpec> {
        vec![]
    }

    fn demand(&self) -> Demand {
        Demand::none().pops([0])
    }

    fn step(&mut self, ctx: &mut KernelContext<'_>) -> Result<KernelStatus, KernelError> {
        let grid = ctx.pop_grid(0)?;
        if let SinkMode::Forward(tx) = &self.mode {
            if tx.send((self.component, grid)).is_err() {
                debug!(sink = %self.name, "final grid receiver dropped");
            }
        }
        Ok(KernelStatus::Stop)
    }
}
