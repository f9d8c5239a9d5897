//! Seed generators: the zero-input kernels that start every cycle.
//!
//! Each field kernel's first activation pops one grid from its `seed`
//! input. A [`SeedGenerator`] provides it. Random fills use an explicit,
//! per-generator ChaCha8 stream so that identical seeds produce identical
//! runs regardless of scheduling.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use yeeflow_core::{Grid, KernelError};
use yeeflow_kernel::{Demand, Kernel, KernelContext, KernelStatus, PortSpec};

/// What a [`SeedGenerator`] fills its grids with.
#[derive(Clone, Debug, PartialEq)]
pub enum SeedFill {
    /// All zeros.
    Zeros,
    /// Uniform samples in `[0, 1)` from a ChaCha8 stream seeded with `seed`.
    Random {
        /// Stream seed.
        seed: u64,
    },
    /// Copies of this grid.
    Provided(Grid),
}

/// Emits `count` grids of one fill on output `out`, then stops.
pub struct SeedGenerator {
    name: String,
    dims: (usize, usize, usize),
    fill: SeedFill,
    count: u64,
    emitted: u64,
    rng: Option<ChaCha8Rng>,
}

impl SeedGenerator {
    /// A generator of one grid of `dims`.
    ///
    /// For [`SeedFill::Provided`] the grid's own dimensions win over `dims`.
    pub fn new(name: impl Into<String>, dims: (usize, usize, usize), fill: SeedFill) -> Self {
        let dims = match &fill {
            SeedFill::Provided(g) => g.dims(),
            _ => dims,
        };
        let rng = match fill {
            SeedFill::Random { seed } => Some(ChaCha8Rng::seed_from_u64(seed)),
            _ => None,
        };
        Self {
            name: name.into(),
            dims,
            fill,
            count: 1,
            emitted: 0,
            rng,
        }
    }

    /// Emit `count` grids instead of one.
    pub fn repeat(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    fn make(&mut self) -> Result<Grid, KernelError> {
        let (nx, ny, nz) = self.dims;
        let grid = match (&self.fill, self.rng.as_mut()) {
            (SeedFill::Random { .. }, Some(rng)) => Grid::random(nx, ny, nz, rng)?,
            (SeedFill::Provided(g), _) => g.clone(),
            _ => Grid::zeros(nx, ny, nz)?,
        };
        Ok(grid)
    }
}

impl Kernel for SeedGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> Vec<PortSpec> {
        vec![]
    }

    fn outputs(&self) -> Vec<PortSpec> {
        vec![PortSpec::grid("out")]
    }

    fn demand(&self) -> Demand {
        if self.emitted < self.count {
            Demand::none().pushes([0])
        } else {
            Demand::none()
        }
    }

    fn step(&mut self, ctx: &mut KernelContext<'_>) -> Result<KernelStatus, KernelError> {
        if self.emitted < self.count {
            let grid = self.make()?;
            ctx.push_grid(0, grid)?;
            self.emitted += 1;
        }
        Ok(if self.emitted >= self.count {
            KernelStatus::Stop
        } else {
            KernelStatus::Continue
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use yeeflow_core::{EdgeId, KernelId, Queue};
    use yeeflow_kernel::{InputPort, OutputPort};
    use yeeflow_test_utils::MockQueue;

    fn drain(mut g: SeedGenerator) -> Vec<Grid> {
        let q = Arc::new(MockQueue::new(None));
        let mut outputs = vec![OutputPort::new(
            PortSpec::grid("out"),
            EdgeId(0),
            Arc::clone(&q) as Arc<dyn Queue>,
        )];
        let mut inputs: Vec<InputPort> = Vec::new();
        let mut n = 0;
        loop {
            let mut ctx = KernelContext::new(KernelId(0), &mut inputs, &mut outputs, n);
            n += 1;
            if g.step(&mut ctx).unwrap() == KernelStatus::Stop {
                break;
            }
        }
        q.contents()
            .into_iter()
            .map(|t| t.into_grid().unwrap())
            .collect()
    }

    #[test]
    fn zeros_repeat() {
        let grids = drain(SeedGenerator::new("z", (2, 3, 1), SeedFill::Zeros).repeat(3));
        assert_eq!(grids.len(), 3);
        assert!(grids.iter().all(|g| g.dims() == (2, 3, 1)));
        assert!(grids[0].as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn random_is_deterministic_per_seed() {
        let a = drain(SeedGenerator::new("a", (3, 3, 3), SeedFill::Random { seed: 7 }));
        let b = drain(SeedGenerator::new("b", (3, 3, 3), SeedFill::Random { seed: 7 }));
        let c = drain(SeedGenerator::new("c", (3, 3, 3), SeedFill::Random { seed: 8 }));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a[0].as_slice().iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn provided_grid_sets_dims() {
        let g = Grid::from_vec((2, 1, 1), vec![1.0, 2.0]).unwrap();
        let out = drain(SeedGenerator::new("p", (9, 9, 9), SeedFill::Provided(g.clone())));
        assert_eq!(out, vec![g]);
    }

    #[test]
    fn zero_dimension_surfaces_as_kernel_error() {
        let mut g = SeedGenerator::new("bad", (0, 1, 1), SeedFill::Zeros);
        let mut outputs = vec![OutputPort::new(
            PortSpec::grid("out"),
            EdgeId(0),
            Arc::new(MockQueue::new(None)) as Arc<dyn Queue>,
        )];
        let mut inputs: Vec<InputPort> = Vec::new();
        let mut ctx = KernelContext::new(KernelId(0), &mut inputs, &mut outputs, 0);
        assert!(matches!(g.step(&mut ctx), Err(KernelError::Contract { .. })));
    }
}
