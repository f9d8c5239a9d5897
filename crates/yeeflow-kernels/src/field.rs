//! The field-update kernel shared by all six Yee components.
//!
//! A [`FieldKernel`] is parameterised by its [`Component`]; the axis
//! permutation and the magnetic/electric ordering follow from it.
//!
//! # Ports
//!
//! | index | input            | output          |
//! |-------|------------------|-----------------|
//! | 0     | `seed`           | `out_<Dβ>`      |
//! | 1     | `<Sβ>`           | `out_<Dγ>`      |
//! | 2     | `<Sγ>`           | `Final`         |
//!
//! where `S` are the two source components and `D` the two dependents
//! (for `Hx`: inputs `seed, Ey, Ez`; outputs `out_Ey, out_Ez, Final`).
//!
//! # Phases
//!
//! The first activation pops `seed` and adopts it as the kernel's grid.
//! After that, a magnetic kernel pops both sources, updates and pushes
//! copies to both dependents in one activation. An electric kernel splits
//! the same work over two activations, pushing its current grid first and
//! popping the magnetic update second, which is what lets the cycle start.
//! When the iteration budget is spent the grid goes to `Final` and the
//! kernel stops.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use yeeflow_core::{Component, FieldKind, Grid, KernelError, PhysParams};
use yeeflow_kernel::{Demand, Kernel, KernelContext, KernelStatus, PortSpec};

use crate::stencil::{apply_electric, apply_magnetic};

const SEED: usize = 0;
const SOURCES: [usize; 2] = [1, 2];
const DEPENDENTS: [usize; 2] = [0, 1];
const FINAL: usize = 2;

/// How many updates a field kernel performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Iterations {
    /// Exactly this many updates, then stop.
    Bounded(u64),
    /// Never stop.
    Unbounded,
}

impl Iterations {
    /// Map a command-line count: `0` means run forever.
    pub fn from_count(t: u64) -> Self {
        if t == 0 {
            Self::Unbounded
        } else {
            Self::Bounded(t)
        }
    }

    /// Whether `done` updates exhaust the budget.
    pub fn is_exhausted(self, done: u64) -> bool {
        match self {
            Self::Bounded(n) => done >= n,
            Self::Unbounded => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    AwaitInitial,
    /// Magnetic: pop, update, push. Electric: push the current grid.
    Steady,
    /// Electric only: pop the magnetic sources and update.
    Absorb,
    Stopped,
}

/// Updates one field component in place, once per leapfrog step.
pub struct FieldKernel {
    component: Component,
    name: String,
    params: PhysParams,
    dims: (usize, usize, usize),
    budget: Iterations,
    phase: Phase,
    grid: Option<Grid>,
    updates: Arc<AtomicU64>,
}

impl FieldKernel {
    /// A kernel for `component` on a grid of `dims`.
    pub fn new(
        component: Component,
        dims: (usize, usize, usize),
        params: PhysParams,
        budget: Iterations,
    ) -> Self {
        Self {
            component,
            name: component.to_string(),
            params,
            dims,
            budget,
            phase: Phase::AwaitInitial,
            grid: None,
            updates: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The component this kernel updates.
    pub fn component(&self) -> Component {
        self.component
    }

    /// Updates performed so far.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// A handle that keeps reading the update count after the kernel has
    /// been moved into a topology.
    pub fn update_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.updates)
    }

    /// The kernel's grid, once seeded and until it is sent to `Final`.
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    fn adopt_seed(&mut self, ctx: &mut KernelContext<'_>) -> Result<KernelStatus, KernelError> {
        let seed = ctx.pop_grid(SEED)?;
        if seed.dims() != self.dims {
            return Err(KernelError::Contract {
                reason: format!(
                    "{} seeded with a {:?} grid, expected {:?}",
                    self.name,
                    seed.dims(),
                    self.dims
                ),
            });
        }
        self.grid = Some(seed);
        self.phase = Phase::Steady;
        Ok(KernelStatus::Continue)
    }

    fn grid_mut(&mut self) -> Result<&mut Grid, KernelError> {
        self.grid.as_mut().ok_or_else(|| KernelError::Contract {
            reason: "field kernel has no grid".into(),
        })
    }

    fn finish(&mut self, ctx: &mut KernelContext<'_>) -> Result<KernelStatus, KernelError> {
        let grid = self.grid.take().ok_or_else(|| KernelError::Contract {
            reason: "field kernel has no grid".into(),
        })?;
        ctx.push_grid(FINAL, grid)?;
        self.phase = Phase::Stopped;
        Ok(KernelStatus::Stop)
    }

    fn emit(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        let grid = self.grid_mut()?.clone();
        ctx.push_grid(DEPENDENTS[0], grid.clone())?;
        ctx.push_grid(DEPENDENTS[1], grid)
    }

    fn absorb(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), KernelError> {
        let s0 = ctx.pop_grid(SOURCES[0])?;
        let s1 = ctx.pop_grid(SOURCES[1])?;
        let (c, p) = (self.component, self.params);
        let grid = self.grid_mut()?;
        match c.kind {
            FieldKind::Magnetic => apply_magnetic(c, grid, [&s0, &s1], &p)?,
            FieldKind::Electric => apply_electric(c, grid, [&s0, &s1], &p)?,
        }
        self.updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn exhausted(&self) -> bool {
        self.budget.is_exhausted(self.updates())
    }
}

impl Kernel for FieldKernel {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> Vec<PortSpec> {
        let [sb, sg] = self.component.sources();
        vec![
            PortSpec::grid("seed"),
            PortSpec::grid(sb.to_string()),
            PortSpec::grid(sg.to_string()),
        ]
    }

    fn outputs(&self) -> Vec<PortSpec> {
        let [db, dg] = self.component.dependents();
        vec![
            PortSpec::grid(format!("out_{db}")),
            PortSpec::grid(format!("out_{dg}")),
            PortSpec::grid("Final"),
        ]
    }

    fn demand(&self) -> Demand {
        match (self.phase, self.component.kind) {
            (Phase::AwaitInitial, _) => Demand::none().pops([SEED]),
            (Phase::Steady, _) if self.exhausted() => Demand::none().pushes([FINAL]),
            (Phase::Steady, FieldKind::Magnetic) => {
                Demand::none().pops(SOURCES).pushes(DEPENDENTS)
            }
            (Phase::Steady, FieldKind::Electric) => Demand::none().pushes(DEPENDENTS),
            (Phase::Absorb, _) => Demand::none().pops(SOURCES),
            (Phase::Stopped, _) => Demand::none(),
        }
    }

    fn cost(&self) -> u64 {
        let (nx, ny, nz) = self.dims;
        (nx as u64)
            .saturating_mul(ny as u64)
            .saturating_mul(nz as u64)
    }

    fn step(&mut self, ctx: &mut KernelContext<'_>) -> Result<KernelStatus, KernelError> {
        match self.phase {
            Phase::AwaitInitial => self.adopt_seed(ctx),
            Phase::Steady if self.exhausted() => self.finish(ctx),
            Phase::Steady => {
                match self.component.kind {
                    FieldKind::Magnetic => {
                        self.absorb(ctx)?;
                        self.emit(ctx)?;
                    }
                    FieldKind::Electric => {
                        self.emit(ctx)?;
                        self.phase = Phase::Absorb;
                    }
                }
                Ok(KernelStatus::Continue)
            }
            Phase::Absorb => {
                self.absorb(ctx)?;
                self.phase = Phase::Steady;
                Ok(KernelStatus::Continue)
            }
            Phase::Stopped => Err(KernelError::Contract {
                reason: format!("{} activated after stopping", self.name),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yeeflow_core::{EdgeId, KernelId, Queue, Token};
    use yeeflow_kernel::{demand_satisfied, InputPort, OutputPort};
    use yeeflow_test_utils::fixtures::impulse;
    use yeeflow_test_utils::MockQueue;

    struct Harness {
        kernel: FieldKernel,
        inputs: Vec<InputPort>,
        outputs: Vec<OutputPort>,
        in_q: Vec<Arc<MockQueue>>,
        out_q: Vec<Arc<MockQueue>>,
    }

    impl Harness {
        fn new(c: Component, budget: Iterations) -> Self {
            let kernel = FieldKernel::new(c, (2, 2, 2), PhysParams::new(2, 2, 2), budget);
            let in_q = queues();
            let out_q = queues();
            let inputs = kernel
                .inputs()
                .into_iter()
                .zip(&in_q)
                .map(|(s, q)| InputPort::new(s, EdgeId(0), Arc::clone(q) as Arc<dyn Queue>))
                .collect();
            let outputs = kernel
                .outputs()
                .into_iter()
                .zip(&out_q)
                .map(|(s, q)| OutputPort::new(s, EdgeId(0), Arc::clone(q) as Arc<dyn Queue>))
                .collect();
            Self {
                kernel,
                inputs,
                outputs,
                in_q,
                out_q,
            }
        }

        fn ready(&self) -> bool {
            demand_satisfied(&self.kernel.demand(), &self.inputs, &self.outputs).unwrap()
        }

        fn step(&mut self) -> Result<KernelStatus, KernelError> {
            let mut ctx =
                KernelContext::new(KernelId(0), &mut self.inputs, &mut self.outputs, 0);
            self.kernel.step(&mut ctx)
        }

        fn feed(&self, port: usize, g: Grid) {
            self.in_q[port].try_push(Token::Grid(g)).unwrap();
        }

        fn take(&self, port: usize) -> Option<Grid> {
            self.out_q[port].try_pop().map(|t| t.into_grid().unwrap())
        }
    }

    fn queues() -> Vec<Arc<MockQueue>> {
        (0..3).map(|_| Arc::new(MockQueue::new(Some(1)))).collect()
    }

    fn kernel(c: Component, dims: (usize, usize, usize), budget: u64) -> FieldKernel {
        let p = PhysParams::new(dims.0, dims.1, dims.2);
        FieldKernel::new(c, dims, p, Iterations::Bounded(budget))
    }

    fn zeros() -> Grid {
        Grid::zeros(2, 2, 2).unwrap()
    }

    #[test]
    fn ports_follow_component() {
        let k = kernel(Component::HX, (1, 1, 1), 1);
        let inputs: Vec<String> = k.inputs().into_iter().map(|p| p.name).collect();
        let outputs: Vec<String> = k.outputs().into_iter().map(|p| p.name).collect();
        assert_eq!(inputs, ["seed", "Ey", "Ez"]);
        assert_eq!(outputs, ["out_Ey", "out_Ez", "Final"]);

        let k = kernel(Component::EZ, (1, 1, 1), 1);
        let inputs: Vec<String> = k.inputs().into_iter().map(|p| p.name).collect();
        assert_eq!(inputs, ["seed", "Hx", "Hy"]);
    }

    #[test]
    fn first_activation_only_needs_seed() {
        let k = kernel(Component::EY, (2, 2, 2), 3);
        assert_eq!(k.demand(), Demand::none().pops([0]));
        assert_eq!(k.cost(), 8);
    }

    #[test]
    fn magnetic_lifecycle() {
        let mut h = Harness::new(Component::HX, Iterations::Bounded(1));
        assert!(!h.ready());
        h.feed(0, zeros());
        assert!(h.ready());
        assert_eq!(h.step(), Ok(KernelStatus::Continue));
        assert_eq!(h.kernel.updates(), 0);

        // Steady: waits for both E sources.
        h.feed(1, impulse((2, 2, 2), (0, 0, 1), 1.0));
        assert!(!h.ready());
        h.feed(2, zeros());
        assert!(h.ready());
        assert_eq!(h.step(), Ok(KernelStatus::Continue));
        assert_eq!(h.kernel.updates(), 1);

        let p = PhysParams::new(2, 2, 2);
        let to_ey = h.take(0).unwrap();
        let to_ez = h.take(1).unwrap();
        assert_eq!(to_ey.at(0, 0, 0), p.ch * p.cz);
        assert_eq!(to_ey, to_ez);

        // Budget spent: Final, then Stop.
        assert_eq!(h.kernel.demand(), Demand::none().pushes([2]));
        assert_eq!(h.step(), Ok(KernelStatus::Stop));
        assert_eq!(h.take(2).unwrap(), to_ey);
        assert!(h.kernel.grid().is_none());
    }

    #[test]
    fn electric_pushes_before_popping() {
        let mut e = Harness::new(Component::EX, Iterations::Bounded(1));
        e.feed(0, impulse((2, 2, 2), (1, 1, 1), 2.0));
        e.step().unwrap();

        // Emit needs no input.
        assert_eq!(e.kernel.demand(), Demand::none().pushes([0, 1]));
        assert!(e.ready());
        e.step().unwrap();
        assert_eq!(e.take(0).unwrap().at(1, 1, 1), 2.0);
        assert_eq!(e.take(1).unwrap().at(1, 1, 1), 2.0);
        assert_eq!(e.kernel.updates(), 0);

        // Absorb waits for both H sources.
        assert_eq!(e.kernel.demand(), Demand::none().pops([1, 2]));
        e.feed(1, impulse((2, 2, 2), (1, 1, 1), 1.0));
        e.feed(2, zeros());
        e.step().unwrap();
        assert_eq!(e.kernel.updates(), 1);

        let p = PhysParams::new(2, 2, 2);
        assert_eq!(e.step(), Ok(KernelStatus::Stop));
        assert_eq!(e.take(2).unwrap().at(1, 1, 1), 2.0 - p.ce * p.cz);
    }

    #[test]
    fn zero_budget_goes_straight_to_final() {
        let mut h = Harness::new(Component::HZ, Iterations::Bounded(0));
        h.feed(0, impulse((2, 2, 2), (0, 0, 0), 5.0));
        h.step().unwrap();
        assert_eq!(h.step(), Ok(KernelStatus::Stop));
        assert_eq!(h.take(2).unwrap().at(0, 0, 0), 5.0);
        assert_eq!(h.kernel.updates(), 0);
    }

    #[test]
    fn unbounded_never_exhausts() {
        assert!(!Iterations::Unbounded.is_exhausted(u64::MAX));
        assert_eq!(Iterations::from_count(0), Iterations::Unbounded);
        assert_eq!(Iterations::from_count(4), Iterations::Bounded(4));
        assert!(Iterations::Bounded(4).is_exhausted(4));
    }

    #[test]
    fn wrong_seed_dims_rejected() {
        let mut h = Harness::new(Component::HY, Iterations::Bounded(1));
        h.feed(0, Grid::zeros(3, 2, 2).unwrap());
        assert!(matches!(h.step(), Err(KernelError::Contract { .. })));
    }

    #[test]
    fn emitted_grid_does_not_alias_state() {
        let mut e = Harness::new(Component::EY, Iterations::Bounded(2));
        e.feed(0, zeros());
        e.step().unwrap();
        e.step().unwrap();
        let mut sent = e.take(0).unwrap();
        sent[0] = 42.0;
        assert_eq!(e.kernel.grid().unwrap()[0], 0.0);
    }
}
