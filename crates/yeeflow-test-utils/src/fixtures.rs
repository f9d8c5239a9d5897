//! Reusable kernel and grid fixtures.
//!
//! Mock kernels for engine testing:
//!
//! - [`ScalarSource`] emits `0.0, 1.0, …` and stops after `count` tokens.
//! - [`Relay`] forwards scalars one to one.
//! - [`CollectSink`] records every scalar it pops.
//! - [`FailingKernel`] fails on a chosen activation.
//!
//! Grid helpers: [`impulse`] and the loop-per-cell reference stencils
//! [`reference_magnetic`] / [`reference_electric`], written for clarity
//! rather than speed so optimised stencils can be checked against them.

use std::sync::Arc;

use parking_lot::Mutex;
use yeeflow_core::{Component, Grid, KernelError, PhysParams, Token};
use yeeflow_kernel::{Demand, Kernel, KernelContext, KernelStatus, PortSpec};

// ── Mock kernels ───────────────────────────────────────────────────

/// Emits `count` scalars on output `out`, then stops.
pub struct ScalarSource {
    pub name: String,
    pub count: u64,
    emitted: u64,
}

impl ScalarSource {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
            emitted: 0,
        }
    }
}

impl Kernel for ScalarSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> Vec<PortSpec> {
        vec![]
    }

    fn outputs(&self) -> Vec<PortSpec> {
        vec![PortSpec::scalar("out")]
    }

    fn demand(&self) -> Demand {
        if self.emitted < self.count {
            Demand::none().pushes([0])
        } else {
            Demand::none()
        }
    }

    fn step(&mut self, ctx: &mut KernelContext<'_>) -> Result<KernelStatus, KernelError> {
        if self.emitted == self.count {
            return Ok(KernelStatus::Stop);
        }
        ctx.push(0, Token::Scalar(self.emitted as f64))?;
        self.emitted += 1;
        Ok(if self.emitted == self.count {
            KernelStatus::Stop
        } else {
            KernelStatus::Continue
        })
    }
}

/// Forwards `count` scalars from `in` to `out`, then stops.
pub struct Relay {
    pub name: String,
    pub count: u64,
    forwarded: u64,
}

impl Relay {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
            forwarded: 0,
        }
    }
}

impl Kernel for Relay {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> Vec<PortSpec> {
        vec![PortSpec::scalar("in")]
    }

    fn outputs(&self) -> Vec<PortSpec> {
        vec![PortSpec::scalar("out")]
    }

    fn demand(&self) -> Demand {
        Demand::none().pops([0]).pushes([0])
    }

    fn step(&mut self, ctx: &mut KernelContext<'_>) -> Result<KernelStatus, KernelError> {
        let token = ctx.pop(0)?;
        ctx.push(0, token)?;
        self.forwarded += 1;
        Ok(if self.forwarded == self.count {
            KernelStatus::Stop
        } else {
            KernelStatus::Continue
        })
    }
}

/// Pops `count` scalars from `in` into a shared log, then stops.
pub struct CollectSink {
    pub name: String,
    pub count: u64,
    log: Arc<Mutex<Vec<f64>>>,
}

impl CollectSink {
    /// Returns the sink and a handle to the values it will record.
    pub fn new(name: impl Into<String>, count: u64) -> (Self, Arc<Mutex<Vec<f64>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                name: name.into(),
                count,
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

impl Kernel for CollectSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> Vec<PortSpec> {
        vec![PortSpec::scalar("in")]
    }

    fn outputs(&self) -> Vec<PortSpec> {
        vec![]
    }

    fn demand(&self) -> Demand {
        Demand::none().pops([0])
    }

    fn step(&mut self, ctx: &mut KernelContext<'_>) -> Result<KernelStatus, KernelError> {
        let value = ctx
            .pop(0)?
            .into_scalar()
            .map_err(|t| KernelError::Contract {
                reason: format!("expected scalar, got {}", t.kind()),
            })?;
        let mut log = self.log.lock();
        log.push(value);
        Ok(if log.len() as u64 == self.count {
            KernelStatus::Stop
        } else {
            KernelStatus::Continue
        })
    }
}

/// A zero-port kernel that fails on activation `fail_at` (zero-based).
pub struct FailingKernel {
    pub name: String,
    pub fail_at: u64,
}

impl FailingKernel {
    pub fn new(name: impl Into<String>, fail_at: u64) -> Self {
        Self {
            name: name.into(),
            fail_at,
        }
    }
}

impl Kernel for FailingKernel {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> Vec<PortSpec> {
        vec![]
    }

    fn outputs(&self) -> Vec<PortSpec> {
        vec![]
    }

    fn demand(&self) -> Demand {
        Demand::none()
    }

    fn step(&mut self, ctx: &mut KernelContext<'_>) -> Result<KernelStatus, KernelError> {
        if ctx.activation() == self.fail_at {
            return Err(KernelError::Contract {
                reason: format!("deliberate failure at activation {}", self.fail_at),
            });
        }
        Ok(KernelStatus::Continue)
    }
}

// ── Grids ──────────────────────────────────────────────────────────

/// A zero grid with `value` at `(x, y, z)`.
///
/// # Panics
///
/// If the dimensions are zero or the point lies outside the grid.
pub fn impulse(
    (nx, ny, nz): (usize, usize, usize),
    (x, y, z): (usize, usize, usize),
    value: f64,
) -> Grid {
    let mut g = Grid::zeros(nx, ny, nz).expect("fixture dimensions must be non-zero");
    *g.at_mut(x, y, z) = value;
    g
}

/// A grid whose sample at flat index `i` is `base + i`.
pub fn ramp((nx, ny, nz): (usize, usize, usize), base: f64) -> Grid {
    let data = (0..nx * ny * nz).map(|i| base + i as f64).collect();
    Grid::from_vec((nx, ny, nz), data).expect("fixture dimensions must be non-zero")
}

fn shifted(
    (x, y, z): (usize, usize, usize),
    (dx, dy, dz): (usize, usize, usize),
) -> (usize, usize, usize) {
    (x + dx, y + dy, z + dz)
}

/// One magnetic update of `h` (component `c`), one cell at a time.
///
/// `sources` are `[Eβ, Eγ]` in the order of [`Component::sources`].
pub fn reference_magnetic(c: Component, h: &Grid, sources: [&Grid; 2], p: &PhysParams) -> Grid {
    let (beta, gamma) = c.orthogonal();
    let [eb, eg] = sources;
    let (cb, cg) = (p.courant(beta), p.courant(gamma));
    let (nx, ny, nz) = h.dims();
    let mut out = h.clone();
    for z in 0..nz.saturating_sub(1) {
        for y in 0..ny.saturating_sub(1) {
            for x in 0..nx.saturating_sub(1) {
                let here = (x, y, z);
                let (gx, gy, gz) = shifted(here, gamma.offset());
                let (bx, by, bz) = shifted(here, beta.offset());
                let curl = (eb.at(gx, gy, gz) - eb.at(x, y, z)) * cg
                    - (eg.at(bx, by, bz) - eg.at(x, y, z)) * cb;
                *out.at_mut(x, y, z) += p.ch * curl;
            }
        }
    }
    out
}

/// One electric update of `e` (component `c`), one cell at a time.
///
/// `sources` are `[Hβ, Hγ]` in the order of [`Component::sources`].
pub fn reference_electric(c: Component, e: &Grid, sources: [&Grid; 2], p: &PhysParams) -> Grid {
    let (beta, gamma) = c.orthogonal();
    let [hb, hg] = sources;
    let (cb, cg) = (p.courant(beta), p.courant(gamma));
    let (nx, ny, nz) = e.dims();
    let mut out = e.clone();
    for z in 1..nz {
        for y in 1..ny {
            for x in 1..nx {
                let (gdx, gdy, gdz) = gamma.offset();
                let (bdx, bdy, bdz) = beta.offset();
                let curl = (hb.at(x, y, z) - hb.at(x - gdx, y - gdy, z - gdz)) * cg
                    - (hg.at(x, y, z) - hg.at(x - bdx, y - bdy, z - bdz)) * cb;
                *out.at_mut(x, y, z) -= p.ce * curl;
            }
        }
    }
    out
}
