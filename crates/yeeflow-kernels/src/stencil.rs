//! In-place Yee update stencils.
//!
//! For a component `Fα` with orthogonal axes `β = α+1`, `γ = α+2`:
//!
//! ```text
//! Hα[p] += ch * ((Eβ[p+eγ] - Eβ[p]) * cγ - (Eγ[p+eβ] - Eγ[p]) * cβ)   p ∈ [0, dim-1)³
//! Eα[p] -= ce * ((Hβ[p] - Hβ[p-eγ]) * cγ - (Hγ[p] - Hγ[p-eβ]) * cβ)   p ∈ [1, dim)³
//! ```
//!
//! The magnetic stencil never writes the last plane along any axis and the
//! electric stencil never writes the first; those samples keep their seed
//! values for the whole run.

use yeeflow_core::{Axis, Component, Grid, KernelError, PhysParams};

/// Flat-index distance between neighbours along `axis`.
fn stride(g: &Grid, axis: Axis) -> usize {
    match axis {
        Axis::X => 1,
        Axis::Y => g.nx(),
        Axis::Z => g.nx() * g.ny(),
    }
}

fn check_dims(target: &Grid, sources: [&Grid; 2], c: Component) -> Result<(), KernelError> {
    for (src, name) in sources.iter().zip(c.sources()) {
        if src.dims() != target.dims() {
            return Err(KernelError::Contract {
                reason: format!(
                    "{name} grid is {:?} but {c} is {:?}",
                    src.dims(),
                    target.dims()
                ),
            });
        }
    }
    Ok(())
}

/// Apply one magnetic update to `h`, the grid of component `c`.
///
/// `sources` are `[Eβ, Eγ]`, in the order of [`Component::sources`].
///
/// # Errors
///
/// [`KernelError::Contract`] if a source's dimensions differ from `h`'s.
pub fn apply_magnetic(
    c: Component,
    h: &mut Grid,
    sources: [&Grid; 2],
    p: &PhysParams,
) -> Result<(), KernelError> {
    check_dims(h, sources, c)?;
    let (beta, gamma) = c.orthogonal();
    let (sb, sg) = (stride(h, beta), stride(h, gamma));
    let (cb, cg) = (p.courant(beta), p.courant(gamma));
    let [eb, eg] = sources.map(Grid::as_slice);
    let (nx, ny, nz) = h.dims();
    let ch = p.ch;
    for z in 0..nz - 1 {
        for y in 0..ny - 1 {
            let row = h.index_of(0, y, z);
            for i in row..row + nx - 1 {
                let curl = (eb[i + sg] - eb[i]) * cg - (eg[i + sb] - eg[i]) * cb;
                h[i] += ch * curl;
            }
        }
    }
    Ok(())
}

/// Apply one electric update to `e`, the grid of component `c`.
///
/// `sources` are `[Hβ, Hγ]`, in the order of [`Component::sources`].
///
/// # Errors
///
/// [`KernelError::Contract`] if a source's dimensions differ from `e`'s.
pub fn apply_electric(
    c: Component,
    e: &mut Grid,
    sources: [&Grid; 2],
    p: &PhysParams,
) -> Result<(), KernelError> {
    check_dims(e, sources, c)?;
    let (beta, gamma) = c.orthogonal();
    let (sb, sg) = (stride(e, beta), stride(e, gamma));
    let (cb, cg) = (p.courant(beta), p.courant(gamma));
    let [hb, hg] = sources.map(Grid::as_slice);
    let (nx, ny, nz) = e.dims();
    let ce = p.ce;
    for z in 1..nz {
        for y in 1..ny {
            let row = e.index_of(0, y, z);
            for i in row + 1..row + nx {
                let curl = (hb[i] - hb[i - sg]) * cg - (hg[i] - hg[i - sb]) * cb;
                e[i] -= ce * curl;
            }
        }
    }
    Ok(())
}
