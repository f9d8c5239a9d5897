//! Dense 3D grid of `f64` samples with strided indexing.
//!
//! A [`Grid`] owns a flat buffer of `nx * ny * nz` samples addressed by
//! `x + y * nx + z * nx * ny`. Dimensions are fixed at construction; the
//! only way to change them is to build a new grid. `Clone` is always a deep
//! copy, which is what lets kernels hand a grid to a port while continuing
//! to update their own copy in place.

use std::fmt;
use std::ops::{Index, IndexMut};

use rand::Rng;

use crate::error::GridError;

/// A 3-dimensional grid of double-precision samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    nx: usize,
    ny: usize,
    nz: usize,
    /// Pre-computed `nx * ny` stride for the z axis.
    plane: usize,
    data: Vec<f64>,
}

impl Grid {
    /// Create a zero-filled grid.
    ///
    /// # Errors
    ///
    /// [`GridError::ZeroDimension`] if any extent is zero, and
    /// [`GridError::TooLarge`] if the element count overflows `usize`.
    pub fn zeros(nx: usize, ny: usize, nz: usize) -> Result<Self, GridError> {
        let len = Self::checked_len(nx, ny, nz)?;
        Ok(Self {
            nx,
            ny,
            nz,
            plane: nx * ny,
            data: vec![0.0; len],
        })
    }

    /// Create a grid filled with samples drawn uniformly from `[0, 1)`.
    ///
    /// The random source is always injected; there is no process-global
    /// generator behind this constructor.
    pub fn random<R: Rng + ?Sized>(
        nx: usize,
        ny: usize,
        nz: usize,
        rng: &mut R,
    ) -> Result<Self, GridError> {
        let mut grid = Self::zeros(nx, ny, nz)?;
        for v in &mut grid.data {
            *v = rng.random::<f64>();
        }
        Ok(grid)
    }

    /// Build a grid from an existing flat buffer.
    ///
    /// # Errors
    ///
    /// [`GridError::LengthMismatch`] if `data.len() != nx * ny * nz`.
    pub fn from_vec(
        (nx, ny, nz): (usize, usize, usize),
        data: Vec<f64>,
    ) -> Result<Self, GridError> {
        let expected = Self::checked_len(nx, ny, nz)?;
        if data.len() != expected {
            return Err(GridError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            nx,
            ny,
            nz,
            plane: nx * ny,
            data,
        })
    }

    fn checked_len(nx: usize, ny: usize, nz: usize) -> Result<usize, GridError> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(GridError::ZeroDimension { dims: (nx, ny, nz) });
        }
        nx.checked_mul(ny)
            .and_then(|p| p.checked_mul(nz))
            .ok_or(GridError::TooLarge { dims: (nx, ny, nz) })
    }

    /// Extent along x.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Extent along y.
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Extent along z.
    pub fn nz(&self) -> usize {
        self.nz
    }

    /// All three extents as `(nx, ny, nz)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`: a constructed grid has at least one sample.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat index of `(x, y, z)`. Does not bounds-check.
    #[inline]
    pub fn index_of(&self, x: usize, y: usize, z: usize) -> usize {
        x + y * self.nx + z * self.plane
    }

    fn in_bounds(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.nx && y < self.ny && z < self.nz
    }

    /// Sample at `(x, y, z)`.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is outside `[0, dim)`.
    #[inline]
    pub fn at(&self, x: usize, y: usize, z: usize) -> f64 {
        assert!(
            self.in_bounds(x, y, z),
            "grid index ({x}, {y}, {z}) out of bounds for {:?}",
            self.dims()
        );
        self.data[self.index_of(x, y, z)]
    }

    /// Mutable reference to the sample at `(x, y, z)`.
    ///
    /// # Panics
    ///
    /// Panics if any coordinate is outside `[0, dim)`.
    #[inline]
    pub fn at_mut(&mut self, x: usize, y: usize, z: usize) -> &mut f64 {
        assert!(
            self.in_bounds(x, y, z),
            "grid index ({x}, {y}, {z}) out of bounds for {:?}",
            self.dims()
        );
        let i = self.index_of(x, y, z);
        &mut self.data[i]
    }

    /// Checked read; `None` if `(x, y, z)` is out of range.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<f64> {
        if self.in_bounds(x, y, z) {
            Some(self.data[self.index_of(x, y, z)])
        } else {
            None
        }
    }

    /// The flat sample buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// The flat sample buffer, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Overwrite every sample with `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Consume the grid and return its flat buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

impl Index<usize> for Grid {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.data[index]
    }
}

impl IndexMut<usize> for Grid {
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.data[index]
    }
}

/// Renders `Grid(nx, ny, nz) = [ v0 v1 … vN ]`.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grid({}, {}, {}) = [ ", self.nx, self.ny, self.nz)?;
        for v in &self.data {
            write!(f, "{v} ")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zeros_has_product_length() {
        let g = Grid::zeros(3, 4, 5).unwrap();
        assert_eq!(g.len(), 60);
        assert_eq!(g.dims(), (3, 4, 5));
        assert!(g.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_dimension_rejected() {
        assert_eq!(
            Grid::zeros(0, 2, 2),
            Err(GridError::ZeroDimension { dims: (0, 2, 2) })
        );
        assert!(Grid::zeros(2, 2, 0).is_err());
    }

    #[test]
    fn overflowing_dimensions_rejected() {
        let result = Grid::zeros(usize::MAX, 2, 1);
        assert!(matches!(result, Err(GridError::TooLarge { .. })));
    }

    #[test]
    fn strided_layout_is_x_fastest() {
        let mut g = Grid::zeros(2, 3, 4).unwrap();
        *g.at_mut(1, 2, 3) = 7.0;
        assert_eq!(g[1 + 2 * 2 + 3 * 6], 7.0);
        assert_eq!(g.index_of(1, 0, 0), 1);
        assert_eq!(g.index_of(0, 1, 0), 2);
        assert_eq!(g.index_of(0, 0, 1), 6);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn at_out_of_range_panics() {
        let g = Grid::zeros(2, 2, 2).unwrap();
        let _ = g.at(2, 0, 0);
    }

    #[test]
    fn get_is_checked() {
        let g = Grid::zeros(2, 2, 2).unwrap();
        assert_eq!(g.get(1, 1, 1), Some(0.0));
        assert_eq!(g.get(0, 2, 0), None);
    }

    #[test]
    fn clone_is_deep() {
        let mut a = Grid::zeros(2, 2, 2).unwrap();
        let b = a.clone();
        *a.at_mut(0, 0, 0) = 1.0;
        assert_eq!(b.at(0, 0, 0), 0.0);
        assert_ne!(a.as_slice().as_ptr(), b.as_slice().as_ptr());
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Grid::from_vec((2, 1, 1), vec![1.0, 2.0]).is_ok());
        assert_eq!(
            Grid::from_vec((2, 2, 1), vec![1.0]),
            Err(GridError::LengthMismatch {
                expected: 4,
                actual: 1
            })
        );
    }

    #[test]
    fn random_is_seed_deterministic() {
        let a = Grid::random(3, 3, 3, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        let b = Grid::random(3, 3, 3, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        let c = Grid::random(3, 3, 3, &mut ChaCha8Rng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.as_slice().iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn display_matches_printer_format() {
        let g = Grid::from_vec((2, 1, 1), vec![0.5, 1.0]).unwrap();
        assert_eq!(g.to_string(), "Grid(2, 1, 1) = [ 0.5 1 ]");
    }

    proptest! {
        #[test]
        fn index_of_is_a_bijection(nx in 1usize..6, ny in 1usize..6, nz in 1usize..6) {
            let g = Grid::zeros(nx, ny, nz).unwrap();
            let mut seen = vec![false; g.len()];
            for z in 0..nz {
                for y in 0..ny {
                    for x in 0..nx {
                        let i = g.index_of(x, y, z);
                        prop_assert!(!seen[i]);
                        seen[i] = true;
                    }
                }
            }
            prop_assert!(seen.into_iter().all(|s| s));
        }
    }
}
