//! Field components of the Yee scheme and their axis permutations.
//!
//! Every component `Fα` has two orthogonal axes `β = α.next()` and
//! `γ = β.next()`. A magnetic component `Hα` is driven by `{Eβ, Eγ}` and in
//! turn drives the electric components `{Eβ, Eγ}`; electric components are
//! the mirror image. This cyclic permutation is the whole "policy" that
//! distinguishes the six field kernels from one another.

use std::fmt;

/// A Cartesian axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// All three axes in order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// The next axis in the cyclic order x → y → z → x.
    pub fn next(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::Z,
            Self::Z => Self::X,
        }
    }

    /// Unit offset `(dx, dy, dz)` along this axis.
    pub fn offset(self) -> (usize, usize, usize) {
        match self {
            Self::X => (1, 0, 0),
            Self::Y => (0, 1, 0),
            Self::Z => (0, 0, 1),
        }
    }

    /// This axis' extent out of `(nx, ny, nz)`.
    pub fn extent(self, (nx, ny, nz): (usize, usize, usize)) -> usize {
        match self {
            Self::X => nx,
            Self::Y => ny,
            Self::Z => nz,
        }
    }

    fn letter(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Whether a component belongs to the magnetic or the electric field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    /// `H`: updated first in each leapfrog step, pops before it pushes.
    Magnetic,
    /// `E`: pushes its current values before popping, which is what keeps
    /// the cyclic network deadlock-free under bounded queues.
    Electric,
}

impl FieldKind {
    /// The field this one is coupled to.
    pub fn dual(self) -> Self {
        match self {
            Self::Magnetic => Self::Electric,
            Self::Electric => Self::Magnetic,
        }
    }

    fn letter(self) -> char {
        match self {
            Self::Magnetic => 'H',
            Self::Electric => 'E',
        }
    }
}

/// One of the six field components `Hx, Hy, Hz, Ex, Ey, Ez`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Component {
    /// Magnetic or electric.
    pub kind: FieldKind,
    /// The axis the component points along.
    pub axis: Axis,
}

impl Component {
    /// `Hx`.
    pub const HX: Component = Component::new(FieldKind::Magnetic, Axis::X);
    /// `Hy`.
    pub const HY: Component = Component::new(FieldKind::Magnetic, Axis::Y);
    /// `Hz`.
    pub const HZ: Component = Component::new(FieldKind::Magnetic, Axis::Z);
    /// `Ex`.
    pub const EX: Component = Component::new(FieldKind::Electric, Axis::X);
    /// `Ey`.
    pub const EY: Component = Component::new(FieldKind::Electric, Axis::Y);
    /// `Ez`.
    pub const EZ: Component = Component::new(FieldKind::Electric, Axis::Z);

    /// All six components, magnetic first, in output order.
    pub const ALL: [Component; 6] = [
        Self::HX,
        Self::HY,
        Self::HZ,
        Self::EX,
        Self::EY,
        Self::EZ,
    ];

    /// Build a component.
    pub const fn new(kind: FieldKind, axis: Axis) -> Self {
        Self { kind, axis }
    }

    /// The two orthogonal axes `(β, γ)` in cyclic order.
    pub fn orthogonal(self) -> (Axis, Axis) {
        let beta = self.axis.next();
        (beta, beta.next())
    }

    /// The two components this one consumes, `(Sβ, Sγ)`.
    pub fn sources(self) -> [Component; 2] {
        let (beta, gamma) = self.orthogonal();
        let dual = self.kind.dual();
        [Self::new(dual, beta), Self::new(dual, gamma)]
    }

    /// The two components that consume this one.
    ///
    /// The coupling is symmetric, so this is the same set as
    /// [`sources`](Self::sources).
    pub fn dependents(self) -> [Component; 2] {
        self.sources()
    }

    /// Position in [`Component::ALL`].
    pub fn ordinal(self) -> usize {
        let base = match self.kind {
            FieldKind::Magnetic => 0,
            FieldKind::Electric => 3,
        };
        base + match self.axis {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.axis.letter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_cycle_has_period_three() {
        for a in Axis::ALL {
            assert_ne!(a, a.next());
            assert_eq!(a, a.next().next().next());
        }
    }

    #[test]
    fn wiring_matches_yee_coupling() {
        assert_eq!(Component::HX.sources(), [Component::EY, Component::EZ]);
        assert_eq!(Component::HY.sources(), [Component::EZ, Component::EX]);
        assert_eq!(Component::HZ.sources(), [Component::EX, Component::EY]);
        assert_eq!(Component::EX.sources(), [Component::HY, Component::HZ]);
        assert_eq!(Component::EY.sources(), [Component::HZ, Component::HX]);
        assert_eq!(Component::EZ.sources(), [Component::HX, Component::HY]);
    }

    #[test]
    fn coupling_is_symmetric() {
        for c in Component::ALL {
            for s in c.sources() {
                assert!(s.dependents().contains(&c), "{s} should feed back into {c}");
            }
        }
    }

    #[test]
    fn ordinal_matches_all_order() {
        for (i, c) in Component::ALL.iter().enumerate() {
            assert_eq!(c.ordinal(), i);
        }
    }

    #[test]
    fn display_names() {
        let names: Vec<String> = Component::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(names, ["Hx", "Hy", "Hz", "Ex", "Ey", "Ez"]);
    }
}
