//! Values carried by ports.

use std::fmt;

use crate::grid::Grid;

/// The payload granularity a port carries.
///
/// Fixed for the lifetime of a port. The topology builder rejects any edge
/// whose producer and consumer disagree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// One whole [`Grid`] per token.
    Grid,
    /// One `f64` sample per token.
    Scalar,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid => write!(f, "grid"),
            Self::Scalar => write!(f, "scalar"),
        }
    }
}

/// A message travelling along an edge.
///
/// Tokens are moved through queues; a grid inside a token is never shared
/// with the producer.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// A whole grid.
    Grid(Grid),
    /// A single sample.
    Scalar(f64),
}

impl Token {
    /// The payload kind of this token.
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Grid(_) => PayloadKind::Grid,
            Self::Scalar(_) => PayloadKind::Scalar,
        }
    }

    /// Unwrap a grid token, handing the token back if it is not a grid.
    pub fn into_grid(self) -> Result<Grid, Token> {
        match self {
            Self::Grid(g) => Ok(g),
            other => Err(other),
        }
    }

    /// Unwrap a scalar token, handing the token back if it is not a scalar.
    pub fn into_scalar(self) -> Result<f64, Token> {
        match self {
            Self::Scalar(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl From<Grid> for Token {
    fn from(g: Grid) -> Self {
        Self::Grid(g)
    }
}

impl From<f64> for Token {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}
