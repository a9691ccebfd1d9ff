//! Error types for the tile solver.
//!
//! Three kinds of failure exist:
//! - [`ConfigError`]: the tileset or solver configuration is malformed.
//!   Raised at construction, never during a run.
//! - [`Contradiction`]: a cell ran out of candidates. Expected, handled by
//!   the failure policy.
//! - [`InvariantViolation`]: a caller broke the cell/propagation protocol.
//!   Indicates a bug.

use crate::tile::TileId;
use std::fmt;

/// Error type for tileset and solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The tileset lists no tiles
    EmptyTileset,
    /// A tile is missing an edge label for a configured direction
    MissingSide { tile: String, direction: String },
    /// A tile names a side that is not one of the configured directions
    UnknownSide { tile: String, name: String },
    /// Weight must be finite and strictly positive
    InvalidWeight { tile: String, weight: f64 },
    /// Rotation count must be 0, 1, 2 or 4
    UnsupportedRotations { tile: String, rotations: u32 },
    /// Grid must have at least one cell
    EmptyGrid { width: usize, height: usize },
    /// The same name was configured for two directions
    DuplicateDirection(String),
    /// Direction name list must have exactly four entries
    DirectionCount(usize),
    /// Unrecognised failure policy name
    InvalidFailurePolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyTileset => write!(f, "tileset contains no tiles"),
            ConfigError::MissingSide { tile, direction } => {
                write!(f, "tile '{}' has no edge label for side '{}'", tile, direction)
            }
            ConfigError::UnknownSide { tile, name } => {
                write!(f, "tile '{}' names unknown side '{}'", tile, name)
            }
            ConfigError::InvalidWeight { tile, weight } => {
                write!(f, "tile '{}' has invalid weight {} (must be > 0)", tile, weight)
            }
            ConfigError::UnsupportedRotations { tile, rotations } => write!(
                f,
                "tile '{}' has unsupported rotation count {} (expected 0, 1, 2 or 4)",
                tile, rotations
            ),
            ConfigError::EmptyGrid { width, height } => {
                write!(f, "grid {}x{} has no cells", width, height)
            }
            ConfigError::DuplicateDirection(name) => {
                write!(f, "direction name '{}' configured twice", name)
            }
            ConfigError::DirectionCount(n) => {
                write!(f, "expected 4 direction names, got {}", n)
            }
            ConfigError::InvalidFailurePolicy(name) => write!(
                f,
                "unknown failure policy '{}' (expected END, RESET or RESET_FROM_FAILURE)",
                name
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A cell at `(x, y)` has no remaining candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Contradiction {
    pub x: usize,
    pub y: usize,
}

impl fmt::Display for Contradiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contradiction at cell ({}, {})", self.x, self.y)
    }
}

impl std::error::Error for Contradiction {}

/// Protocol violations between the solver and its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// `collapse` called on a cell that is already resolved
    AlreadyCollapsed { x: usize, y: usize },
    /// `restrict` called on a resolved cell
    RestrictCollapsed { x: usize, y: usize },
    /// Propagation started from a cell that is not resolved
    PropagateFromUnresolved { x: usize, y: usize },
    /// A forced collapse named a tile outside the compiled set
    UnknownTile { tile: TileId, count: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::AlreadyCollapsed { x, y } => {
                write!(f, "cell ({}, {}) is already collapsed", x, y)
            }
            InvariantViolation::RestrictCollapsed { x, y } => {
                write!(f, "cannot restrict collapsed cell ({}, {})", x, y)
            }
            InvariantViolation::PropagateFromUnresolved { x, y } => {
                write!(f, "cannot propagate from unresolved cell ({}, {})", x, y)
            }
            InvariantViolation::UnknownTile { tile, count } => {
                write!(f, "tile {} out of range ({} tiles compiled)", tile, count)
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Failure of [`Cell::collapse`](crate::cell::Cell::collapse).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellError {
    Contradiction(Contradiction),
    Invariant(InvariantViolation),
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::Contradiction(c) => c.fmt(f),
            CellError::Invariant(v) => v.fmt(f),
        }
    }
}

impl std::error::Error for CellError {}

impl From<InvariantViolation> for CellError {
    fn from(v: InvariantViolation) -> Self {
        CellError::Invariant(v)
    }
}

/// Failure of [`Propagator::propagate`](crate::propagation::Propagator::propagate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationError {
    Contradiction(Contradiction),
    Invariant(InvariantViolation),
}

impl fmt::Display for PropagationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropagationError::Contradiction(c) => c.fmt(f),
            PropagationError::Invariant(v) => v.fmt(f),
        }
    }
}

impl std::error::Error for PropagationError {}

impl From<InvariantViolation> for PropagationError {
    fn from(v: InvariantViolation) -> Self {
        PropagationError::Invariant(v)
    }
}
