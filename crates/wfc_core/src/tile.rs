//! Tile variants and rotation derivation.
//!
//! A tile prototype describes its four edges with string labels. Each
//! prototype expands into 1, 2 or 4 oriented [`TileVariant`]s by rotating
//! those labels a quarter turn at a time. Every variant gets its own
//! [`TileId`]; rotated variants are never aliases of their source.

use crate::direction::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Index of a compiled tile variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub usize);

impl TileId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Edge labels of one tile orientation, indexed by [`Direction`].
///
/// Labels read left-to-right along the top and bottom edges and
/// top-to-bottom along the side edges, so two glued edges match when one
/// label is the reverse of the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeLabels {
    edges: [String; 4],
}

impl EdgeLabels {
    pub fn new(
        up: impl Into<String>,
        right: impl Into<String>,
        down: impl Into<String>,
        left: impl Into<String>,
    ) -> Self {
        Self {
            edges: [up.into(), right.into(), down.into(), left.into()],
        }
    }

    #[inline]
    pub fn get(&self, direction: Direction) -> &str {
        &self.edges[direction.index()]
    }

    /// Labels after `quarter_turns` clockwise quarter turns.
    ///
    /// One turn moves each label to the next side clockwise:
    /// `up <- left`, `right <- up`, `down <- right`, `left <- down`.
    pub fn rotated(&self, quarter_turns: usize) -> EdgeLabels {
        let turns = quarter_turns % 4;
        let mut edges = self.edges.clone();
        for d in Direction::ALL {
            let mut target = d;
            for _ in 0..turns {
                target = target.clockwise();
            }
            edges[target.index()] = self.edges[d.index()].clone();
        }
        EdgeLabels { edges }
    }

    /// Whether `other` may sit next to `self` in `direction`.
    ///
    /// The shared boundary is walked in opposite directions by the two
    /// tiles, so `other`'s facing edge must equal the reverse of ours.
    pub fn accepts(&self, direction: Direction, other: &EdgeLabels) -> bool {
        let ours = self.get(direction);
        let theirs = other.get(direction.opposite());
        ours.chars().rev().eq(theirs.chars())
    }
}

impl fmt::Display for EdgeLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.edges.join(","))
    }
}

/// One concrete, oriented tile. Immutable once compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct TileVariant {
    pub id: TileId,
    /// Index of the prototype this variant was derived from.
    pub prototype: usize,
    pub edges: EdgeLabels,
    /// Quarter turns applied to the prototype, used for display only.
    pub rotation: u8,
    pub weight: f64,
    /// Opaque rendering reference (an image path in practice).
    pub handle: Arc<str>,
}

impl TileVariant {
    #[inline]
    pub fn edge(&self, direction: Direction) -> &str {
        self.edges.get(direction)
    }
}

impl fmt::Display for TileVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tile({}_{}_{})", self.handle, self.rotation, self.edges)
    }
}
