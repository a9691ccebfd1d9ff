//! Read-only grid snapshots for renderers.
//!
//! A [`GridSnapshot`] is an owned deep copy of every cell's visible state:
//! the resolved tile, or the list of tiles still possible for blending a
//! preview. Renderers keep it across frames while the solver keeps mutating
//! its own grid.

use crate::grid::Grid;
use crate::tile::TileVariant;
use serde::Serialize;
use std::sync::Arc;

/// What a renderer needs to draw one tile: its handle and orientation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TileFace {
    pub handle: Arc<str>,
    /// Clockwise quarter turns.
    pub rotation: u8,
}

impl From<&TileVariant> for TileFace {
    fn from(variant: &TileVariant) -> Self {
        Self {
            handle: Arc::clone(&variant.handle),
            rotation: variant.rotation,
        }
    }
}

/// Visible state of one cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "tiles", rename_all = "snake_case")]
pub enum CellSnapshot {
    Resolved(TileFace),
    /// Remaining candidates, in tile id order. Empty for a contradiction.
    Superposed(Vec<TileFace>),
}

impl CellSnapshot {
    pub fn is_resolved(&self) -> bool {
        matches!(self, CellSnapshot::Resolved(_))
    }

    /// Number of tiles this cell could still show.
    pub fn option_count(&self) -> usize {
        match self {
            CellSnapshot::Resolved(_) => 1,
            CellSnapshot::Superposed(faces) => faces.len(),
        }
    }
}

/// Owned copy of a grid's visible state, row-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSnapshot {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<CellSnapshot>,
}

impl GridSnapshot {
    /// Copy the visible state of every cell. Change flags are left alone.
    pub fn capture(grid: &Grid) -> Self {
        let variants = grid.variants();
        let cells = grid
            .cells()
            .iter()
            .map(|cell| match cell.resolved() {
                Some(tile) => CellSnapshot::Resolved(TileFace::from(&variants[tile.index()])),
                None => CellSnapshot::Superposed(
                    cell.candidates()
                        .iter()
                        .map(|t| TileFace::from(&variants[t.index()]))
                        .collect(),
                ),
            })
            .collect();

        Self {
            width: grid.width(),
            height: grid.height(),
            cells,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&CellSnapshot> {
        if x < self.width && y < self.height {
            self.cells.get(y * self.width + x)
        } else {
            None
        }
    }

    pub fn resolved_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_resolved()).count()
    }
}
