//! Worklist constraint propagation.
//!
//! After a cell collapses, each neighbour's candidates are intersected with
//! the union of what the cell's candidates allow in that direction. Any
//! neighbour that shrinks is queued so its own neighbours are re-checked.
//! Candidate sets only ever shrink, so the loop terminates. Intersection is
//! order-independent, so the fixed point does not depend on which queued
//! cell is processed first; only the amount of work does.

use crate::cell::CandidateSet;
use crate::direction::Direction;
use crate::error::{Contradiction, InvariantViolation, PropagationError};
use crate::grid::Grid;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::trace;

/// Order in which queued cells are taken off the worklist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorklistOrder {
    /// Depth-first: most recently queued cell first.
    #[default]
    Lifo,
    /// Breadth-first: oldest queued cell first.
    Fifo,
}

/// Work done by one propagation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Cells taken off the worklist.
    pub visited: usize,
    /// Neighbour restrictions that actually shrank a candidate set.
    pub restricted: usize,
}

/// Reusable propagation state.
///
/// Owns the worklist and its membership flags so repeated passes don't
/// reallocate. A cell is queued at most once at a time.
#[derive(Debug, Clone)]
pub struct Propagator {
    order: WorklistOrder,
    worklist: VecDeque<usize>,
    queued: Vec<bool>,
}

impl Propagator {
    pub fn new(cell_count: usize, order: WorklistOrder) -> Self {
        Self {
            order,
            worklist: VecDeque::with_capacity(cell_count),
            queued: vec![false; cell_count],
        }
    }

    pub fn order(&self) -> WorklistOrder {
        self.order
    }

    fn push(&mut self, index: usize) {
        if !self.queued[index] {
            self.queued[index] = true;
            self.worklist.push_back(index);
        }
    }

    fn pop(&mut self) -> Option<usize> {
        let index = match self.order {
            WorklistOrder::Lifo => self.worklist.pop_back(),
            WorklistOrder::Fifo => self.worklist.pop_front(),
        }?;
        self.queued[index] = false;
        Some(index)
    }

    fn clear(&mut self) {
        for index in self.worklist.drain(..) {
            self.queued[index] = false;
        }
    }

    /// Propagate constraints outward from the just-collapsed cell `origin`.
    ///
    /// Stops at the first neighbour driven to zero candidates, or at a
    /// resolved neighbour whose tile is not allowed (including the cell
    /// itself when the grid is one cell wide or tall), and reports it as a
    /// [`Contradiction`].
    pub fn propagate(
        &mut self,
        grid: &mut Grid,
        origin: usize,
    ) -> Result<PropagationReport, PropagationError> {
        let start = grid.cell(origin);
        if !start.is_collapsed() {
            return Err(InvariantViolation::PropagateFromUnresolved {
                x: start.x(),
                y: start.y(),
            }
            .into());
        }
        if self.queued.len() != grid.len() {
            self.queued = vec![false; grid.len()];
        }

        let mut report = PropagationReport::default();
        self.clear();
        self.push(origin);

        while let Some(current) = self.pop() {
            report.visited += 1;
            // Resolved neighbours are never narrowed, only checked. A
            // mismatch is reported once the other sides have been handled.
            let mut rejected = None;

            for d in Direction::ALL {
                let neighbor = grid.neighbor(current, d);
                let allowed = match self.allowed_around(grid, current, d) {
                    Some(allowed) => allowed,
                    None => continue,
                };

                let cell = grid.cell_mut(neighbor);
                if let Some(tile) = cell.resolved() {
                    if rejected.is_none() && !allowed.contains(tile) {
                        rejected = Some(Contradiction {
                            x: cell.x(),
                            y: cell.y(),
                        });
                    }
                    continue;
                }
                if cell.candidates().is_subset(&allowed) {
                    continue;
                }

                cell.restrict(&allowed)?;
                report.restricted += 1;
                trace!(
                    "Restricted ({}, {}) to {} candidates",
                    cell.x(),
                    cell.y(),
                    cell.entropy()
                );

                if cell.candidates().is_empty() {
                    let contradiction = Contradiction {
                        x: cell.x(),
                        y: cell.y(),
                    };
                    self.clear();
                    return Err(PropagationError::Contradiction(contradiction));
                }
                self.push(neighbor);
            }

            if let Some(contradiction) = rejected {
                trace!("Resolved neighbour ({}, {}) rejected", contradiction.x, contradiction.y);
                self.clear();
                return Err(PropagationError::Contradiction(contradiction));
            }
        }

        Ok(report)
    }

    /// Tiles the candidates of `index` allow in `direction`, or None when the
    /// cell has no candidates to derive them from.
    fn allowed_around(&self, grid: &Grid, index: usize, direction: Direction) -> Option<CandidateSet> {
        let candidates = grid.cell(index).candidates();
        if candidates.is_empty() {
            return None;
        }
        Some(grid.adjacency().allowed_from(candidates, direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::AdjacencyTable;
    use crate::direction::DirectionNames;
    use crate::rng::StdRandom;
    use crate::tile::{TileId, TileVariant};
    use crate::tileset::{TilePrototype, TilesetDescription};
    use std::sync::Arc;

    fn grid_from(protos: Vec<TilePrototype>, width: usize, height: usize) -> Grid {
        let variants: Arc<[TileVariant]> = TilesetDescription::new(protos)
            .compile(&DirectionNames::default())
            .unwrap()
            .into();
        let adjacency = Arc::new(AdjacencyTable::compile(&variants));
        Grid::new(width, height, variants, adjacency).unwrap()
    }

    fn force(grid: &mut Grid, index: usize, tile: usize) {
        let variants: Vec<TileVariant> = grid.variants().to_vec();
        let mut rng = StdRandom::from_u64_seed(0);
        grid.cell_mut(index)
            .collapse(&variants, Some(TileId(tile)), &mut rng)
            .unwrap();
    }

    /// Horizontal stripes: "a" only touches "a" left/right, "b" below "a".
    fn stripes() -> Vec<TilePrototype> {
        vec![
            TilePrototype::new("a", 0, ["x", "s", "y", "s"]),
            TilePrototype::new("b", 0, ["y", "t", "x", "t"]),
        ]
    }

    #[test]
    fn test_propagate_from_unresolved_rejected() {
        let mut grid = grid_from(stripes(), 2, 2);
        let mut prop = Propagator::new(grid.len(), WorklistOrder::Lifo);
        assert_eq!(
            prop.propagate(&mut grid, 0),
            Err(PropagationError::Invariant(
                InvariantViolation::PropagateFromUnresolved { x: 0, y: 0 }
            ))
        );
    }

    #[test]
    fn test_propagation_fills_rows() {
        let mut grid = grid_from(stripes(), 3, 2);
        force(&mut grid, 0, 0);
        let mut prop = Propagator::new(grid.len(), WorklistOrder::Lifo);
        let report = prop.propagate(&mut grid, 0).unwrap();
        assert!(report.restricted > 0);

        for x in 0..3 {
            let top = grid.get(x, 0).unwrap().candidates();
            let bottom = grid.get(x, 1).unwrap().candidates();
            if x > 0 {
                assert_eq!(top.single(), Some(TileId(0)));
            }
            assert_eq!(bottom.single(), Some(TileId(1)));
        }
    }

    #[test]
    fn test_collapsed_neighbors_untouched() {
        let mut grid = grid_from(vec![TilePrototype::new("g", 0, ["g", "g", "g", "g"])], 2, 1);
        force(&mut grid, 1, 0);
        force(&mut grid, 0, 0);
        let mut prop = Propagator::new(grid.len(), WorklistOrder::Lifo);
        assert_eq!(prop.order(), WorklistOrder::Lifo);
        let report = prop.propagate(&mut grid, 0).unwrap();
        assert_eq!(report.restricted, 0);
        assert_eq!(report.visited, 1);
    }

    #[test]
    fn test_rejected_collapsed_neighbor_is_contradiction() {
        // Stripes wrap onto themselves vertically on a single row.
        let mut grid = grid_from(stripes(), 3, 2);
        force(&mut grid, 3, 0);
        force(&mut grid, 0, 0);
        let mut prop = Propagator::new(grid.len(), WorklistOrder::Fifo);
        assert_eq!(
            prop.propagate(&mut grid, 0),
            Err(PropagationError::Contradiction(Contradiction { x: 0, y: 1 }))
        );
        // The unresolved neighbour was still narrowed before reporting.
        assert_eq!(grid.cell(1).candidates().single(), Some(TileId(0)));
        assert!(prop.queued.iter().all(|q| !q));
    }

    #[test]
    fn test_single_cell_checks_itself() {
        let mut grid = grid_from(
            vec![TilePrototype::new("p", 0, ["ab", "ab", "ab", "ab"])],
            1,
            1,
        );
        force(&mut grid, 0, 0);
        let mut prop = Propagator::new(grid.len(), WorklistOrder::Lifo);
        assert_eq!(
            prop.propagate(&mut grid, 0),
            Err(PropagationError::Contradiction(Contradiction { x: 0, y: 0 }))
        );
    }

    #[test]
    fn test_single_row_checks_vertical_wrap() {
        // Joins left and right, but its top cannot meet its own bottom.
        let mut grid = grid_from(vec![TilePrototype::new("h", 0, ["u", "s", "d", "s"])], 3, 1);
        force(&mut grid, 1, 0);
        let mut prop = Propagator::new(grid.len(), WorklistOrder::Lifo);
        assert_eq!(
            prop.propagate(&mut grid, 1),
            Err(PropagationError::Contradiction(Contradiction { x: 1, y: 0 }))
        );

        let mut grid = grid_from(vec![TilePrototype::new("v", 0, ["s", "l", "s", "r"])], 1, 3);
        force(&mut grid, 2, 0);
        assert_eq!(
            prop.propagate(&mut grid, 2),
            Err(PropagationError::Contradiction(Contradiction { x: 0, y: 2 }))
        );
    }

    #[test]
    fn test_contradiction_stops_propagation() {
        // Neither tile accepts anything.
        let mut grid = grid_from(
            vec![
                TilePrototype::new("p", 0, ["ab", "ab", "ab", "ab"]),
                TilePrototype::new("q", 0, ["cd", "cd", "cd", "cd"]),
            ],
            2,
            1,
        );
        force(&mut grid, 0, 0);
        let mut prop = Propagator::new(grid.len(), WorklistOrder::Fifo);
        assert_eq!(
            prop.propagate(&mut grid, 0),
            Err(PropagationError::Contradiction(Contradiction { x: 1, y: 0 }))
        );
        assert!(grid.cell(1).is_contradiction());
        assert!(prop.worklist.is_empty());
        assert!(prop.queued.iter().all(|q| !q));
    }

    #[test]
    fn test_orders_reach_same_fixed_point() {
        let protos = vec![
            TilePrototype::new("corner", 4, ["01", "10", "00", "00"]),
            TilePrototype::new("line", 2, ["00", "10", "00", "01"]),
            TilePrototype::new("blank", 0, ["00", "00", "00", "00"]),
        ];
        let mut lifo_grid = grid_from(protos, 5, 4);
        force(&mut lifo_grid, 7, 0);
        let mut fifo_grid = lifo_grid.clone();

        Propagator::new(20, WorklistOrder::Lifo)
            .propagate(&mut lifo_grid, 7)
            .unwrap();
        Propagator::new(20, WorklistOrder::Fifo)
            .propagate(&mut fifo_grid, 7)
            .unwrap();

        for (a, b) in lifo_grid.cells().iter().zip(fifo_grid.cells()) {
            assert_eq!(a.candidates(), b.candidates());
        }
    }
}
