//! Toroidal grid of cells.
//!
//! Cells are stored row-major (`index = y * width + x`). The grid wraps in
//! both axes: the neighbour above row 0 is the last row, and so on, so every
//! cell has exactly four neighbours.

use crate::adjacency::AdjacencyTable;
use crate::cell::Cell;
use crate::direction::Direction;
use crate::error::ConfigError;
use crate::tile::TileVariant;
use std::fmt;
use std::sync::Arc;

/// Width × height cells plus the compiled tile universe.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    variants: Arc<[TileVariant]>,
    adjacency: Arc<AdjacencyTable>,
    /// No further progress will be made (solved or failed).
    pub finished: bool,
    /// A contradiction ended the run.
    pub failed: bool,
}

impl Grid {
    pub fn new(
        width: usize,
        height: usize,
        variants: Arc<[TileVariant]>,
        adjacency: Arc<AdjacencyTable>,
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid { width, height });
        }
        debug_assert_eq!(variants.len(), adjacency.tile_count());

        let tile_count = variants.len();
        let cells = (0..width * height)
            .map(|i| Cell::new(i % width, i / width, tile_count))
            .collect();

        Ok(Self {
            width,
            height,
            cells,
            variants,
            adjacency,
            finished: false,
            failed: false,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn variants(&self) -> &[TileVariant] {
        &self.variants
    }

    pub fn adjacency(&self) -> &AdjacencyTable {
        &self.adjacency
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Cell at `(x, y)`, or None out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells.get(self.index(x, y))
        } else {
            None
        }
    }

    #[inline]
    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    #[inline]
    pub fn cell_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Index of the neighbour of `index` in `direction`, wrapping around.
    pub fn neighbor(&self, index: usize, direction: Direction) -> usize {
        let x = index % self.width;
        let y = index / self.width;
        let (dx, dy) = direction.offset();
        let nx = (x as isize + dx).rem_euclid(self.width as isize) as usize;
        let ny = (y as isize + dy).rem_euclid(self.height as isize) as usize;
        self.index(nx, ny)
    }

    /// Every cell resolved.
    pub fn is_fully_collapsed(&self) -> bool {
        self.cells.iter().all(Cell::is_collapsed)
    }

    /// Any unresolved cell with no candidates.
    pub fn has_contradiction(&self) -> bool {
        self.cells.iter().any(Cell::is_contradiction)
    }

    /// Unresolved cells sharing the smallest candidate count.
    ///
    /// A cell with zero candidates competes like any other; an empty result
    /// means every cell is resolved.
    pub fn min_entropy_cells(&self) -> Vec<usize> {
        let mut min_entropy = usize::MAX;
        let mut argmin = Vec::new();
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.is_collapsed() {
                continue;
            }
            let entropy = cell.entropy();
            if entropy < min_entropy {
                min_entropy = entropy;
                argmin.clear();
                argmin.push(i);
            } else if entropy == min_entropy {
                argmin.push(i);
            }
        }
        argmin
    }

    /// Restore every cell to the full candidate set and clear the flags.
    ///
    /// The compiled tiles and adjacency are kept.
    pub fn reset(&mut self) {
        for cell in &mut self.cells {
            cell.reset();
        }
        self.finished = false;
        self.failed = false;
    }

    /// Read and clear the change flag of the cell at `(x, y)`.
    pub fn take_changed(&mut self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let i = self.index(x, y);
        self.cells[i].take_changed()
    }

    /// Coordinates of every changed cell, clearing their flags.
    pub fn drain_changed(&mut self) -> Vec<(usize, usize)> {
        self.cells
            .iter_mut()
            .filter_map(|cell| cell.take_changed().then(|| (cell.x(), cell.y())))
            .collect()
    }
}

impl fmt::Display for Grid {
    /// One row per line: resolved tile id, `.` for unresolved, `!` for a
    /// contradicted cell.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width) {
            let line: Vec<String> = row
                .iter()
                .map(|cell| match cell.resolved() {
                    Some(tile) => tile.index().to_string(),
                    None if cell.is_contradiction() => "!".to_string(),
                    None => ".".to_string(),
                })
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::DirectionNames;
    use crate::error::CellError;
    use crate::rng::StdRandom;
    use crate::tile::TileId;
    use crate::tileset::{TilePrototype, TilesetDescription};

    fn grid(width: usize, height: usize) -> Grid {
        let variants: Arc<[TileVariant]> = TilesetDescription::new(vec![
            TilePrototype::new("a", 0, ["0", "0", "0", "0"]),
            TilePrototype::new("b", 0, ["0", "0", "0", "0"]),
        ])
        .compile(&DirectionNames::default())
        .unwrap()
        .into();
        let adjacency = Arc::new(AdjacencyTable::compile(&variants));
        Grid::new(width, height, variants, adjacency).unwrap()
    }

    #[test]
    fn test_new_grid_all_candidates() {
        let g = grid(3, 2);
        assert_eq!(g.len(), 6);
        for cell in g.cells() {
            assert_eq!(cell.entropy(), 2);
            assert!(!cell.is_collapsed());
        }
        assert_eq!(g.get(2, 1).map(|c| (c.x(), c.y())), Some((2, 1)));
        assert!(g.get(3, 0).is_none());
    }

    #[test]
    fn test_empty_grid_rejected() {
        let g = grid(1, 1);
        let err = Grid::new(0, 4, g.variants.clone(), g.adjacency.clone()).unwrap_err();
        assert_eq!(err, ConfigError::EmptyGrid { width: 0, height: 4 });
    }

    #[test]
    fn test_neighbors_wrap() {
        let g = grid(3, 2);
        let origin = g.index(0, 0);
        assert_eq!(g.neighbor(origin, Direction::Left), g.index(2, 0));
        assert_eq!(g.neighbor(origin, Direction::Up), g.index(0, 1));
        assert_eq!(g.neighbor(origin, Direction::Right), g.index(1, 0));
        assert_eq!(g.neighbor(origin, Direction::Down), g.index(0, 1));

        let corner = g.index(2, 1);
        assert_eq!(g.neighbor(corner, Direction::Right), g.index(0, 1));
        assert_eq!(g.neighbor(corner, Direction::Down), g.index(2, 0));
    }

    #[test]
    fn test_single_cell_is_its_own_neighbor() {
        let g = grid(1, 1);
        for d in Direction::ALL {
            assert_eq!(g.neighbor(0, d), 0);
        }
    }

    #[test]
    fn test_min_entropy_cells_includes_ties_and_empties() {
        let mut g = grid(2, 2);
        assert_eq!(g.min_entropy_cells(), vec![0, 1, 2, 3]);

        let only_a = crate::cell::CandidateSet::singleton(2, TileId(0));
        g.cell_mut(2).restrict(&only_a).unwrap();
        assert_eq!(g.min_entropy_cells(), vec![2]);

        g.cell_mut(3)
            .restrict(&crate::cell::CandidateSet::empty(2))
            .unwrap();
        assert_eq!(g.min_entropy_cells(), vec![3]);
        assert!(g.has_contradiction());
    }

    #[test]
    fn test_reset_restores_everything() {
        let mut g = grid(2, 1);
        let mut rng = StdRandom::from_u64_seed(3);
        let variants = g.variants.clone();
        g.cell_mut(0).collapse(&variants, None, &mut rng).unwrap();
        g.finished = true;
        g.failed = true;
        g.drain_changed();

        g.reset();
        assert!(!g.finished && !g.failed);
        for cell in g.cells() {
            assert!(!cell.is_collapsed());
            assert_eq!(cell.entropy(), 2);
        }
        assert_eq!(g.drain_changed(), vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn test_take_changed_is_get_and_clear() {
        let mut g = grid(2, 2);
        assert!(g.take_changed(1, 1));
        assert!(!g.take_changed(1, 1));
        assert!(!g.take_changed(5, 5));
        assert_eq!(g.drain_changed().len(), 3);
        assert!(g.drain_changed().is_empty());
    }

    #[test]
    fn test_display_marks_states() {
        let mut g = grid(2, 1);
        let mut rng = StdRandom::from_u64_seed(3);
        let variants = g.variants.clone();
        g.cell_mut(0)
            .collapse(&variants, Some(TileId(1)), &mut rng)
            .unwrap();
        g.cell_mut(1)
            .restrict(&crate::cell::CandidateSet::empty(2))
            .unwrap();
        assert_eq!(g.to_string(), "1 !\n");
        assert!(matches!(
            g.cell_mut(1).collapse(&variants, None, &mut rng),
            Err(CellError::Contradiction(_))
        ));
    }
}
