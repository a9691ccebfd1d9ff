//! Adjacency compilation.
//!
//! For every variant A and direction d, computes the set of variants that
//! may sit next to A in direction d. Built once, after all rotations of all
//! prototypes exist, and never modified afterwards.

use crate::cell::CandidateSet;
use crate::direction::Direction;
use crate::tile::{TileId, TileVariant};
use tracing::info;

/// Immutable `variant x direction -> allowed neighbours` table.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyTable {
    tile_count: usize,
    /// `allowed[tile][direction]`
    allowed: Vec<[CandidateSet; 4]>,
}

impl AdjacencyTable {
    /// Compare every ordered pair of variants in every direction.
    ///
    /// O(V² · 4) label comparisons.
    pub fn compile(variants: &[TileVariant]) -> Self {
        let tile_count = variants.len();
        let mut allowed = Vec::with_capacity(tile_count);

        for a in variants {
            let mut row: [CandidateSet; 4] =
                std::array::from_fn(|_| CandidateSet::empty(tile_count));
            for b in variants {
                for d in Direction::ALL {
                    if a.edges.accepts(d, &b.edges) {
                        row[d.index()].insert(b.id);
                    }
                }
            }
            allowed.push(row);
        }

        let table = Self {
            tile_count,
            allowed,
        };
        info!(
            "Compiled adjacency for {} tile variants ({} allowed pairs)",
            tile_count,
            table.pair_count()
        );
        table
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tile_count
    }

    /// Variants allowed next to `tile` in `direction`.
    #[inline]
    pub fn allowed(&self, tile: TileId, direction: Direction) -> &CandidateSet {
        &self.allowed[tile.index()][direction.index()]
    }

    #[inline]
    pub fn accepts(&self, tile: TileId, direction: Direction, other: TileId) -> bool {
        self.allowed(tile, direction).contains(other)
    }

    /// Union of the allowed neighbours of every tile in `candidates`.
    pub fn allowed_from(&self, candidates: &CandidateSet, direction: Direction) -> CandidateSet {
        let mut out = CandidateSet::empty(self.tile_count);
        for tile in candidates.iter() {
            out.union_with(self.allowed(tile, direction));
        }
        out
    }

    /// Total number of `(tile, direction, neighbour)` entries.
    pub fn pair_count(&self) -> usize {
        self.allowed
            .iter()
            .flat_map(|row| row.iter())
            .map(CandidateSet::len)
            .sum()
    }
}
