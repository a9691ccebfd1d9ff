//! Per-position solver state.
//!
//! A [`Cell`] holds the set of tile variants still possible at one grid
//! position, stored as a [`CandidateSet`] bitset, plus the resolved tile
//! once the cell has been collapsed.

use crate::error::{CellError, Contradiction, InvariantViolation};
use crate::rng::WfcRng;
use crate::tile::{TileId, TileVariant};
use std::fmt;

const WORD_BITS: usize = 64;

/// Fixed-capacity set of tile ids.
///
/// One bit per compiled variant. Iteration is in ascending id order, which
/// keeps weighted draws reproducible for a given RNG seed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateSet {
    words: Vec<u64>,
    capacity: usize,
    len: usize,
}

impl CandidateSet {
    /// Empty set able to hold ids `0..capacity`.
    pub fn empty(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(WORD_BITS)],
            capacity,
            len: 0,
        }
    }

    /// Set containing every id `0..capacity`.
    pub fn full(capacity: usize) -> Self {
        let mut set = Self::empty(capacity);
        for word in set.words.iter_mut() {
            *word = u64::MAX;
        }
        let tail = capacity % WORD_BITS;
        if tail != 0 {
            if let Some(last) = set.words.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
        set.len = capacity;
        set
    }

    pub fn singleton(capacity: usize, tile: TileId) -> Self {
        let mut set = Self::empty(capacity);
        set.insert(tile);
        set
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn contains(&self, tile: TileId) -> bool {
        let i = tile.index();
        i < self.capacity && self.words[i / WORD_BITS] & (1 << (i % WORD_BITS)) != 0
    }

    /// Insert a tile. Returns true if it was not already present.
    pub fn insert(&mut self, tile: TileId) -> bool {
        let i = tile.index();
        debug_assert!(i < self.capacity);
        let mask = 1u64 << (i % WORD_BITS);
        let word = &mut self.words[i / WORD_BITS];
        if *word & mask != 0 {
            return false;
        }
        *word |= mask;
        self.len += 1;
        true
    }

    /// Remove a tile. Returns true if it was present.
    pub fn remove(&mut self, tile: TileId) -> bool {
        let i = tile.index();
        if i >= self.capacity {
            return false;
        }
        let mask = 1u64 << (i % WORD_BITS);
        let word = &mut self.words[i / WORD_BITS];
        if *word & mask == 0 {
            return false;
        }
        *word &= !mask;
        self.len -= 1;
        true
    }

    /// Keep only tiles also present in `other`. Returns true if any were dropped.
    pub fn intersect_with(&mut self, other: &CandidateSet) -> bool {
        debug_assert_eq!(self.capacity, other.capacity);
        let before = self.len;
        let mut len = 0;
        for (word, &o) in self.words.iter_mut().zip(&other.words) {
            *word &= o;
            len += word.count_ones() as usize;
        }
        self.len = len;
        len != before
    }

    /// Add every tile of `other`.
    pub fn union_with(&mut self, other: &CandidateSet) {
        debug_assert_eq!(self.capacity, other.capacity);
        let mut len = 0;
        for (word, &o) in self.words.iter_mut().zip(&other.words) {
            *word |= o;
            len += word.count_ones() as usize;
        }
        self.len = len;
    }

    /// Whether every tile of `self` is in `other`.
    pub fn is_subset(&self, other: &CandidateSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .all(|(&a, &b)| a & !b == 0)
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
        self.len = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = TileId> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let mut bits = word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let bit = bits.trailing_zeros() as usize;
                bits &= bits - 1;
                Some(TileId(w * WORD_BITS + bit))
            })
        })
    }

    /// The only member, if the set has exactly one.
    pub fn single(&self) -> Option<TileId> {
        if self.len == 1 {
            self.iter().next()
        } else {
            None
        }
    }
}

/// Solver state of one grid position.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    x: usize,
    y: usize,
    candidates: CandidateSet,
    resolved: Option<TileId>,
    changed: bool,
}

impl Cell {
    /// New unresolved cell allowing every one of `tile_count` variants.
    pub fn new(x: usize, y: usize, tile_count: usize) -> Self {
        Self {
            x,
            y,
            candidates: CandidateSet::full(tile_count),
            resolved: None,
            changed: true,
        }
    }

    #[inline]
    pub fn x(&self) -> usize {
        self.x
    }

    #[inline]
    pub fn y(&self) -> usize {
        self.y
    }

    /// Current candidates. A singleton once collapsed.
    #[inline]
    pub fn candidates(&self) -> &CandidateSet {
        &self.candidates
    }

    #[inline]
    pub fn resolved(&self) -> Option<TileId> {
        self.resolved
    }

    #[inline]
    pub fn is_collapsed(&self) -> bool {
        self.resolved.is_some()
    }

    /// Unresolved with no candidates left.
    #[inline]
    pub fn is_contradiction(&self) -> bool {
        self.resolved.is_none() && self.candidates.is_empty()
    }

    /// Number of remaining candidates.
    #[inline]
    pub fn entropy(&self) -> usize {
        self.candidates.len()
    }

    /// Resolve the cell to a single tile.
    ///
    /// With `forced`, resolves straight to that tile. Otherwise draws from
    /// the candidates with probability proportional to each variant's weight.
    /// An empty candidate set yields [`CellError::Contradiction`].
    pub fn collapse(
        &mut self,
        variants: &[TileVariant],
        forced: Option<TileId>,
        rng: &mut dyn WfcRng,
    ) -> Result<TileId, CellError> {
        if self.is_collapsed() {
            return Err(InvariantViolation::AlreadyCollapsed {
                x: self.x,
                y: self.y,
            }
            .into());
        }
        self.changed = true;

        let tile = match forced {
            Some(tile) => {
                if tile.index() >= self.candidates.capacity() {
                    return Err(InvariantViolation::UnknownTile {
                        tile,
                        count: self.candidates.capacity(),
                    }
                    .into());
                }
                tile
            }
            None => self.weighted_draw(variants, rng).ok_or(CellError::Contradiction(
                Contradiction {
                    x: self.x,
                    y: self.y,
                },
            ))?,
        };

        self.candidates = CandidateSet::singleton(self.candidates.capacity(), tile);
        self.resolved = Some(tile);
        Ok(tile)
    }

    fn weighted_draw(&self, variants: &[TileVariant], rng: &mut dyn WfcRng) -> Option<TileId> {
        let total: f64 = self.candidates.iter().map(|t| variants[t.index()].weight).sum();
        if self.candidates.is_empty() || total <= 0.0 {
            return None;
        }

        let threshold = rng.next_double() * total;
        let mut partial_sum = 0.0;
        let mut last = None;
        for t in self.candidates.iter() {
            partial_sum += variants[t.index()].weight;
            last = Some(t);
            if partial_sum > threshold {
                return Some(t);
            }
        }
        // Rounding can leave the running sum a hair under the threshold.
        last
    }

    /// Intersect the candidates with `allowed`.
    ///
    /// Returns whether the set shrank.
    pub fn restrict(&mut self, allowed: &CandidateSet) -> Result<bool, InvariantViolation> {
        if self.is_collapsed() {
            return Err(InvariantViolation::RestrictCollapsed {
                x: self.x,
                y: self.y,
            });
        }
        let shrank = self.candidates.intersect_with(allowed);
        if shrank {
            self.changed = true;
        }
        Ok(shrank)
    }

    /// Back to all candidates, unresolved.
    pub fn reset(&mut self) {
        self.candidates = CandidateSet::full(self.candidates.capacity());
        self.resolved = None;
        self.changed = true;
    }

    /// Peek at the change flag without clearing it.
    #[inline]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Read and clear the change flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved {
            Some(tile) => write!(f, "[{}][{}]: {}", self.x, self.y, tile),
            None => write!(
                f,
                "[{}][{}]: {} candidates",
                self.x,
                self.y,
                self.candidates.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::StdRandom;
    use crate::tile::EdgeLabels;
    use std::sync::Arc;

    fn variants(weights: &[f64]) -> Vec<TileVariant> {
        weights
            .iter()
            .enumerate()
            .map(|(i, &w)| TileVariant {
                id: TileId(i),
                prototype: i,
                edges: EdgeLabels::new("0", "0", "0", "0"),
                rotation: 0,
                weight: w,
                handle: Arc::from(format!("{}.png", i)),
            })
            .collect()
    }

    #[test]
    fn test_candidate_set_full_and_iter() {
        let set = CandidateSet::full(70);
        assert_eq!(set.len(), 70);
        assert!(set.contains(TileId(0)));
        assert!(set.contains(TileId(69)));
        assert!(!set.contains(TileId(70)));
        let ids: Vec<usize> = set.iter().map(TileId::index).collect();
        assert_eq!(ids, (0..70).collect::<Vec<_>>());
    }

    #[test]
    fn test_candidate_set_intersect() {
        let mut a = CandidateSet::full(5);
        let mut b = CandidateSet::empty(5);
        b.insert(TileId(1));
        b.insert(TileId(4));
        assert!(a.intersect_with(&b));
        assert_eq!(a.len(), 2);
        assert!(!a.intersect_with(&b));
        assert!(a.is_subset(&b));
    }

    #[test]
    fn test_candidate_set_union_and_remove() {
        let mut a = CandidateSet::singleton(130, TileId(129));
        let b = CandidateSet::singleton(130, TileId(3));
        a.union_with(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![TileId(3), TileId(129)]);
        assert!(a.remove(TileId(3)));
        assert!(!a.remove(TileId(3)));
        assert_eq!(a.single(), Some(TileId(129)));
    }

    #[test]
    fn test_collapse_sets_singleton() {
        let vs = variants(&[1.0, 1.0, 1.0]);
        let mut rng = StdRandom::from_u64_seed(1);
        let mut cell = Cell::new(2, 3, 3);
        cell.take_changed();

        let tile = cell.collapse(&vs, None, &mut rng).unwrap();
        assert!(cell.is_collapsed());
        assert_eq!(cell.resolved(), Some(tile));
        assert_eq!(cell.candidates().single(), Some(tile));
        assert!(cell.take_changed());
    }

    #[test]
    fn test_forced_collapse() {
        let vs = variants(&[1.0, 1.0]);
        let mut rng = StdRandom::from_u64_seed(1);
        let mut cell = Cell::new(0, 0, 2);
        assert_eq!(cell.collapse(&vs, Some(TileId(1)), &mut rng), Ok(TileId(1)));
    }

    #[test]
    fn test_forced_collapse_unknown_tile() {
        let vs = variants(&[1.0]);
        let mut rng = StdRandom::from_u64_seed(1);
        let mut cell = Cell::new(0, 0, 1);
        let err = cell.collapse(&vs, Some(TileId(5)), &mut rng).unwrap_err();
        assert!(matches!(
            err,
            CellError::Invariant(InvariantViolation::UnknownTile { .. })
        ));
        assert!(!cell.is_collapsed());
    }

    #[test]
    fn test_collapse_empty_is_contradiction() {
        let vs = variants(&[1.0, 1.0]);
        let mut rng = StdRandom::from_u64_seed(1);
        let mut cell = Cell::new(4, 5, 2);
        cell.restrict(&CandidateSet::empty(2)).unwrap();
        assert!(cell.is_contradiction());
        assert_eq!(
            cell.collapse(&vs, None, &mut rng),
            Err(CellError::Contradiction(Contradiction { x: 4, y: 5 }))
        );
    }

    #[test]
    fn test_collapse_twice_is_invariant_violation() {
        let vs = variants(&[1.0]);
        let mut rng = StdRandom::from_u64_seed(1);
        let mut cell = Cell::new(0, 0, 1);
        cell.collapse(&vs, None, &mut rng).unwrap();
        assert_eq!(
            cell.collapse(&vs, None, &mut rng),
            Err(CellError::Invariant(InvariantViolation::AlreadyCollapsed {
                x: 0,
                y: 0
            }))
        );
    }

    #[test]
    fn test_restrict_reports_shrink() {
        let mut cell = Cell::new(0, 0, 3);
        cell.take_changed();
        let allowed = CandidateSet::full(3);
        assert_eq!(cell.restrict(&allowed), Ok(false));
        assert!(!cell.is_changed());

        let allowed = CandidateSet::singleton(3, TileId(2));
        assert_eq!(cell.restrict(&allowed), Ok(true));
        assert!(cell.is_changed());
        assert_eq!(cell.entropy(), 1);
        assert!(!cell.is_collapsed());
    }

    #[test]
    fn test_restrict_collapsed_cell_rejected() {
        let vs = variants(&[1.0, 1.0]);
        let mut rng = StdRandom::from_u64_seed(1);
        let mut cell = Cell::new(1, 1, 2);
        cell.collapse(&vs, None, &mut rng).unwrap();
        assert_eq!(
            cell.restrict(&CandidateSet::empty(2)),
            Err(InvariantViolation::RestrictCollapsed { x: 1, y: 1 })
        );
    }

    #[test]
    fn test_take_changed_clears() {
        let mut cell = Cell::new(0, 0, 1);
        assert!(cell.is_changed());
        assert!(cell.take_changed());
        assert!(!cell.take_changed());
        cell.reset();
        assert!(cell.take_changed());
    }

    #[test]
    fn test_weighted_draw_prefers_heavy_tile() {
        let vs = variants(&[1.0, 99.0]);
        let mut rng = StdRandom::from_u64_seed(7);
        let mut heavy = 0;
        for _ in 0..2000 {
            let mut cell = Cell::new(0, 0, 2);
            if cell.collapse(&vs, None, &mut rng).unwrap() == TileId(1) {
                heavy += 1;
            }
        }
        assert!(heavy > 1900, "heavy tile drawn {} / 2000 times", heavy);
    }

    #[test]
    fn test_display() {
        let vs = variants(&[1.0, 1.0]);
        let mut rng = StdRandom::from_u64_seed(1);
        let mut cell = Cell::new(3, 4, 2);
        assert_eq!(cell.to_string(), "[3][4]: 2 candidates");
        cell.collapse(&vs, Some(TileId(1)), &mut rng).unwrap();
        assert_eq!(cell.to_string(), "[3][4]: #1");
    }
}
