//! Tile-based Wave Function Collapse on a toroidal grid.
//!
//! This crate provides:
//! - Tileset descriptions loaded from JSON, expanded by rotation
//! - Edge-label adjacency compilation
//! - Cells with bitset candidate sets and weighted collapse
//! - Worklist constraint propagation
//! - A step-driven solver with configurable failure handling
//! - Owned grid snapshots for renderers
//!
//! # Example
//!
//! ```
//! use wfc_core::{Solver, SolverConfig, StepResult, TilePrototype, TilesetDescription};
//!
//! let tileset = TilesetDescription::new(vec![
//!     TilePrototype::new("grass.png", 0, ["g", "g", "g", "g"]),
//! ]);
//! let mut solver = Solver::new(SolverConfig::new(3, 3).with_seed(1), &tileset).unwrap();
//! assert_eq!(solver.run(100), StepResult::Solved);
//! ```

pub mod adjacency;
pub mod cell;
pub mod direction;
pub mod error;
pub mod grid;
pub mod propagation;
pub mod rng;
pub mod snapshot;
pub mod solver;
pub mod tile;
pub mod tileset;

pub use adjacency::AdjacencyTable;
pub use cell::{CandidateSet, Cell};
pub use direction::{Direction, DirectionNames, DX, DY};
pub use error::{
    CellError, ConfigError, Contradiction, InvariantViolation, PropagationError,
};
pub use grid::Grid;
pub use propagation::{PropagationReport, Propagator, WorklistOrder};
pub use rng::{ScriptedRandom, StdRandom, WfcRng};
pub use snapshot::{CellSnapshot, GridSnapshot, TileFace};
pub use solver::{FailurePolicy, Solver, SolverConfig, SolverState, SolverStats, StepResult};
pub use tile::{EdgeLabels, TileId, TileVariant};
pub use tileset::{TilePrototype, TilesetDescription};
