//! Step-driven solver.
//!
//! Each [`Solver::step`] call runs one full cycle:
//! 1. Find the unresolved cells with the fewest candidates.
//! 2. Pick one uniformly at random and collapse it by weighted draw.
//! 3. Propagate constraints from it.
//!
//! Contradictions are handled by the configured [`FailurePolicy`]. The
//! caller decides the cadence: a renderer typically calls `step()` once per
//! frame and reads the grid in between.

use crate::adjacency::AdjacencyTable;
use crate::direction::DirectionNames;
use crate::error::{CellError, ConfigError, Contradiction, PropagationError};
use crate::grid::Grid;
use crate::propagation::{Propagator, WorklistOrder};
use crate::rng::{StdRandom, WfcRng};
use crate::snapshot::GridSnapshot;
use crate::tile::{TileId, TileVariant};
use crate::tileset::TilesetDescription;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// What to do when a contradiction is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailurePolicy {
    /// Stop; the solver stays contradicted.
    #[default]
    End,
    /// Reset the grid and keep running.
    Reset,
    /// Reset, then force the failing cell to the choice it had made.
    #[serde(alias = "RESET_FROM_FAIL")]
    ResetFromFailure,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "END" => Ok(FailurePolicy::End),
            "RESET" => Ok(FailurePolicy::Reset),
            "RESET_FROM_FAILURE" | "RESET_FROM_FAIL" => Ok(FailurePolicy::ResetFromFailure),
            _ => Err(ConfigError::InvalidFailurePolicy(s.to_string())),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailurePolicy::End => "END",
            FailurePolicy::Reset => "RESET",
            FailurePolicy::ResetFromFailure => "RESET_FROM_FAILURE",
        };
        f.write_str(name)
    }
}

/// Solver construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub width: usize,
    pub height: usize,
    pub failure_policy: FailurePolicy,
    pub direction_names: DirectionNames,
    /// Fixed seed for reproducible runs; None seeds from the OS.
    pub seed: Option<u64>,
    pub worklist_order: WorklistOrder,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            width: 160,
            height: 90,
            failure_policy: FailurePolicy::End,
            direction_names: DirectionNames::default(),
            seed: None,
            worklist_order: WorklistOrder::Lifo,
        }
    }
}

impl SolverConfig {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_worklist_order(mut self, order: WorklistOrder) -> Self {
        self.worklist_order = order;
        self
    }

    pub fn with_direction_names(mut self, names: DirectionNames) -> Self {
        self.direction_names = names;
        self
    }
}

/// Solver lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    Running,
    /// Every cell resolved
    Solved,
    /// Contradiction reached under the `End` policy
    Contradicted,
}

/// Outcome of one [`Solver::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// A cell was collapsed and propagation succeeded.
    Advanced,
    Solved,
    /// A contradiction occurred during this step. Under a reset policy the
    /// solver is running again afterwards.
    Contradicted,
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolverStats {
    /// `step()` calls that did work.
    pub steps: usize,
    /// Successful cell collapses.
    pub collapses: usize,
    pub contradictions: usize,
    /// Grid resets, by policy or by `reset()`.
    pub resets: usize,
}

/// Where a step failed and what the cell had chosen, if anything.
#[derive(Debug, Clone, Copy)]
struct Failure {
    contradiction: Contradiction,
    index: usize,
    choice: Option<TileId>,
}

/// Wave function collapse solver over a toroidal grid.
///
/// Cloning copies the grid and the generator state, so a clone continues
/// exactly as the original would.
#[derive(Clone)]
pub struct Solver {
    grid: Grid,
    variants: Arc<[TileVariant]>,
    propagator: Propagator,
    policy: FailurePolicy,
    state: SolverState,
    rng: Box<dyn WfcRng>,
    stats: SolverStats,
    last_contradiction: Option<Contradiction>,
}

impl Solver {
    /// Compile the tileset and build a fresh grid.
    ///
    /// Seeds from `config.seed` when set, otherwise from the OS.
    pub fn new(config: SolverConfig, tileset: &TilesetDescription) -> Result<Self, ConfigError> {
        let rng: Box<dyn WfcRng> = match config.seed {
            Some(seed) => Box::new(StdRandom::from_u64_seed(seed)),
            None => Box::new(StdRandom::from_entropy()),
        };
        Self::with_rng(config, tileset, rng)
    }

    /// Like [`Solver::new`] but with a caller-supplied generator.
    pub fn with_rng(
        config: SolverConfig,
        tileset: &TilesetDescription,
        rng: Box<dyn WfcRng>,
    ) -> Result<Self, ConfigError> {
        let variants: Arc<[TileVariant]> = tileset.compile(&config.direction_names)?.into();
        let adjacency = Arc::new(AdjacencyTable::compile(&variants));
        let grid = Grid::new(
            config.width,
            config.height,
            Arc::clone(&variants),
            adjacency,
        )?;
        let propagator = Propagator::new(grid.len(), config.worklist_order);

        info!(
            "Solver ready: {}x{} grid, {} tile variants from {} prototypes, policy {}",
            config.width,
            config.height,
            variants.len(),
            tileset.tile_set.len(),
            config.failure_policy
        );

        Ok(Self {
            grid,
            variants,
            propagator,
            policy: config.failure_policy,
            state: SolverState::Running,
            rng,
            stats: SolverStats::default(),
            last_contradiction: None,
        })
    }

    /// Run one select-collapse-propagate cycle.
    pub fn step(&mut self) -> StepResult {
        match self.state {
            SolverState::Solved => return StepResult::Solved,
            SolverState::Contradicted => return StepResult::Contradicted,
            SolverState::Running => {}
        }
        self.stats.steps += 1;

        let lowest = self.grid.min_entropy_cells();
        if lowest.is_empty() {
            self.state = SolverState::Solved;
            self.grid.finished = true;
            info!(
                "Solved after {} collapses ({} contradictions, {} resets)",
                self.stats.collapses, self.stats.contradictions, self.stats.resets
            );
            return StepResult::Solved;
        }

        let index = lowest[self.rng.next_usize_max(lowest.len())];
        match self.collapse_and_propagate(index, None) {
            Ok(()) => StepResult::Advanced,
            Err(failure) => self.handle_failure(failure),
        }
    }

    /// Step until the solver stops or `max_steps` calls have been made.
    ///
    /// Returns the last step's result.
    pub fn run(&mut self, max_steps: usize) -> StepResult {
        let mut result = self.terminal_result();
        for _ in 0..max_steps {
            result = self.step();
            if self.is_terminal() {
                break;
            }
        }
        result
    }

    fn terminal_result(&self) -> StepResult {
        match self.state {
            SolverState::Solved => StepResult::Solved,
            SolverState::Contradicted => StepResult::Contradicted,
            SolverState::Running => StepResult::Advanced,
        }
    }

    fn collapse_and_propagate(
        &mut self,
        index: usize,
        forced: Option<TileId>,
    ) -> Result<(), Failure> {
        let tile = match self
            .grid
            .cell_mut(index)
            .collapse(&self.variants, forced, self.rng.as_mut())
        {
            Ok(tile) => tile,
            Err(CellError::Contradiction(contradiction)) => {
                return Err(Failure {
                    contradiction,
                    index,
                    choice: None,
                })
            }
            Err(CellError::Invariant(violation)) => panic!("{}", violation),
        };
        self.stats.collapses += 1;

        let cell = self.grid.cell(index);
        debug!(
            "Collapsed ({}, {}) to {}",
            cell.x(),
            cell.y(),
            self.variants[tile.index()]
        );

        match self.propagator.propagate(&mut self.grid, index) {
            Ok(report) => {
                trace!(
                    "Propagation visited {} cells, restricted {}",
                    report.visited,
                    report.restricted
                );
                Ok(())
            }
            Err(PropagationError::Contradiction(contradiction)) => Err(Failure {
                contradiction,
                index,
                choice: Some(tile),
            }),
            Err(PropagationError::Invariant(violation)) => panic!("{}", violation),
        }
    }

    fn handle_failure(&mut self, failure: Failure) -> StepResult {
        self.stats.contradictions += 1;
        self.last_contradiction = Some(failure.contradiction);
        warn!("Found {}, policy {}", failure.contradiction, self.policy);

        match self.policy {
            FailurePolicy::End => {
                self.state = SolverState::Contradicted;
                self.grid.failed = true;
                self.grid.finished = true;
            }
            FailurePolicy::Reset => self.restart(),
            FailurePolicy::ResetFromFailure => {
                self.restart();
                let cell = self.grid.cell(failure.index);
                info!(
                    "Restarting from failed cell ({}, {}) with {:?}",
                    cell.x(),
                    cell.y(),
                    failure.choice
                );
                if let Err(again) = self.collapse_and_propagate(failure.index, failure.choice) {
                    self.stats.contradictions += 1;
                    self.last_contradiction = Some(again.contradiction);
                    warn!(
                        "Forced restart hit {}; resetting without forcing",
                        again.contradiction
                    );
                    self.restart();
                }
            }
        }

        StepResult::Contradicted
    }

    fn restart(&mut self) {
        self.grid.reset();
        self.stats.resets += 1;
    }

    /// Rebuild the grid with every candidate and resume running.
    pub fn reset(&mut self) {
        self.restart();
        self.state = SolverState::Running;
        self.last_contradiction = None;
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn is_solved(&self) -> bool {
        self.state == SolverState::Solved
    }

    pub fn is_failed(&self) -> bool {
        self.state == SolverState::Contradicted
    }

    /// No further `step()` call will make progress.
    pub fn is_terminal(&self) -> bool {
        self.state != SolverState::Running
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Most recent contradiction, cleared by `reset()`.
    pub fn last_contradiction(&self) -> Option<Contradiction> {
        self.last_contradiction
    }

    pub fn variants(&self) -> &[TileVariant] {
        &self.variants
    }

    /// Read-only view of the grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Owned copy of every cell's visible state.
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot::capture(&self.grid)
    }

    /// Read and clear the change flag of one cell.
    pub fn take_changed(&mut self, x: usize, y: usize) -> bool {
        self.grid.take_changed(x, y)
    }

    /// Coordinates of all changed cells, clearing their flags.
    pub fn drain_changed(&mut self) -> Vec<(usize, usize)> {
        self.grid.drain_changed()
    }
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("grid_size", &(self.grid.width(), self.grid.height()))
            .field("variants", &self.variants.len())
            .field("policy", &self.policy)
            .field("worklist_order", &self.propagator.order())
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}
