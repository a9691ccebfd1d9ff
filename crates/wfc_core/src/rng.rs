//! Random number generator abstraction for the solver.
//!
//! The solver draws randomness through the object-safe [`WfcRng`] trait so
//! callers can plug in their own generator (a fixed sequence in tests, a
//! platform RNG elsewhere). [`StdRandom`] wraps `rand::rngs::StdRng` and is
//! the default.
//!
//! # Example
//!
//! ```
//! use wfc_core::rng::{StdRandom, WfcRng};
//!
//! let mut rng = StdRandom::from_u64_seed(42);
//! let index = rng.next_usize_max(10); // 0..10
//! let unit = rng.next_double(); // 0.0..1.0
//! assert!(index < 10 && (0.0..1.0).contains(&unit));
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of randomness for collapse draws and tie-breaking.
pub trait WfcRng: WfcRngClone {
    /// Returns a random double in [0.0, 1.0).
    fn next_double(&mut self) -> f64;

    /// Returns a random usize in [0, max). Returns 0 when `max` is 0.
    fn next_usize_max(&mut self, max: usize) -> usize;
}

/// Lets a `Box<dyn WfcRng>` be cloned, which is what makes
/// [`Solver`](crate::solver::Solver) `Clone`.
pub trait WfcRngClone {
    fn clone_box(&self) -> Box<dyn WfcRng>;
}

impl<T: WfcRng + Clone + 'static> WfcRngClone for T {
    fn clone_box(&self) -> Box<dyn WfcRng> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn WfcRng> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Standard Rust RNG wrapper using `rand::rngs::StdRng`.
#[derive(Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_u64_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl WfcRng for StdRandom {
    fn next_double(&mut self) -> f64 {
        self.rng.gen()
    }

    fn next_usize_max(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        self.rng.gen_range(0..max)
    }
}

/// Replays a fixed list of unit values, cycling. Each `next_usize_max`
/// consumes one value and scales it into range.
///
/// Handy for tests that need to steer a draw.
#[derive(Clone, Debug)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    pos: usize,
}

impl ScriptedRandom {
    /// Panics if `values` is empty.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "ScriptedRandom needs at least one value");
        Self { values, pos: 0 }
    }

    fn next_value(&mut self) -> f64 {
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v
    }
}

impl WfcRng for ScriptedRandom {
    fn next_double(&mut self) -> f64 {
        self.next_value()
    }

    fn next_usize_max(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        ((self.next_value() * max as f64) as usize).min(max - 1)
    }
}
