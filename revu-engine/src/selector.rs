//! Candidate selection.
//!
//! Picks reviewers from an eligible pool uniformly at random without
//! replacement. Callers treat the result as unordered.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use revu_core::{AllocationConfig, User};
use std::fmt;
use std::sync::{Arc, Mutex};

/// Chooses up to `k` users from a pool.
pub trait CandidateSelector: Send + Sync + fmt::Debug {
    /// Return `min(k, pool.len())` distinct members of `pool`.
    fn select(&self, pool: Vec<User>, k: usize) -> Vec<User>;
}

/// Selector backed by fresh thread-local randomness on every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl CandidateSelector for RandomSelector {
    fn select(&self, pool: Vec<User>, k: usize) -> Vec<User> {
        pick(&mut rand::rng(), pool, k)
    }
}

/// Deterministic selector for tests and reproducible runs.
pub struct SeededSelector {
    rng: Mutex<StdRng>,
}

impl SeededSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl fmt::Debug for SeededSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededSelector").finish_non_exhaustive()
    }
}

impl CandidateSelector for SeededSelector {
    fn select(&self, pool: Vec<User>, k: usize) -> Vec<User> {
        // A panic mid-draw leaves the generator usable.
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        pick(&mut *rng, pool, k)
    }
}

/// Build the selector described by `config`.
pub fn selector_from_config(config: &AllocationConfig) -> Arc<dyn CandidateSelector> {
    match config.selector_seed {
        Some(seed) => Arc::new(SeededSelector::new(seed)),
        None => Arc::new(RandomSelector),
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: Vec<User>, k: usize) -> Vec<User> {
    let amount = k.min(pool.len());
    if amount == 0 {
        return Vec::new();
    }
    let chosen = index::sample(rng, pool.len(), amount);
    let mut slots: Vec<Option<User>> = pool.into_iter().map(Some).collect();
    chosen
        .into_iter()
        .filter_map(|i| slots.get_mut(i).and_then(Option::take))
        .collect()
}
