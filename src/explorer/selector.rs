//! Path selection policies.
//!
//! A [`PathSelector`] scores every state the scheduler re-queues; the state
//! with the highest score is stepped next. Selectors only change the order in
//! which paths are explored, never which paths are reported.

use rand::{rngs::StdRng, Rng, SeedableRng};
use strum::{Display, EnumIter, EnumString};

use crate::engine::ExecutionState;

/// Scores pending states for the scheduler.
pub trait PathSelector {
    /// Returns the priority of `state`; higher values are explored first.
    fn priority(&mut self, state: &ExecutionState) -> i64;
}

/// Depth-first order: the most recently queued state runs next.
#[derive(Debug, Default)]
pub struct DfsSelector {
    counter: i64,
}

impl PathSelector for DfsSelector {
    fn priority(&mut self, _state: &ExecutionState) -> i64 {
        self.counter += 1;
        self.counter
    }
}

/// Breadth-first order: the least recently queued state runs next.
#[derive(Debug, Default)]
pub struct BfsSelector {
    counter: i64,
}

impl PathSelector for BfsSelector {
    fn priority(&mut self, _state: &ExecutionState) -> i64 {
        self.counter -= 1;
        self.counter
    }
}

/// Uniformly random order, reproducible for a given seed.
#[derive(Debug)]
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    /// Creates a selector drawing from a generator seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        RandomSelector {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PathSelector for RandomSelector {
    fn priority(&mut self, _state: &ExecutionState) -> i64 {
        self.rng.gen()
    }
}

/// Prefers states that took more branch decisions, perturbed by a bounded
/// random jitter.
///
/// The score is `decisions * scale + jitter` with `jitter` drawn uniformly
/// from `0..=max_jitter`. With `max_jitter < scale` this is a depth-first
/// search that breaks ties randomly; larger jitters let shallower states
/// overtake deeper ones, approximating a non-uniform random search. The
/// formula is a tuning heuristic and may be replaced freely.
#[derive(Debug)]
pub struct DepthJitterSelector {
    rng: StdRng,
    scale: i64,
    max_jitter: i64,
}

impl DepthJitterSelector {
    /// Default weight of one branch decision.
    pub const DEFAULT_SCALE: i64 = 16;

    /// Default jitter bound.
    pub const DEFAULT_JITTER: i64 = 24;

    /// Creates a selector with the default scale and jitter.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_weights(seed, Self::DEFAULT_SCALE, Self::DEFAULT_JITTER)
    }

    /// Creates a selector with explicit weights.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed of the jitter generator
    /// * `scale` - Score of one branch decision
    /// * `max_jitter` - Inclusive upper bound of the jitter, clamped to `0..`
    #[must_use]
    pub fn with_weights(seed: u64, scale: i64, max_jitter: i64) -> Self {
        DepthJitterSelector {
            rng: StdRng::seed_from_u64(seed),
            scale,
            max_jitter: max_jitter.max(0),
        }
    }
}

impl PathSelector for DepthJitterSelector {
    fn priority(&mut self, state: &ExecutionState) -> i64 {
        let depth = i64::try_from(state.decisions()).unwrap_or(i64::MAX);
        let jitter = self.rng.gen_range(0..=self.max_jitter);
        depth.saturating_mul(self.scale).saturating_add(jitter)
    }
}

/// The available selection policies, for configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum SelectorKind {
    /// [`DfsSelector`]
    #[default]
    Dfs,
    /// [`BfsSelector`]
    Bfs,
    /// [`RandomSelector`]
    Random,
    /// [`DepthJitterSelector`]
    DepthJitter,
}

impl SelectorKind {
    /// Instantiates the policy.
    ///
    /// `seed` is ignored by the deterministic policies.
    #[must_use]
    pub fn build(self, seed: u64) -> Box<dyn PathSelector> {
        match self {
            SelectorKind::Dfs => Box::new(DfsSelector::default()),
            SelectorKind::Bfs => Box::new(BfsSelector::default()),
            SelectorKind::Random => Box::new(RandomSelector::new(seed)),
            SelectorKind::DepthJitter => Box::new(DepthJitterSelector::new(seed)),
        }
    }
}
