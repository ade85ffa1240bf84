//! Analysis configuration.

use crate::{engine::Strategy, explorer::SelectorKind, smt::SolverConfig};

/// Settings of an [`Analyzer`](crate::Analyzer).
///
/// # Default Configuration
///
/// - [`Strategy::Dynamic`]: fork and prune, report every feasible path
/// - Depth-first path selection
/// - Seed 0 for the randomized selectors
/// - Default solver settings
/// - No step budget
///
/// # Example
///
/// ```rust
/// use pathscope::{engine::Strategy, explorer::SelectorKind, AnalysisConfig};
///
/// let config = AnalysisConfig::new()
///     .with_strategy(Strategy::Static)
///     .with_selector(SelectorKind::Random)
///     .with_seed(42);
/// assert_eq!(config.seed, 42);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Branch handling.
    pub strategy: Strategy,
    /// Order in which pending paths are explored.
    pub selector: SelectorKind,
    /// Seed of the randomized selectors.
    pub seed: u64,
    /// Settings of the solver session created per analysis.
    pub solver: SolverConfig,
    /// Maximum number of interpreted instructions (0 for unlimited).
    ///
    /// When the budget runs out, the paths completed so far are returned and
    /// the pending ones are counted as abandoned.
    pub max_steps: u64,
}

impl AnalysisConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the branch handling strategy.
    ///
    /// # Returns
    ///
    /// Returns `self` for method chaining.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the path selection policy.
    #[must_use]
    pub fn with_selector(mut self, selector: SelectorKind) -> Self {
        self.selector = selector;
        self
    }

    /// Sets the seed of the randomized selectors.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the solver configuration.
    #[must_use]
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Limits the number of interpreted instructions.
    ///
    /// # Arguments
    ///
    /// * `max_steps` - Step budget (0 for unlimited)
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.strategy, Strategy::Dynamic);
        assert_eq!(config.selector, SelectorKind::Dfs);
        assert_eq!(config.max_steps, 0);
    }
}
