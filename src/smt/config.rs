//! Solver configuration.
//!
//! # Example
//!
//! ```rust
//! use pathscope::smt::SolverConfig;
//!
//! let config = SolverConfig::new()
//!     .with_timeout_ms(500)
//!     .with_fail_on_timeout(true);
//! assert!(config.fail_on_timeout);
//! ```

/// Settings of a [`SolverSession`](crate::smt::SolverSession).
///
/// # Default Configuration
///
/// - 10 second budget per query
/// - Unsat cores enabled
/// - Timeouts are reported as [`SolveOutcome::Timeout`](crate::smt::SolveOutcome::Timeout)
///   and the affected branch is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Budget per `check` in milliseconds (0 for unlimited).
    pub timeout_ms: u32,
    /// Track assumptions so that unsat cores can be extracted.
    pub unsat_cores: bool,
    /// Turn timeouts into [`Error::SolverTimeout`](crate::Error::SolverTimeout).
    pub fail_on_timeout: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            timeout_ms: 10_000,
            unsat_cores: true,
            fail_on_timeout: false,
        }
    }
}

impl SolverConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-query budget.
    ///
    /// # Arguments
    ///
    /// * `ms` - Budget in milliseconds (0 for unlimited)
    ///
    /// # Returns
    ///
    /// Returns `self` for method chaining.
    #[must_use]
    pub fn with_timeout_ms(mut self, ms: u32) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Enables or disables unsat core tracking.
    #[must_use]
    pub fn with_unsat_cores(mut self, enabled: bool) -> Self {
        self.unsat_cores = enabled;
        self
    }

    /// Makes timeouts fatal.
    #[must_use]
    pub fn with_fail_on_timeout(mut self, fail: bool) -> Self {
        self.fail_on_timeout = fail;
        self
    }
}
