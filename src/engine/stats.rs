//! Exploration counters.

use std::{
    fmt,
    time::{Duration, Instant},
};

/// Counters collected while exploring one function.
#[derive(Clone, Debug, Default)]
pub struct ExplorationStats {
    /// Instructions interpreted.
    pub steps: u64,
    /// Conditional branches with a symbolic condition.
    pub forks: u64,
    /// Branch arms dropped as infeasible.
    pub pruned: u64,
    /// Feasibility probes that timed out; the arm was kept.
    pub timeouts: u64,
    /// Callee results handed back to their callers.
    pub calls_completed: u64,
    /// Paths that reached the entry function's return.
    pub completed: u64,
    /// Pending states dropped because the step budget ran out.
    pub abandoned: u64,
    /// Time when exploration started.
    start_time: Option<Instant>,
}

impl ExplorationStats {
    /// Creates zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of exploration.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Returns the elapsed time since exploration started.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.start_time.map(|t| t.elapsed())
    }
}

impl fmt::Display for ExplorationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} steps, {} forks, {} pruned, {} timeouts, {} paths",
            self.steps, self.forks, self.pruned, self.timeouts, self.completed
        )?;
        if let Some(elapsed) = self.elapsed() {
            write!(f, " in {elapsed:?}")?;
        }
        Ok(())
    }
}
