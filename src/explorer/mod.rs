//! Exploration of all paths of a function.
//!
//! The [`Scheduler`] keeps a priority queue of pending
//! [`ExecutionState`](crate::engine::ExecutionState)s and steps them with an
//! [`Interpreter`](crate::engine::Interpreter) until every path has finished.
//! The [`Analyzer`] wraps that loop behind the two entry points of the crate,
//! [`Analyzer::analyze_function`] and [`Analyzer::analyze_method`].
//!
//! # Path Selection
//!
//! The order in which pending states are stepped is chosen by a
//! [`PathSelector`]:
//!
//! | Selector | Order |
//! |----------|-------|
//! | [`DfsSelector`] | most recently queued first |
//! | [`BfsSelector`] | least recently queued first |
//! | [`RandomSelector`] | uniformly random, seeded |
//! | [`DepthJitterSelector`] | most branch decisions first, with bounded jitter |
//!
//! Selection never changes which paths are reported, only the order in which
//! they finish.

mod analyzer;
mod config;
mod decision;
mod scheduler;
mod selector;

pub use analyzer::{Analysis, Analyzer, Outcome};
pub use config::AnalysisConfig;
pub use decision::{Decision, DecisionTable};
pub use scheduler::Scheduler;
pub use selector::{
    BfsSelector, DepthJitterSelector, DfsSelector, PathSelector, RandomSelector, SelectorKind,
};
