//! Symbolic execution of single paths.
//!
//! This module holds everything needed to run one path through a function:
//!
//! - [`ExecutionState`] - call stack, path condition and heap of one path
//! - [`CallStackFrame`] - one function activation with its value tables
//! - [`Value`] and [`Address`] - what an SSA value can denote
//! - [`Interpreter`] - the one-instruction transition function
//! - [`Strategy`] - whether branches are checked for feasibility
//! - [`ExplorationStats`] - counters collected while exploring
//!
//! Scheduling many paths against each other is the job of
//! [`crate::explorer`].

mod frame;
mod interpreter;
mod state;
mod stats;
mod strategy;
mod value;

pub use frame::CallStackFrame;
pub use interpreter::Interpreter;
pub use state::ExecutionState;
pub use stats::ExplorationStats;
pub use strategy::Strategy;
pub use value::{Address, Value};
