//! Solver encoding and incremental solving.
//!
//! This module turns [`Expr`](crate::expr::Expr) trees into solver terms and
//! drives an incremental solver over them.
//!
//! # Key Components
//!
//! - [`SmtSort`] - Sort dispatch from static types
//! - [`SmtEncoder`] - Memoizing translation of expressions into terms
//! - [`SmtValue`] / [`Encoded`] - Encoded terms, with complex values as pairs
//! - [`SolverSession`] - Assertions, scopes, probes, assumptions and cores
//! - [`SolverConfig`] - Timeout and core tracking settings
//!
//! # Example
//!
//! ```rust,no_run
//! use pathscope::{
//!     expr::Expr,
//!     ir::Type,
//!     smt::{SolveOutcome, SolverConfig, SolverSession},
//! };
//!
//! let mut session = SolverSession::new(SolverConfig::default());
//! let x = Expr::input("x", Type::INT);
//! session.assert_expr(&Expr::gt(x.clone(), Expr::int(10)))?;
//! assert_eq!(session.probe(&Expr::lt(x, Expr::int(5)))?, SolveOutcome::Unsat);
//! # Ok::<(), pathscope::Error>(())
//! ```

mod config;
mod encoder;
mod session;
mod sort;
mod value;

pub use config::SolverConfig;
pub use encoder::SmtEncoder;
pub use session::{SolveOutcome, SolverSession, SolverStats};
pub use sort::{SmtSort, HANDLE_WIDTH};
pub use value::{Encoded, SmtValue};
