// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]

//! # pathscope
//!
//! A symbolic execution engine for typed SSA functions. `pathscope` runs a
//! function on symbolic inputs, forks at every branch whose condition depends
//! on them, and reports each feasible path together with its path condition
//! and returned expression. Feasibility is decided by Z3.
//!
//! ## Features
//!
//! - **Hash-consed expressions** - structurally equal expressions are the same object
//! - **Symbolic heap** - allocation handles, per-field regions, arrays and aliasing
//! - **Bit-precise encoding** - wrapping integers, IEEE floats and complex numbers
//! - **Incremental solving** - scoped probes, tracked assumptions and unsat cores
//! - **Pluggable search** - depth-first, breadth-first, random and depth-jitter selectors
//! - **Two strategies** - fork-and-prune paths, or a decision table of all paths
//! - **Test generation** - concrete inputs and expected results for each path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pathscope::{
//!     ir::{BinaryOperator, FunctionBuilder, Program, Type},
//!     AnalysisConfig, Analyzer,
//! };
//!
//! // func max(a, b int) int { if a > b { return a }; return b }
//! let mut b = FunctionBuilder::new("max");
//! let a_ = b.param("a", Type::INT);
//! let b_ = b.param("b", Type::INT);
//! b.set_result(Type::INT);
//! let then_block = b.new_block();
//! let else_block = b.new_block();
//! let cond = b.binop(BinaryOperator::Gt, a_, b_);
//! b.branch(cond, then_block, else_block);
//! b.switch_to(then_block);
//! b.ret(a_);
//! b.switch_to(else_block);
//! b.ret(b_);
//!
//! let mut program = Program::new();
//! program.add_function(b.build()?);
//!
//! let analysis = Analyzer::new(&program, AnalysisConfig::default()).analyze_function("max")?;
//! for path in analysis.paths().unwrap_or_default() {
//!     println!("{} => {:?}", path.path_condition(), path.return_value());
//! }
//! # Ok::<(), pathscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ir`] - The analyzed program: functions, blocks, instructions and types
//! - [`expr`] - Symbolic expressions and their concrete evaluation
//! - [`heap`] - Memory of one path
//! - [`smt`] - Translation to Z3 and the solver session
//! - [`engine`] - Execution states and the one-instruction interpreter
//! - [`explorer`] - Worklist, path selectors and the [`Analyzer`]
//! - [`testgen`] - Concrete test cases from finished paths
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! An analysis either explores every path or fails as a whole. Constructs
//! without a symbolic rule are never skipped; they surface as
//! [`Error::Unsupported`]. Infeasible branches are not errors.

#[macro_use]
pub(crate) mod error;

pub mod engine;
pub mod explorer;
pub mod expr;
pub mod heap;
pub mod ir;
pub mod smt;
pub mod testgen;

/// `pathscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `pathscope` Error type
///
/// Every fallible operation of the crate reports one of its variants.
pub use error::Error;

/// Main entry point for analyzing a program.
///
/// See [`explorer::Analyzer`].
pub use explorer::{AnalysisConfig, Analyzer};
