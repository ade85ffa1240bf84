//! Concrete test cases from finished paths.
//!
//! For a finished [`ExecutionState`], [`generate`] asks the solver for inputs
//! that drive the function down that path and for the value it returns
//! there. The result is a [`TestCase`]: one concrete call and its expected
//! result, ready to be rendered into a unit test of the analyzed program.
//!
//! The returned value is pinned through a fresh input named [`RESULT`],
//! which cannot clash with a parameter name, constrained to be structurally
//! equal to the path's return expression. Float results therefore come back
//! exactly, `NaN` and signed zeros included.
//!
//! # Example
//!
//! ```rust,no_run
//! use pathscope::{
//!     ir::{BinaryOperator, Constant, FunctionBuilder, Program, Type},
//!     smt::SolverSession,
//!     testgen, AnalysisConfig, Analyzer,
//! };
//!
//! let mut b = FunctionBuilder::new("twice");
//! let x = b.param("x", Type::INT);
//! b.set_result(Type::INT);
//! let y = b.binop(BinaryOperator::Mul, x, Constant::int(2));
//! b.ret(y);
//! let mut program = Program::new();
//! program.add_function(b.build()?);
//!
//! let analysis = Analyzer::new(&program, AnalysisConfig::default()).analyze_function("twice")?;
//! let mut session = SolverSession::default();
//! for path in analysis.paths().unwrap_or_default() {
//!     if let Some(case) = testgen::generate(path, &mut session)? {
//!         println!("{case}");
//!     }
//! }
//! # Ok::<(), pathscope::Error>(())
//! ```

use std::fmt;

use crate::{
    engine::ExecutionState,
    expr::{eval, Bindings, Concrete, Expr},
    smt::{SolveOutcome, SolverSession},
    Result,
};

/// Name of the input standing for the returned value.
pub const RESULT: &str = "$res";

/// One concrete execution of a path.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    /// Qualified name of the called function.
    pub function: String,
    /// Argument values by parameter name, in declaration order.
    pub inputs: Vec<(String, Concrete)>,
    /// Returned value, `None` for functions without a result.
    pub expected: Option<Concrete>,
}

impl TestCase {
    /// Returns the inputs as evaluation bindings.
    #[must_use]
    pub fn bindings(&self) -> Bindings {
        self.inputs.iter().cloned().collect()
    }

    /// Evaluates `expr` under this test case's inputs.
    ///
    /// # Errors
    ///
    /// See [`eval::evaluate`].
    pub fn replay(&self, expr: &Expr) -> Result<Concrete> {
        eval::evaluate(expr, &self.bindings())
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.function)?;
        for (index, (_, value)) in self.inputs.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")?;
        if let Some(expected) = &self.expected {
            write!(f, " == {expected}")?;
        }
        Ok(())
    }
}

/// Solves a finished path for concrete inputs and its returned value.
///
/// # Arguments
///
/// * `state` - A finished state, see [`ExecutionState::is_complete`]
/// * `session` - Solver to query; the query runs in its own scope
///
/// # Returns
///
/// `None` if the path is infeasible or the solver gave up on it.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] for unfinished states, and encoder or
/// solver failures.
pub fn generate(state: &ExecutionState, session: &mut SolverSession) -> Result<Option<TestCase>> {
    if !state.is_complete() {
        return Err(malformed_error!("Test case requested for an unfinished path"));
    }
    let function = state
        .entry_function()
        .ok_or_else(|| malformed_error!("Finished path without an entry function"))?;

    let result = state
        .return_value()
        .map(|value| (Expr::input(RESULT, value.ty()), value));

    session.push();
    let outcome = solve(session, state.path_condition(), result.as_ref().map(|(r, v)| (r, *v)))
        .and_then(|outcome| {
            if outcome != SolveOutcome::Sat {
                log::debug!("No test case for path {}: {}", state.path_condition(), outcome);
                return Ok(None);
            }
            let mut inputs = Vec::with_capacity(function.params().len());
            for param in function.params() {
                let input = Expr::input(param.name.clone(), param.ty.clone());
                inputs.push((param.name.clone(), session.value_of(&input)?));
            }
            let expected = match &result {
                Some((res, _)) => Some(session.value_of(res)?),
                None => None,
            };
            Ok(Some(TestCase {
                function: function.qualified_name(),
                inputs,
                expected,
            }))
        });
    session.pop()?;
    outcome
}

/// Asserts `path_condition` and `res == value` in the open scope and checks.
fn solve(
    session: &mut SolverSession,
    path_condition: &Expr,
    result: Option<(&Expr, &Expr)>,
) -> Result<SolveOutcome> {
    session.assert_expr(path_condition)?;
    if let Some((res, value)) = result {
        let same = session.encoder().same_value(res, value)?;
        session.assert(&same);
    }
    session.check()
}

/// Checks that `value` can be returned under `path_condition`.
///
/// # Returns
///
/// The model's value of `value`, or `None` when `path_condition` is
/// unsatisfiable.
///
/// # Errors
///
/// Propagates encoder and solver failures.
pub fn check_result(
    path_condition: &Expr,
    value: &Expr,
    session: &mut SolverSession,
) -> Result<Option<Concrete>> {
    let res = Expr::input(RESULT, value.ty());
    session.push();
    let outcome = solve(session, path_condition, Some((&res, value))).and_then(|outcome| {
        match outcome {
            SolveOutcome::Sat => session.value_of(&res).map(Some),
            _ => Ok(None),
        }
    });
    session.pop()?;
    outcome
}
