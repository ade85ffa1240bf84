use thiserror::Error;

use crate::ir::BlockId;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! unsupported_error {
    ($fmt:expr) => {
        crate::Error::Unsupported($fmt.to_string())
    };

    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Unsupported(format!($fmt, $($arg)*))
    };
}

macro_rules! sort_mismatch {
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::SortMismatch {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which covers every failure the engine can report.
///
/// Exploration is all-or-nothing: every interpretation step either produces its
/// successor states or fails with one of these errors, and a failure halts the
/// whole exploration. Infeasible branches are not errors; they are dropped
/// silently by the interpreter.
///
/// # Error Categories
///
/// ## Fatal interpretation errors
/// - [`Error::Unsupported`] - An instruction, operator or intrinsic without a rule
/// - [`Error::UnreachablePhi`] - No phi edge matches the predecessor stack
/// - [`Error::UnknownFunction`] - A call target is neither intrinsic nor declared
/// - [`Error::UnknownType`] - A named struct type has no definition
/// - [`Error::EmptyCallStack`] - A state without an active frame was stepped
///
/// ## Encoder invariants
/// - [`Error::SortMismatch`] - Operand sorts disagree inside the SMT encoder
///
/// ## Solver
/// - [`Error::SolverTimeout`] - A query exceeded its budget and timeouts are fatal
/// - [`Error::Solver`] - The solver failed for a reason other than a timeout
///
/// # Examples
///
/// ```rust,no_run
/// use pathscope::{Analyzer, AnalysisConfig, Error, ir::Program};
///
/// let program = Program::new();
/// let analyzer = Analyzer::new(&program, AnalysisConfig::default());
/// match analyzer.analyze_function("main") {
///     Ok(analysis) => println!("{} paths", analysis.len()),
///     Err(Error::Unsupported(what)) => eprintln!("not modeled: {what}"),
///     Err(e) => eprintln!("analysis failed: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input graph is internally inconsistent.
    ///
    /// Raised for dangling value ids, missing blocks, or terminators that are
    /// missing at the end of a block. Carries the source location where the
    /// inconsistency was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An instruction, operator or intrinsic has no symbolic rule.
    ///
    /// Unmodeled effects are never skipped, since ignoring them would make
    /// every path reported after that point unsound.
    #[error("Unsupported construct - {0}")]
    Unsupported(String),

    /// Two solver values of incompatible sorts met in one operation.
    ///
    /// This indicates a bug in expression construction, not bad user input.
    #[error("Sort mismatch - {file}:{line}: {message}")]
    SortMismatch {
        /// Description of the operation and the offending sorts
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A phi node had no edge for any block on the predecessor stack.
    #[error("No phi edge of block {block} matches the predecessor stack")]
    UnreachablePhi {
        /// The block holding the phi node
        block: BlockId,
    },

    /// A call target is not an intrinsic and is not declared in the program.
    #[error("Unknown function - {0}")]
    UnknownFunction(String),

    /// A named type is referenced but not defined in the program.
    #[error("Unknown type - {0}")]
    UnknownType(String),

    /// A state with no active frame was handed to the interpreter.
    #[error("Execution state has an empty call stack")]
    EmptyCallStack,

    /// A solver query ran out of time.
    ///
    /// Only raised when [`SolverConfig::fail_on_timeout`](crate::smt::SolverConfig::fail_on_timeout)
    /// is set; otherwise timeouts surface as
    /// [`SolveOutcome::Timeout`](crate::smt::SolveOutcome::Timeout).
    #[error("Solver timed out after {0} ms")]
    SolverTimeout(u32),

    /// The solver reported a failure unrelated to timeouts.
    #[error("Solver error - {0}")]
    Solver(String),
}
