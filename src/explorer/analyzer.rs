//! Analysis entry points.

use std::sync::Arc;

use crate::{
    engine::{ExecutionState, ExplorationStats, Interpreter, Strategy},
    explorer::{AnalysisConfig, DecisionTable, Scheduler},
    ir::{Function, Program},
    smt::{SolverSession, SolverStats},
    Error, Result,
};

/// What an analysis found, depending on the strategy.
#[derive(Debug)]
pub enum Outcome {
    /// Every feasible finished path, from [`Strategy::Dynamic`].
    Paths(Vec<ExecutionState>),
    /// All syntactic paths folded into a table, from [`Strategy::Static`].
    Table(DecisionTable),
}

/// Result of analyzing one function.
#[derive(Debug)]
pub struct Analysis {
    /// Qualified name of the analyzed function.
    pub function: String,
    /// Finished paths or decision table.
    pub outcome: Outcome,
    /// Exploration counters.
    pub stats: ExplorationStats,
    /// Solver counters.
    pub solver: SolverStats,
}

impl Analysis {
    /// Returns the number of paths or table rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.outcome {
            Outcome::Paths(paths) => paths.len(),
            Outcome::Table(table) => table.len(),
        }
    }

    /// Returns `true` if no path finished.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the finished paths of a dynamic analysis.
    #[must_use]
    pub fn paths(&self) -> Option<&[ExecutionState]> {
        match &self.outcome {
            Outcome::Paths(paths) => Some(paths),
            Outcome::Table(_) => None,
        }
    }

    /// Returns the decision table of a static analysis.
    #[must_use]
    pub fn table(&self) -> Option<&DecisionTable> {
        match &self.outcome {
            Outcome::Table(table) => Some(table),
            Outcome::Paths(_) => None,
        }
    }
}

/// Symbolic analysis of the functions of one program.
///
/// Every analysis runs with its own [`SolverSession`], so analyses are
/// independent of each other.
///
/// # Example
///
/// ```rust,no_run
/// use pathscope::{
///     ir::{BinaryOperator, Constant, FunctionBuilder, Program, Type},
///     AnalysisConfig, Analyzer,
/// };
///
/// let mut b = FunctionBuilder::new("abs");
/// let x = b.param("x", Type::INT);
/// b.set_result(Type::INT);
/// let negative = b.new_block();
/// let positive = b.new_block();
/// let cond = b.binop(BinaryOperator::Lt, x, Constant::int(0));
/// b.branch(cond, negative, positive);
/// b.switch_to(negative);
/// let neg = b.binop(BinaryOperator::Sub, Constant::int(0), x);
/// b.ret(neg);
/// b.switch_to(positive);
/// b.ret(x);
///
/// let mut program = Program::new();
/// program.add_function(b.build()?);
/// let analysis = Analyzer::new(&program, AnalysisConfig::default()).analyze_function("abs")?;
/// assert_eq!(analysis.len(), 2);
/// # Ok::<(), pathscope::Error>(())
/// ```
pub struct Analyzer<'p> {
    program: &'p Program,
    config: AnalysisConfig,
}

impl<'p> Analyzer<'p> {
    /// Creates an analyzer for `program`.
    #[must_use]
    pub fn new(program: &'p Program, config: AnalysisConfig) -> Self {
        Analyzer { program, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyzes the free function `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] if the program declares no such
    /// function, and any error that halted exploration.
    pub fn analyze_function(&self, name: &str) -> Result<Analysis> {
        let function = self
            .program
            .function(name)
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))?;
        self.analyze(Arc::clone(function))
    }

    /// Analyzes the method `name` declared on `receiver`.
    ///
    /// The receiver is the first parameter and becomes a symbolic input like
    /// every other parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] if the program declares no such
    /// method, and any error that halted exploration.
    pub fn analyze_method(&self, receiver: &str, name: &str) -> Result<Analysis> {
        let function = self
            .program
            .method(receiver, name)
            .ok_or_else(|| Error::UnknownFunction(format!("({receiver}).{name}")))?;
        self.analyze(Arc::clone(function))
    }

    /// Explores `function` from a fresh entry state.
    ///
    /// # Errors
    ///
    /// Any interpreter or solver error halts exploration and is returned.
    pub fn analyze(&self, function: Arc<Function>) -> Result<Analysis> {
        let name = function.qualified_name();
        log::debug!(
            "Analyzing {} with {} strategy and {} selector",
            name,
            self.config.strategy,
            self.config.selector
        );

        let mut session = SolverSession::new(self.config.solver.clone());
        let interpreter = Interpreter::new(self.program, self.config.strategy);
        let selector = self.config.selector.build(self.config.seed);
        let mut scheduler = Scheduler::new(interpreter, selector, self.config.max_steps);

        let paths = scheduler.explore(ExecutionState::entry(function)?, &mut session)?;
        let outcome = match self.config.strategy {
            Strategy::Dynamic => Outcome::Paths(paths),
            Strategy::Static => Outcome::Table(DecisionTable::from_states(&paths)?),
        };
        let stats = scheduler.stats().clone();
        log::info!("Analyzed {}: {}", name, stats);

        Ok(Analysis {
            function: name,
            outcome,
            stats,
            solver: session.stats(),
        })
    }
}
