//! Incremental solver session.
//!
//! A [`SolverSession`] wraps one solver context together with the
//! [`SmtEncoder`] whose terms are asserted into it. It supports two regimes:
//!
//! - **Branch probes** - [`SolverSession::probe`] opens a scope, asserts one
//!   condition, checks, and closes the scope again, so no probe can leave
//!   assertions behind for the next one.
//! - **Soft constraints** - persistent assertions plus a batch of tracked
//!   assumptions checked with [`SolverSession::check_assumptions`]; when the
//!   batch is unsatisfiable, [`SolverSession::unsat_core`] names the
//!   assumptions responsible.
//!
//! Timeouts are a distinct [`SolveOutcome`] and never count as unsatisfiable.

use std::fmt;

use rustc_hash::FxHashMap;
use z3::{
    ast::{Ast, Bool, Float},
    Model, Params, SatResult, Solver,
};

use crate::{
    expr::{Concrete, Expr},
    ir::Type,
    smt::{
        value::{Encoded, SmtValue},
        SmtEncoder, SolverConfig,
    },
    Error, Result,
};

/// Result of a satisfiability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// The assertions have a model.
    Sat,
    /// The assertions are contradictory.
    Unsat,
    /// The query exceeded its time budget.
    Timeout,
    /// The solver gave up for another reason.
    Unknown(String),
}

impl SolveOutcome {
    /// Returns `true` unless the outcome proves unsatisfiability.
    ///
    /// Branches whose probe is not [`SolveOutcome::Unsat`] are kept.
    #[must_use]
    pub const fn may_be_sat(&self) -> bool {
        !matches!(self, SolveOutcome::Unsat)
    }
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveOutcome::Sat => write!(f, "sat"),
            SolveOutcome::Unsat => write!(f, "unsat"),
            SolveOutcome::Timeout => write!(f, "timeout"),
            SolveOutcome::Unknown(reason) => write!(f, "unknown ({reason})"),
        }
    }
}

/// Counters of a session's checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    /// Checks issued
    pub queries: u64,
    /// Satisfiable results
    pub sat: u64,
    /// Unsatisfiable results
    pub unsat: u64,
    /// Timeouts
    pub timeouts: u64,
    /// Other unknown results
    pub unknown: u64,
}

/// One solver context and the encoder feeding it.
pub struct SolverSession {
    solver: Solver,
    encoder: SmtEncoder,
    config: SolverConfig,
    /// Open push scopes.
    scopes: u32,
    /// Counter for assumption tracking literals.
    next_literal: u64,
    /// Core of the last unsatisfiable assumption check.
    last_core: Vec<Expr>,
    stats: SolverStats,
}

impl fmt::Debug for SolverSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverSession")
            .field("config", &self.config)
            .field("scopes", &self.scopes)
            .field("stats", &self.stats)
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}

impl Default for SolverSession {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl SolverSession {
    /// Creates a session; the configuration is fixed for its lifetime.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        let session = SolverSession {
            solver: Solver::new(),
            encoder: SmtEncoder::new(),
            config,
            scopes: 0,
            next_literal: 0,
            last_core: Vec::new(),
            stats: SolverStats::default(),
        };
        session.apply_params();
        session
    }

    fn apply_params(&self) {
        let mut params = Params::new();
        if self.config.timeout_ms > 0 {
            params.set_u32("timeout", self.config.timeout_ms);
        }
        params.set_bool("unsat_core", self.config.unsat_cores);
        self.solver.set_params(&params);
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Returns the check counters.
    #[must_use]
    pub fn stats(&self) -> SolverStats {
        self.stats
    }

    /// Returns the encoder whose terms this session accepts.
    pub fn encoder(&mut self) -> &mut SmtEncoder {
        &mut self.encoder
    }

    /// Asserts an already encoded term.
    pub fn assert(&mut self, term: &Bool) {
        self.solver.assert(term);
    }

    /// Encodes and asserts a boolean expression.
    ///
    /// # Errors
    ///
    /// Returns encoder errors for ill-sorted or unsupported expressions.
    pub fn assert_expr(&mut self, expr: &Expr) -> Result<()> {
        let term = self.encoder.encode_bool(expr)?;
        self.solver.assert(&term);
        Ok(())
    }

    /// Checks the current assertions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SolverTimeout`] on timeout when
    /// [`SolverConfig::fail_on_timeout`] is set.
    pub fn check(&mut self) -> Result<SolveOutcome> {
        let result = self.solver.check();
        self.classify(result)
    }

    fn classify(&mut self, result: SatResult) -> Result<SolveOutcome> {
        self.stats.queries += 1;
        let outcome = match result {
            SatResult::Sat => {
                self.stats.sat += 1;
                SolveOutcome::Sat
            }
            SatResult::Unsat => {
                self.stats.unsat += 1;
                SolveOutcome::Unsat
            }
            SatResult::Unknown => {
                let reason = self
                    .solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "unknown".to_string());
                if reason.contains("timeout") || reason.contains("canceled") {
                    self.stats.timeouts += 1;
                    log::warn!(
                        "Solver query timed out after {} ms",
                        self.config.timeout_ms
                    );
                    SolveOutcome::Timeout
                } else {
                    self.stats.unknown += 1;
                    log::warn!("Solver returned unknown: {reason}");
                    SolveOutcome::Unknown(reason)
                }
            }
        };

        if outcome == SolveOutcome::Timeout && self.config.fail_on_timeout {
            return Err(Error::SolverTimeout(self.config.timeout_ms));
        }
        Ok(outcome)
    }

    /// Removes all assertions and scopes.
    pub fn reset(&mut self) {
        self.solver.reset();
        self.scopes = 0;
        self.last_core.clear();
        self.apply_params();
    }

    /// Opens an assertion scope.
    pub fn push(&mut self) {
        self.solver.push();
        self.scopes += 1;
    }

    /// Closes the innermost assertion scope, retracting its assertions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Solver`] if no scope is open.
    pub fn pop(&mut self) -> Result<()> {
        if self.scopes == 0 {
            return Err(Error::Solver("pop without matching push".to_string()));
        }
        self.solver.pop(1);
        self.scopes -= 1;
        Ok(())
    }

    /// Returns the number of open scopes.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.scopes
    }

    /// Checks `condition` against the current assertions without keeping it.
    ///
    /// # Errors
    ///
    /// Returns encoder errors, and [`Error::SolverTimeout`] when timeouts
    /// are fatal. The scope is closed in every case.
    pub fn probe(&mut self, condition: &Expr) -> Result<SolveOutcome> {
        if let Some(value) = condition.as_bool() {
            return Ok(if value {
                SolveOutcome::Sat
            } else {
                SolveOutcome::Unsat
            });
        }
        let term = self.encoder.encode_bool(condition)?;
        self.push();
        self.solver.assert(&term);
        let result = self.solver.check();
        let outcome = self.classify(result);
        self.pop()?;
        outcome
    }

    /// Checks the current assertions under tracked assumptions.
    ///
    /// Each assumption is guarded by a fresh tracking literal; on
    /// [`SolveOutcome::Unsat`] the assumptions in the solver's core become
    /// available through [`SolverSession::unsat_core`].
    ///
    /// # Errors
    ///
    /// Returns encoder errors for non-boolean assumptions, and
    /// [`Error::SolverTimeout`] when timeouts are fatal.
    pub fn check_assumptions(&mut self, assumptions: &[Expr]) -> Result<SolveOutcome> {
        self.last_core.clear();
        let mut terms = Vec::with_capacity(assumptions.len());
        for assumption in assumptions {
            terms.push(self.encoder.encode_bool(assumption)?);
        }

        self.push();
        let mut literals = Vec::with_capacity(terms.len());
        let mut tracked = FxHashMap::default();
        for (assumption, term) in assumptions.iter().zip(&terms) {
            let literal = Bool::new_const(format!("$assumption_{}", self.next_literal));
            self.next_literal += 1;
            self.solver.assert(&literal.implies(term));
            tracked.insert(literal.to_string(), assumption.clone());
            literals.push(literal);
        }

        let result = self.solver.check_assumptions(&literals);
        if result == SatResult::Unsat {
            self.last_core = self
                .solver
                .get_unsat_core()
                .iter()
                .filter_map(|literal| tracked.get(&literal.to_string()).cloned())
                .collect();
        }
        let outcome = self.classify(result);
        self.pop()?;
        outcome
    }

    /// Returns the assumptions responsible for the last unsatisfiable
    /// [`SolverSession::check_assumptions`] call.
    #[must_use]
    pub fn unsat_core(&self) -> &[Expr] {
        &self.last_core
    }

    /// Returns the model of the last satisfiable check.
    #[must_use]
    pub fn model(&self) -> Option<Model> {
        self.solver.get_model()
    }

    /// Evaluates `expr` in the model of the last satisfiable check.
    ///
    /// Float values are classified through model predicates before numeric
    /// extraction, so `NaN`, infinities and signed zeros come back exactly.
    /// Unconstrained parts of the expression take arbitrary values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Solver`] if no model is available, and
    /// [`Error::Unsupported`] for array-valued expressions.
    #[allow(clippy::cast_possible_wrap)]
    pub fn value_of(&mut self, expr: &Expr) -> Result<Concrete> {
        let model = self
            .model()
            .ok_or_else(|| Error::Solver("no model available".to_string()))?;
        let ty = expr.ty();
        match self.encoder.encode(expr)? {
            Encoded::Complex(re, im) => {
                let component = ty.complex_component().unwrap_or(Type::Float64);
                let re = Self::float_value(&model, &re, &component)?;
                let im = Self::float_value(&model, &im, &component)?;
                Ok(Concrete::complex(re, im, &ty))
            }
            Encoded::Value(SmtValue::Bool(b)) => model
                .eval(&b, true)
                .and_then(|v| v.as_bool())
                .map(Concrete::Bool)
                .ok_or_else(|| Error::Solver(format!("no boolean value for {expr}"))),
            Encoded::Value(SmtValue::BV(b)) => {
                let raw = model
                    .eval(&b, true)
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| Error::Solver(format!("no bitvector value for {expr}")))?;
                Ok(match ty {
                    Type::Int(kind) => Concrete::typed_int(raw as i64, kind),
                    _ => Concrete::Handle(raw),
                })
            }
            Encoded::Value(SmtValue::Float(f)) => {
                let value = Self::float_value(&model, &f, &ty)?;
                Ok(Concrete::from_f64(value, &ty))
            }
            Encoded::Value(SmtValue::Array(_)) => Err(unsupported_error!(
                "Concrete value of array expression {}",
                expr
            )),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn float_value(model: &Model, term: &Float, ty: &Type) -> Result<f64> {
        let holds = |condition: Bool| {
            model
                .eval(&condition, true)
                .and_then(|v| v.as_bool())
                .unwrap_or(false)
        };
        if !holds(term.le(term)) {
            return Ok(f64::NAN);
        }
        for special in [f64::INFINITY, f64::NEG_INFINITY, -0.0, 0.0] {
            let literal = match ty {
                Type::Float32 => Float::from_f32(special as f32),
                _ => Float::from_f64(special),
            };
            if holds(term.eq(&literal)) {
                return Ok(special);
            }
        }
        model
            .eval(term, true)
            .map(|v| v.as_f64())
            .ok_or_else(|| Error::Solver(format!("no float value for {term}")))
    }
}
