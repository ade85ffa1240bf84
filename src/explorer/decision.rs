//! Decision tables produced by static exploration.
//!
//! Static exploration does not consult the solver at branches, so it reaches
//! every syntactic path, feasible or not. The finished paths are folded into
//! one ordered list of `(guard, value)` rows: the function returns the value of
//! the first row whose guard is satisfiable. Row order is the order in which
//! paths finished, which makes the table deterministic for a given selector.

use std::fmt;

use crate::{
    engine::ExecutionState,
    expr::Expr,
    smt::{SolveOutcome, SolverSession},
    Result,
};

/// One row of a [`DecisionTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Path condition under which the row applies.
    pub guard: Expr,
    /// Returned value on that path.
    pub value: Expr,
}

/// Ordered `(guard, value)` rows; the first satisfiable guard wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionTable {
    entries: Vec<Decision>,
}

impl DecisionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds finished paths into a table, one row per path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unsupported`] if a path has no returned
    /// expression, as for functions without a result.
    pub fn from_states(states: &[ExecutionState]) -> Result<Self> {
        let mut table = DecisionTable::new();
        for state in states {
            let value = state.return_value().ok_or_else(|| {
                unsupported_error!(
                    "Decision table row for path {} without a returned value",
                    state.path_condition()
                )
            })?;
            table.push(state.path_condition().clone(), value.clone());
        }
        Ok(table)
    }

    /// Appends a row.
    pub fn push(&mut self, guard: Expr, value: Expr) {
        self.entries.push(Decision { guard, value });
    }

    /// Returns the rows in order.
    #[must_use]
    pub fn entries(&self) -> &[Decision] {
        &self.entries
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the table as one [`Conditional`](crate::expr::ExprKind::Conditional)
    /// expression with the same rows.
    #[must_use]
    pub fn to_expression(&self) -> Expr {
        Expr::conditional(
            self.entries
                .iter()
                .map(|d| (d.guard.clone(), d.value.clone()))
                .collect(),
        )
    }

    /// Returns the first row whose guard is satisfiable.
    ///
    /// Rows whose probe times out are skipped.
    ///
    /// # Errors
    ///
    /// Propagates solver and encoder failures.
    pub fn select(&self, session: &mut SolverSession) -> Result<Option<&Decision>> {
        for decision in &self.entries {
            match session.probe(&decision.guard)? {
                SolveOutcome::Sat => return Ok(Some(decision)),
                SolveOutcome::Unsat => {}
                other => log::warn!("Guard {} is undecided: {}", decision.guard, other),
            }
        }
        Ok(None)
    }

    /// Removes every row whose guard is unsatisfiable.
    ///
    /// Undecided rows are kept. Returns the number of removed rows.
    ///
    /// # Errors
    ///
    /// Propagates solver and encoder failures.
    pub fn prune(&mut self, session: &mut SolverSession) -> Result<usize> {
        let before = self.entries.len();
        let mut kept = Vec::with_capacity(before);
        for decision in self.entries.drain(..) {
            if session.probe(&decision.guard)? != SolveOutcome::Unsat {
                kept.push(decision);
            }
        }
        self.entries = kept;
        Ok(before - self.entries.len())
    }
}

impl fmt::Display for DecisionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, decision) in self.entries.iter().enumerate() {
            writeln!(f, "{index:>3}: {} => {}", decision.guard, decision.value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{expr::ExprKind, ir::Type};

    fn x() -> Expr {
        Expr::input("x", Type::INT)
    }

    fn table() -> DecisionTable {
        let mut table = DecisionTable::new();
        let big = Expr::gt(x(), Expr::int(5));
        let impossible = Expr::create_and(big.clone(), Expr::lt(x(), Expr::int(3)));
        table.push(impossible, Expr::int(1));
        table.push(big.clone(), Expr::int(2));
        table.push(Expr::create_not(big), Expr::int(3));
        table
    }

    #[test]
    fn test_conditional_keeps_row_order() {
        let table = table();
        match table.to_expression().kind() {
            ExprKind::Conditional(options) => {
                let values: Vec<_> = options.iter().filter_map(|(_, v)| v.as_int()).collect();
                assert_eq!(values, vec![1, 2, 3]);
            }
            other => panic!("expected a conditional, got {other:?}"),
        }
    }

    #[test]
    fn test_select_skips_unsatisfiable_rows() -> Result<()> {
        let table = table();
        let mut session = SolverSession::default();
        let selected = table.select(&mut session)?;
        assert_eq!(selected.and_then(|d| d.value.as_int()), Some(2));
        Ok(())
    }

    #[test]
    fn test_prune() -> Result<()> {
        let mut table = table();
        let mut session = SolverSession::default();
        assert_eq!(table.prune(&mut session)?, 1);
        assert_eq!(table.len(), 2);
        assert_eq!(session.depth(), 0);
        Ok(())
    }
}
