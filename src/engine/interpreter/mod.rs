//! The symbolic instruction interpreter.
//!
//! The [`Interpreter`] advances an [`ExecutionState`] by exactly one
//! instruction of its active frame and returns the successor states: none
//! when the path turned out infeasible, two after a symbolic branch, and one
//! otherwise.
//!
//! # Value Resolution
//!
//! Instructions without side effects (arithmetic, comparisons, conversions
//! and address computations) are skipped when the cursor passes them and
//! evaluated the first time another instruction needs their result. The
//! result is memoized in the frame until the next block entry. Everything
//! else executes in program order.
//!
//! # Calls
//!
//! A call to a declared function pushes the callee's frame and leaves the
//! caller's cursor on the call instruction. Once the callee has returned, the
//! scheduler pops it and delivers the result to the caller through
//! [`ExecutionState::complete_call`]; the call instruction then executes a
//! second time and consumes the delivered result.

mod handlers;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::{
    engine::{CallStackFrame, ExecutionState, ExplorationStats, Strategy, Value},
    expr::Expr,
    heap::SymbolicHeap,
    ir::{BlockId, Callee, Instruction, InstructionKind, Operand, Program, ValueId},
    smt::{SolveOutcome, SolverSession},
    Error, Result,
};

/// One-instruction state transition over a program.
///
/// # Example
///
/// ```rust,no_run
/// use pathscope::{
///     engine::{ExecutionState, Interpreter, Strategy},
///     ir::{FunctionBuilder, Program, Type},
///     smt::SolverSession,
/// };
///
/// let mut b = FunctionBuilder::new("id");
/// let x = b.param("x", Type::INT);
/// b.set_result(Type::INT);
/// b.ret(x);
/// let mut program = Program::new();
/// let function = program.add_function(b.build()?);
///
/// let mut interpreter = Interpreter::new(&program, Strategy::Dynamic);
/// let mut session = SolverSession::default();
/// let state = ExecutionState::entry(function)?;
/// let successors = interpreter.step(state, &mut session)?;
/// assert!(successors[0].is_complete());
/// # Ok::<(), pathscope::Error>(())
/// ```
pub struct Interpreter<'p> {
    /// Functions, methods and struct definitions of the analyzed program.
    program: &'p Program,
    /// Branch handling.
    strategy: Strategy,
    /// Counters over all steps.
    stats: ExplorationStats,
}

impl<'p> Interpreter<'p> {
    /// Creates an interpreter for `program`.
    #[must_use]
    pub fn new(program: &'p Program, strategy: Strategy) -> Self {
        Interpreter {
            program,
            strategy,
            stats: ExplorationStats::new(),
        }
    }

    /// Returns the branch handling strategy.
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Returns the execution statistics.
    #[must_use]
    pub fn stats(&self) -> &ExplorationStats {
        &self.stats
    }

    /// Returns the execution statistics for modification.
    pub fn stats_mut(&mut self) -> &mut ExplorationStats {
        &mut self.stats
    }

    /// Executes the instruction under the active frame's cursor.
    ///
    /// # Arguments
    ///
    /// * `state` - The state to advance; it is consumed
    /// * `session` - Solver used for feasibility probes
    ///
    /// # Returns
    ///
    /// The successor states, at most two.
    ///
    /// # Errors
    ///
    /// Any instruction or operand without a symbolic rule is fatal and
    /// reported as [`Error::Unsupported`]. Graph inconsistencies surface as
    /// [`Error::Malformed`], [`Error::UnreachablePhi`], [`Error::UnknownFunction`]
    /// or [`Error::UnknownType`]; encoder and solver failures propagate
    /// unchanged.
    pub fn step(
        &mut self,
        mut state: ExecutionState,
        session: &mut SolverSession,
    ) -> Result<Vec<ExecutionState>> {
        self.stats.steps += 1;

        let frame = state.current_frame()?;
        if frame.has_returned() {
            return Err(malformed_error!(
                "Stepped finished frame of {}",
                frame.function().qualified_name()
            ));
        }
        let function = Arc::clone(frame.function());
        let instruction = function
            .block(frame.block())?
            .instruction(frame.cursor())
            .ok_or_else(|| {
                malformed_error!(
                    "Cursor {} is past the end of B{} in {}",
                    frame.cursor(),
                    frame.block(),
                    function.name()
                )
            })?;
        log::trace!("{}: {}", function.qualified_name(), instruction);

        if instruction.kind().is_pure() {
            state.current_frame_mut()?.advance();
            return Ok(vec![state]);
        }

        match instruction.kind() {
            InstructionKind::UnOp { operand, .. } => {
                let value = self.load_operand(&mut state, operand)?;
                self.finish(state, instruction, Some(Value::Expr(value)))
            }
            InstructionKind::Call { callee, args } => match callee {
                Callee::Intrinsic(intrinsic) => {
                    self.intrinsic(state, instruction, *intrinsic, args, session)
                }
                _ => self.call(state, instruction, callee, args),
            },
            InstructionKind::Alloc { ty } => {
                let handle = self.allocate(&mut state, ty)?;
                self.finish(state, instruction, Some(Value::Expr(handle)))
            }
            InstructionKind::MakeSlice { elem, len } => {
                let len = self.resolve_expr(&mut state, len)?;
                let handle = Self::make_slice(&mut state, elem, len);
                self.finish(state, instruction, Some(Value::Expr(handle)))
            }
            InstructionKind::Field { base, field } => {
                let value = self.read_field(&mut state, base, *field)?;
                self.finish(state, instruction, Some(Value::Expr(value)))
            }
            InstructionKind::Index { base, index } => {
                let value = self.read_element(&mut state, base, index)?;
                self.finish(state, instruction, Some(Value::Expr(value)))
            }
            InstructionKind::Store { addr, value } => {
                self.store(&mut state, addr, value)?;
                self.finish(state, instruction, None)
            }
            InstructionKind::Jump { target } => {
                self.enter_block(&mut state, *target)?;
                Ok(vec![state])
            }
            InstructionKind::If {
                cond,
                then_block,
                else_block,
            } => {
                let cond = self.resolve_expr(&mut state, cond)?;
                self.branch(state, cond, *then_block, *else_block, session)
            }
            InstructionKind::Return { value } => {
                let value = match value {
                    Some(operand) => Some(self.resolve(&mut state, operand)?),
                    None => None,
                };
                state.current_frame_mut()?.set_returned(value);
                Ok(vec![state])
            }
            InstructionKind::Panic { value } => {
                let value = self.resolve(&mut state, value)?;
                Err(unsupported_error!(
                    "panic({}) reached in {}",
                    value,
                    function.qualified_name()
                ))
            }
            InstructionKind::Unsupported { name } => Err(unsupported_error!(
                "{} in {}",
                name,
                function.qualified_name()
            )),
            other => Err(malformed_error!("Unexpected instruction kind {:?}", other)),
        }
    }

    /// Stores the instruction's result, if it defines one, and moves on.
    fn finish(
        &self,
        mut state: ExecutionState,
        instruction: &Instruction,
        value: Option<Value>,
    ) -> Result<Vec<ExecutionState>> {
        let frame = state.current_frame_mut()?;
        if let (Some(dest), Some(value)) = (instruction.dest(), value) {
            frame.define(dest, value);
        }
        frame.advance();
        Ok(vec![state])
    }

    /// Resolves an operand of the active frame.
    pub(crate) fn resolve(&self, state: &mut ExecutionState, operand: &Operand) -> Result<Value> {
        let (frame, heap) = state.frame_and_heap()?;
        self.resolve_in(frame, heap, operand)
    }

    /// Resolves an operand that must be an expression.
    fn resolve_expr(&self, state: &mut ExecutionState, operand: &Operand) -> Result<Expr> {
        self.resolve(state, operand)?.into_expr()
    }

    fn resolve_in(
        &self,
        frame: &mut CallStackFrame,
        heap: &SymbolicHeap,
        operand: &Operand,
    ) -> Result<Value> {
        match operand {
            Operand::Const(constant) => Ok(Value::Expr(Expr::from_constant(constant))),
            Operand::Value(id) => self.resolve_value(frame, heap, *id),
        }
    }

    /// Looks up a value, evaluating its pure definition on first use.
    fn resolve_value(
        &self,
        frame: &mut CallStackFrame,
        heap: &SymbolicHeap,
        id: ValueId,
    ) -> Result<Value> {
        if let Some(value) = frame.lookup(id) {
            return Ok(value.clone());
        }

        let function = Arc::clone(frame.function());
        match function.defining_instruction(id) {
            Some(instruction) if instruction.kind().is_pure() => {
                let value = self.evaluate_pure(frame, heap, instruction)?;
                frame.memoize(id, value.clone());
                Ok(value)
            }
            _ => Err(malformed_error!(
                "Value {} of {} used before its definition",
                id,
                function.qualified_name()
            )),
        }
    }

    /// Moves the active frame into `target`, binding the block's phis.
    ///
    /// Every phi reads its incoming value against the frame as it was before
    /// entry, so phis of one block never observe each other's new values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnreachablePhi`] if no visited block feeds a phi.
    fn enter_block(&self, state: &mut ExecutionState, target: BlockId) -> Result<()> {
        let (frame, heap) = state.frame_and_heap()?;
        let function = Arc::clone(frame.function());
        let block = function.block(target)?;

        let mut bindings = Vec::with_capacity(block.phi_nodes().len());
        if !block.phi_nodes().is_empty() {
            let mut stack = frame.predecessors().to_vec();
            stack.push(target);
            for phi in block.phi_nodes() {
                let edge = phi
                    .resolve_edge(&stack)
                    .ok_or(Error::UnreachablePhi { block: target })?;
                let value = self.resolve_in(frame, heap, edge.value())?;
                bindings.push((phi.result(), value));
            }
        }

        frame.enter_block(target, bindings);
        Ok(())
    }

    /// Handles a conditional branch.
    ///
    /// Literal conditions continue into the one reachable arm. Symbolic ones
    /// fork; each arm conjoins its guard onto the path condition and, under
    /// [`Strategy::Dynamic`], is dropped when the solver proves it infeasible.
    /// Arms whose probe times out are kept.
    fn branch(
        &mut self,
        mut state: ExecutionState,
        cond: Expr,
        then_block: BlockId,
        else_block: BlockId,
        session: &mut SolverSession,
    ) -> Result<Vec<ExecutionState>> {
        if let Some(taken) = cond.as_bool() {
            let target = if taken { then_block } else { else_block };
            self.enter_block(&mut state, target)?;
            return Ok(vec![state]);
        }

        self.stats.forks += 1;
        state.record_decision();

        let arms = [
            (cond.clone(), then_block),
            (Expr::create_not(cond), else_block),
        ];
        let mut successors = Vec::with_capacity(arms.len());
        for (guard, target) in arms {
            let mut arm = state.fork();
            arm.constrain(guard);
            if !self.is_feasible(&arm, session)? {
                log::debug!("Pruned B{} under {}", target, arm.path_condition());
                continue;
            }
            self.enter_block(&mut arm, target)?;
            successors.push(arm);
        }
        Ok(successors)
    }

    /// Decides whether a state's path condition may hold.
    fn is_feasible(&mut self, state: &ExecutionState, session: &mut SolverSession) -> Result<bool> {
        let condition = state.path_condition();
        if condition.is_false() {
            self.stats.pruned += 1;
            return Ok(false);
        }
        if !self.strategy.prunes() {
            return Ok(true);
        }

        match session.probe(condition)? {
            SolveOutcome::Unsat => {
                self.stats.pruned += 1;
                Ok(false)
            }
            SolveOutcome::Timeout => {
                self.stats.timeouts += 1;
                Ok(true)
            }
            SolveOutcome::Sat | SolveOutcome::Unknown(_) => Ok(true),
        }
    }

    /// Handles a call of a declared function or method.
    ///
    /// On first execution the callee's frame is pushed. When the callee's
    /// result has been delivered, it is bound to the instruction's result.
    fn call(
        &self,
        mut state: ExecutionState,
        instruction: &Instruction,
        callee: &Callee,
        args: &[Operand],
    ) -> Result<Vec<ExecutionState>> {
        if let Some(result) = state.current_frame_mut()?.take_call_result() {
            let value = match (instruction.dest(), result) {
                (Some(_), None) => {
                    return Err(malformed_error!("Call of {} returned no value", callee))
                }
                (_, value) => value,
            };
            return self.finish(state, instruction, value);
        }

        let function = self.program.resolve(callee)?;
        let values = args
            .iter()
            .map(|arg| self.resolve(&mut state, arg))
            .collect::<Result<Vec<_>>>()?;
        log::trace!("Calling {} with {} arguments", function.qualified_name(), values.len());
        state.push_frame(CallStackFrame::new(function, values)?);
        Ok(vec![state])
    }
}
