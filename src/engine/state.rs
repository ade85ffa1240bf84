//! Execution states: one explored path.

use std::sync::Arc;

use crate::{
    engine::{CallStackFrame, Value},
    expr::Expr,
    heap::SymbolicHeap,
    ir::Function,
    Error, Result,
};

/// A path through the analyzed function.
///
/// A state owns a call stack (innermost frame last), the conjunction of the
/// branch conditions taken so far, and the heap. Cloning a state is a fork:
/// frames and heap are persistent structures, so the copies share memory
/// until one of them writes, and neither ever observes the other's writes.
#[derive(Debug, Clone)]
pub struct ExecutionState {
    frames: Vec<CallStackFrame>,
    path_condition: Expr,
    heap: SymbolicHeap,
    /// Next id for values minted by the `symbolic` intrinsic.
    next_fresh: u64,
    /// Branch decisions taken along this path.
    decisions: usize,
}

impl ExecutionState {
    /// Creates the initial state of an analysis.
    ///
    /// Every parameter of `function` becomes an input of the same name and
    /// type, and the path condition starts out as `true`.
    ///
    /// # Errors
    ///
    /// Propagates [`CallStackFrame::new`] failures.
    pub fn entry(function: Arc<Function>) -> Result<Self> {
        let args = function
            .params()
            .iter()
            .map(|param| Value::Expr(Expr::input(param.name.clone(), param.ty.clone())))
            .collect();
        let frame = CallStackFrame::new(function, args)?;
        Ok(ExecutionState {
            frames: vec![frame],
            path_condition: Expr::boolean(true),
            heap: SymbolicHeap::new(),
            next_fresh: 0,
            decisions: 0,
        })
    }

    /// Creates an independent copy of this state.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Returns the accumulated path condition.
    #[must_use]
    pub fn path_condition(&self) -> &Expr {
        &self.path_condition
    }

    /// Conjoins `condition` onto the path condition.
    pub fn constrain(&mut self, condition: Expr) {
        self.path_condition = Expr::create_and(self.path_condition.clone(), condition);
    }

    /// Returns the heap.
    #[must_use]
    pub fn heap(&self) -> &SymbolicHeap {
        &self.heap
    }

    /// Returns the heap for modification.
    pub fn heap_mut(&mut self) -> &mut SymbolicHeap {
        &mut self.heap
    }

    /// Returns the call stack, outermost frame first.
    #[must_use]
    pub fn frames(&self) -> &[CallStackFrame] {
        &self.frames
    }

    /// Returns the number of frames on the call stack.
    #[must_use]
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns the number of branch decisions taken along this path.
    #[must_use]
    pub const fn decisions(&self) -> usize {
        self.decisions
    }

    pub(crate) fn record_decision(&mut self) {
        self.decisions += 1;
    }

    /// Returns the active frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCallStack`] if there is none.
    pub fn current_frame(&self) -> Result<&CallStackFrame> {
        self.frames.last().ok_or(Error::EmptyCallStack)
    }

    /// Returns the active frame for modification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCallStack`] if there is none.
    pub fn current_frame_mut(&mut self) -> Result<&mut CallStackFrame> {
        self.frames.last_mut().ok_or(Error::EmptyCallStack)
    }

    /// Splits the state into the active frame and the heap, for instructions
    /// that read values while writing memory.
    pub(crate) fn frame_and_heap(&mut self) -> Result<(&mut CallStackFrame, &mut SymbolicHeap)> {
        let frame = self.frames.last_mut().ok_or(Error::EmptyCallStack)?;
        Ok((frame, &mut self.heap))
    }

    /// Pushes the frame of a called function.
    pub fn push_frame(&mut self, frame: CallStackFrame) {
        self.frames.push(frame);
    }

    /// Returns a fresh id for a minted symbolic value.
    pub fn fresh_id(&mut self) -> u64 {
        self.next_fresh += 1;
        self.next_fresh
    }

    /// Returns `true` when the outermost function has returned.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.frames.len() == 1 && self.frames[0].has_returned()
    }

    /// Returns `true` when a callee has returned and its result has not been
    /// handed to the caller yet.
    #[must_use]
    pub fn has_completed_call(&self) -> bool {
        self.frames.len() > 1 && self.frames.last().is_some_and(CallStackFrame::has_returned)
    }

    /// Pops a returned callee and hands its result to the caller.
    ///
    /// The caller's cursor still points at the call instruction, which
    /// consumes the delivered result when it is executed next.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the top frame has not returned
    /// or has no caller.
    pub fn complete_call(&mut self) -> Result<()> {
        if self.frames.len() < 2 {
            return Err(malformed_error!("Completed call without a caller frame"));
        }
        let mut callee = self.frames.pop().ok_or(Error::EmptyCallStack)?;
        let Some(result) = callee.take_returned() else {
            return Err(malformed_error!(
                "Frame of {} completed without returning",
                callee.function().qualified_name()
            ));
        };
        self.current_frame_mut()?.deliver_call_result(result);
        Ok(())
    }

    /// Returns the value returned by the outermost function.
    ///
    /// `None` while the path is unfinished, for functions without a result,
    /// and for results that are addresses rather than expressions.
    #[must_use]
    pub fn return_value(&self) -> Option<&Expr> {
        if !self.is_complete() {
            return None;
        }
        match self.frames.first()?.return_value()? {
            Value::Expr(expr) => Some(expr),
            Value::Address(_) => None,
        }
    }

    /// Returns the analyzed entry function.
    #[must_use]
    pub fn entry_function(&self) -> Option<&Arc<Function>> {
        self.frames.first().map(CallStackFrame::function)
    }
}
