//! The exploration worklist.
//!
//! The [`Scheduler`] drives an [`Interpreter`] over a priority queue of
//! pending states until every path has finished or been dropped.
//!
//! # Scheduling Algorithm
//!
//! 1. The state with the highest priority is popped; among states with equal
//!    priority the one queued first wins.
//! 2. The interpreter executes exactly one instruction of it, producing zero,
//!    one or two successors.
//! 3. A successor whose entry function returned is a finished path.
//! 4. A successor whose callee returned has the callee's frame popped and the
//!    result handed to the caller, then goes back into the queue.
//! 5. Every other successor is queued with a priority from the active
//!    [`PathSelector`].
//!
//! Exploration terminates only for functions with finitely many feasible
//! paths, unless a step budget is configured.

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::{
    engine::{ExecutionState, ExplorationStats, Interpreter},
    explorer::PathSelector,
    smt::SolverSession,
    Result,
};

/// Entry in the priority queue.
struct ScheduleEntry {
    priority: i64,
    /// Sequence number for FIFO ordering within the same priority.
    sequence: u64,
    state: ExecutionState,
}

impl PartialEq for ScheduleEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for ScheduleEntry {}

impl Ord for ScheduleEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first, then lower sequence (earlier) first
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for ScheduleEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority-ordered driver of one exploration.
pub struct Scheduler<'p> {
    interpreter: Interpreter<'p>,
    selector: Box<dyn PathSelector>,
    queue: BinaryHeap<ScheduleEntry>,
    sequence: u64,
    /// Step budget, 0 for unlimited.
    max_steps: u64,
}

impl<'p> Scheduler<'p> {
    /// Creates a scheduler around `interpreter`.
    ///
    /// # Arguments
    ///
    /// * `interpreter` - Executes single instructions
    /// * `selector` - Scores re-queued states
    /// * `max_steps` - Instruction budget, 0 for unlimited
    #[must_use]
    pub fn new(interpreter: Interpreter<'p>, selector: Box<dyn PathSelector>, max_steps: u64) -> Self {
        Scheduler {
            interpreter,
            selector,
            queue: BinaryHeap::new(),
            sequence: 0,
            max_steps,
        }
    }

    /// Returns the statistics collected so far.
    #[must_use]
    pub fn stats(&self) -> &ExplorationStats {
        self.interpreter.stats()
    }

    /// Returns the number of pending states.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn enqueue(&mut self, state: ExecutionState) {
        let priority = self.selector.priority(&state);
        self.sequence += 1;
        self.queue.push(ScheduleEntry {
            priority,
            sequence: self.sequence,
            state,
        });
    }

    fn budget_exhausted(&self) -> bool {
        self.max_steps > 0 && self.interpreter.stats().steps >= self.max_steps
    }

    /// Explores every path reachable from `entry`.
    ///
    /// # Arguments
    ///
    /// * `entry` - The initial state, usually from [`ExecutionState::entry`]
    /// * `session` - Solver used for feasibility probes
    ///
    /// # Returns
    ///
    /// The finished states in completion order.
    ///
    /// # Errors
    ///
    /// Any interpreter error halts exploration and is returned unchanged.
    pub fn explore(
        &mut self,
        entry: ExecutionState,
        session: &mut SolverSession,
    ) -> Result<Vec<ExecutionState>> {
        self.interpreter.stats_mut().start();
        self.enqueue(entry);

        let mut completed = Vec::new();
        while let Some(entry) = self.queue.pop() {
            if self.budget_exhausted() {
                let abandoned = self.queue.len() as u64 + 1;
                log::warn!(
                    "Step budget of {} exhausted, abandoning {} pending paths",
                    self.max_steps,
                    abandoned
                );
                self.interpreter.stats_mut().abandoned += abandoned;
                self.queue.clear();
                break;
            }

            for mut successor in self.interpreter.step(entry.state, session)? {
                if successor.is_complete() {
                    self.interpreter.stats_mut().completed += 1;
                    log::debug!(
                        "Path {} finished under {}",
                        completed.len() + 1,
                        successor.path_condition()
                    );
                    completed.push(successor);
                    continue;
                }
                if successor.has_completed_call() {
                    successor.complete_call()?;
                    self.interpreter.stats_mut().calls_completed += 1;
                }
                self.enqueue(successor);
            }
        }

        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        engine::Strategy,
        explorer::{BfsSelector, DfsSelector},
        ir::{BinaryOperator, Constant, Function, FunctionBuilder, Program, Type},
    };

    /// `if x > 0 { if x > 10 { 2 } else { 1 } } else { 0 }`
    fn ladder(program: &mut Program) -> Arc<Function> {
        let mut b = FunctionBuilder::new("ladder");
        let x = b.param("x", Type::INT);
        b.set_result(Type::INT);
        let positive = b.new_block();
        let big = b.new_block();
        let small = b.new_block();
        let negative = b.new_block();
        let gt0 = b.binop(BinaryOperator::Gt, x, Constant::int(0));
        b.branch(gt0, positive, negative);
        b.switch_to(positive);
        let gt10 = b.binop(BinaryOperator::Gt, x, Constant::int(10));
        b.branch(gt10, big, small);
        b.switch_to(big);
        b.ret(Constant::int(2));
        b.switch_to(small);
        b.ret(Constant::int(1));
        b.switch_to(negative);
        b.ret(Constant::int(0));
        program.add_function(b.build().unwrap())
    }

    fn results(states: &[ExecutionState]) -> Vec<i64> {
        states
            .iter()
            .filter_map(|s| s.return_value().and_then(crate::expr::Expr::as_int))
            .collect()
    }

    #[test]
    fn test_queue_order() {
        let mut program = Program::new();
        let f = ladder(&mut program);
        let state = ExecutionState::entry(f).unwrap();
        let mut queue = BinaryHeap::new();
        for (priority, sequence) in [(1, 1), (2, 2), (2, 3), (0, 4)] {
            queue.push(ScheduleEntry {
                priority,
                sequence,
                state: state.fork(),
            });
        }
        let popped: Vec<u64> = std::iter::from_fn(|| queue.pop().map(|e| e.sequence)).collect();
        assert_eq!(popped, vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_selectors_change_order_not_paths() -> Result<()> {
        let mut program = Program::new();
        let f = ladder(&mut program);

        let mut session = SolverSession::default();
        let interpreter = Interpreter::new(&program, Strategy::Dynamic);
        let mut dfs = Scheduler::new(interpreter, Box::new(DfsSelector::default()), 0);
        let depth_first = dfs.explore(ExecutionState::entry(f.clone())?, &mut session)?;

        let interpreter = Interpreter::new(&program, Strategy::Dynamic);
        let mut bfs = Scheduler::new(interpreter, Box::new(BfsSelector::default()), 0);
        let breadth_first = bfs.explore(ExecutionState::entry(f)?, &mut session)?;

        // BFS finishes the shallow path first
        assert_eq!(results(&breadth_first)[0], 0);
        let mut a = results(&depth_first);
        let mut b = results(&breadth_first);
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, vec![0, 1, 2]);
        assert_eq!(a, b);
        assert_eq!(dfs.stats().completed, 3);
        Ok(())
    }

    #[test]
    fn test_step_budget_abandons_pending_paths() -> Result<()> {
        let mut program = Program::new();
        let f = ladder(&mut program);
        let mut session = SolverSession::default();
        let interpreter = Interpreter::new(&program, Strategy::Dynamic);
        let mut scheduler = Scheduler::new(interpreter, Box::new(DfsSelector::default()), 2);

        let done = scheduler.explore(ExecutionState::entry(f)?, &mut session)?;
        assert!(done.is_empty());
        assert_eq!(scheduler.stats().steps, 2);
        assert!(scheduler.stats().abandoned > 0);
        assert_eq!(scheduler.pending(), 0);
        Ok(())
    }
}
