//! Call stack frames.

use std::{fmt, sync::Arc};

use imbl::HashMap as ImHashMap;

use crate::{
    engine::Value,
    ir::{BlockId, Function, Instruction, ValueId},
    Result,
};

/// One activation of a function on a state's call stack.
///
/// A frame keeps two value tables. `memory` holds parameters, phi results and
/// the results of instructions with effects, which are written exactly when
/// the cursor executes them. `cache` memoizes pure instructions evaluated on
/// first use; it is dropped on every block entry because a loop iteration may
/// have rebound the phis those values were computed from.
///
/// Both tables are persistent maps, so cloning a frame on a fork is cheap and
/// the copies never observe each other's writes.
#[derive(Clone)]
pub struct CallStackFrame {
    /// The executing function.
    function: Arc<Function>,
    /// Values defined by parameters, phis and effectful instructions.
    memory: ImHashMap<ValueId, Value>,
    /// Lazily evaluated pure values of the current block visit.
    cache: ImHashMap<ValueId, Value>,
    /// Visited blocks, the current block on top.
    predecessors: Vec<BlockId>,
    /// Index of the next instruction within the current block.
    cursor: usize,
    /// Result of the callee this frame is waiting for.
    call_result: Option<Option<Value>>,
    /// Set once a `return` instruction has executed.
    returned: Option<Option<Value>>,
}

impl CallStackFrame {
    /// Creates a frame positioned before the entry block.
    ///
    /// # Arguments
    ///
    /// * `function` - The function to execute
    /// * `args` - One value per formal parameter
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the argument count does not match.
    pub fn new(function: Arc<Function>, args: Vec<Value>) -> Result<Self> {
        if args.len() != function.params().len() {
            return Err(malformed_error!(
                "{} expects {} arguments, got {}",
                function.qualified_name(),
                function.params().len(),
                args.len()
            ));
        }

        let memory = function
            .params()
            .iter()
            .zip(args)
            .map(|(param, value)| (param.id, value))
            .collect();

        Ok(CallStackFrame {
            function,
            memory,
            cache: ImHashMap::new(),
            predecessors: vec![0],
            cursor: 0,
            call_result: None,
            returned: None,
        })
    }

    /// Returns the executing function.
    #[must_use]
    pub fn function(&self) -> &Arc<Function> {
        &self.function
    }

    /// Returns the current block.
    #[must_use]
    pub fn block(&self) -> BlockId {
        self.predecessors.last().copied().unwrap_or(0)
    }

    /// Returns the visited blocks, the current block last.
    #[must_use]
    pub fn predecessors(&self) -> &[BlockId] {
        &self.predecessors
    }

    /// Returns the position within the current block.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the instruction under the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the cursor ran past the block end.
    pub fn current_instruction(&self) -> Result<&Instruction> {
        let block = self.function.block(self.block())?;
        block.instruction(self.cursor).ok_or_else(|| {
            malformed_error!(
                "Cursor {} is past the end of B{} in {}",
                self.cursor,
                block.id(),
                self.function.name()
            )
        })
    }

    /// Moves the cursor to the next instruction.
    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Enters `target`, binding `phis` and dropping the pure value cache.
    ///
    /// The phi values must have been resolved against the frame as it was
    /// before entry.
    pub fn enter_block(&mut self, target: BlockId, phis: Vec<(ValueId, Value)>) {
        self.predecessors.push(target);
        self.cursor = 0;
        self.cache = ImHashMap::new();
        for (id, value) in phis {
            self.memory.insert(id, value);
        }
    }

    /// Looks up a defined or cached value.
    #[must_use]
    pub fn lookup(&self, id: ValueId) -> Option<&Value> {
        self.memory.get(&id).or_else(|| self.cache.get(&id))
    }

    /// Records the result of an executed instruction.
    pub fn define(&mut self, id: ValueId, value: Value) {
        self.memory.insert(id, value);
    }

    /// Memoizes the result of a pure instruction.
    pub fn memoize(&mut self, id: ValueId, value: Value) {
        self.cache.insert(id, value);
    }

    /// Takes the result delivered by a completed callee.
    ///
    /// The outer option is `None` while no callee has completed; the inner
    /// one is `None` for callees without a result.
    pub fn take_call_result(&mut self) -> Option<Option<Value>> {
        self.call_result.take()
    }

    /// Delivers a callee's result to this frame.
    pub fn deliver_call_result(&mut self, value: Option<Value>) {
        self.call_result = Some(value);
    }

    /// Marks the frame as returned.
    pub fn set_returned(&mut self, value: Option<Value>) {
        self.returned = Some(value);
    }

    /// Returns `true` once the frame's `return` has executed.
    #[must_use]
    pub const fn has_returned(&self) -> bool {
        self.returned.is_some()
    }

    /// Returns the returned value, if the frame returned one.
    #[must_use]
    pub fn return_value(&self) -> Option<&Value> {
        self.returned.as_ref().and_then(Option::as_ref)
    }

    /// Takes the return slot, leaving the frame unfinished.
    pub fn take_returned(&mut self) -> Option<Option<Value>> {
        self.returned.take()
    }
}

impl fmt::Debug for CallStackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallStackFrame")
            .field("function", &self.function.qualified_name())
            .field("block", &self.block())
            .field("cursor", &self.cursor)
            .field("values", &self.memory.len())
            .field("returned", &self.returned)
            .finish()
    }
}
