//! Functions of the input graph.
//!
//! A [`Function`] owns its blocks and an index from every [`ValueId`] to the
//! place that defines it. The index is what makes lazy value resolution
//! possible: when an operand is first needed, the engine looks up its
//! definition here and evaluates it on demand.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::{
    ir::{Block, BlockId, Instruction, PhiNode, Type, ValueId},
    Result,
};

/// A formal parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// The value id bound to the parameter inside the body.
    pub id: ValueId,
    /// Source name; entry-point parameters become inputs of this name.
    pub name: String,
    /// Static type.
    pub ty: Type,
}

/// Where a value is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefSite {
    /// The n-th formal parameter
    Parameter(usize),
    /// A phi node of a block
    Phi {
        /// Owning block
        block: BlockId,
        /// Index into the block's phi list
        index: usize,
    },
    /// An instruction of a block
    Instruction {
        /// Owning block
        block: BlockId,
        /// Index into the block's instruction list
        index: usize,
    },
}

/// A function or method ready for analysis.
#[derive(Debug, Clone)]
pub struct Function {
    /// Function name.
    name: String,
    /// Declaring type for methods.
    receiver: Option<String>,
    /// Formal parameters; for methods the receiver is the first one.
    params: Vec<Parameter>,
    /// Result type, `None` for functions without a result.
    result: Option<Type>,
    /// Blocks indexed by [`BlockId`]; block 0 is the entry.
    blocks: Vec<Block>,
    /// Definition site of every value.
    defs: FxHashMap<ValueId, DefSite>,
}

impl Function {
    /// Creates a function and indexes its definitions.
    ///
    /// # Arguments
    ///
    /// * `name` - Function name
    /// * `receiver` - Declaring type for methods
    /// * `params` - Formal parameters
    /// * `result` - Result type
    /// * `blocks` - Blocks, where `blocks[i].id() == i`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if there are no blocks, if block ids
    /// do not match their positions, if a value is defined twice, or if a
    /// block does not end in a terminator.
    pub fn new(
        name: impl Into<String>,
        receiver: Option<String>,
        params: Vec<Parameter>,
        result: Option<Type>,
        blocks: Vec<Block>,
    ) -> Result<Self> {
        let name = name.into();
        if blocks.is_empty() {
            return Err(malformed_error!("Function {} has no blocks", name));
        }

        let mut defs = FxHashMap::default();
        let mut define = |id: ValueId, site: DefSite| {
            if defs.insert(id, site).is_some() {
                Err(malformed_error!("Value {} of {} is defined twice", id, name))
            } else {
                Ok(())
            }
        };

        for (index, param) in params.iter().enumerate() {
            define(param.id, DefSite::Parameter(index))?;
        }
        for (position, block) in blocks.iter().enumerate() {
            if block.id() != position {
                return Err(malformed_error!(
                    "Block B{} of {} stored at position {}",
                    block.id(),
                    name,
                    position
                ));
            }
            if block.terminator().is_none() {
                return Err(malformed_error!(
                    "Block B{} of {} has no terminator",
                    position,
                    name
                ));
            }
            for (index, phi) in block.phi_nodes().iter().enumerate() {
                define(phi.result(), DefSite::Phi { block: position, index })?;
            }
            for (index, instr) in block.instructions().iter().enumerate() {
                if let Some(dest) = instr.dest() {
                    define(dest, DefSite::Instruction { block: position, index })?;
                }
            }
        }

        Ok(Function {
            name,
            receiver,
            params,
            result,
            blocks,
            defs,
        })
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declaring type for methods.
    #[must_use]
    pub fn receiver(&self) -> Option<&str> {
        self.receiver.as_deref()
    }

    /// Returns the qualified name, `Type.name` for methods.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.receiver {
            Some(receiver) => format!("{receiver}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Returns the formal parameters.
    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Returns the result type.
    #[must_use]
    pub fn result(&self) -> Option<&Type> {
        self.result.as_ref()
    }

    /// Returns all blocks.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns the block with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the block does not exist.
    pub fn block(&self, id: BlockId) -> Result<&Block> {
        self.blocks
            .get(id)
            .ok_or_else(|| malformed_error!("Block B{} does not exist in {}", id, self.name))
    }

    /// Returns the definition site of a value.
    #[must_use]
    pub fn def_site(&self, id: ValueId) -> Option<DefSite> {
        self.defs.get(&id).copied()
    }

    /// Returns the instruction defining `id`, if it is an instruction result.
    #[must_use]
    pub fn defining_instruction(&self, id: ValueId) -> Option<&Instruction> {
        match self.def_site(id)? {
            DefSite::Instruction { block, index } => self.blocks.get(block)?.instruction(index),
            _ => None,
        }
    }

    /// Returns the phi defining `id`, if it is a phi result.
    #[must_use]
    pub fn defining_phi(&self, id: ValueId) -> Option<&PhiNode> {
        match self.def_site(id)? {
            DefSite::Phi { block, index } => self.blocks.get(block)?.phi_nodes().get(index),
            _ => None,
        }
    }

    /// Returns the static type of a value.
    #[must_use]
    pub fn value_type(&self, id: ValueId) -> Option<&Type> {
        match self.def_site(id)? {
            DefSite::Parameter(index) => self.params.get(index).map(|p| &p.ty),
            DefSite::Phi { .. } => self.defining_phi(id).map(PhiNode::ty),
            DefSite::Instruction { .. } => self.defining_instruction(id)?.ty(),
        }
    }

    /// Returns the number of instructions across all blocks.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions().len()).sum()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func {}(", self.qualified_name())?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}: {}", param.id, param.name, param.ty)?;
        }
        write!(f, ")")?;
        if let Some(result) = &self.result {
            write!(f, " {result}")?;
        }
        writeln!(f)?;
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        Ok(())
    }
}
