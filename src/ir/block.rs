//! Basic blocks: phi nodes followed by straight-line instructions.
//!
//! ```text
//! B2:
//!   t7 = phi(t3 from B0, t6 from B1)   // resolved on block entry
//!   t8 = t7 + 1:int                    // instructions, in order
//!   if t9 goto B3 else B4              // terminator
//! ```

use std::fmt;

use crate::ir::{BlockId, Instruction, PhiNode, ValueId};

/// A basic block of the input graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Block index within the function.
    id: BlockId,
    /// Phi nodes at block entry.
    phi_nodes: Vec<PhiNode>,
    /// Instructions in execution order; the last one is the terminator.
    instructions: Vec<Instruction>,
}

impl Block {
    /// Creates a new empty block.
    #[must_use]
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            phi_nodes: Vec::new(),
            instructions: Vec::new(),
        }
    }

    /// Returns the block index.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the phi nodes of this block.
    #[must_use]
    pub fn phi_nodes(&self) -> &[PhiNode] {
        &self.phi_nodes
    }

    /// Returns the phi nodes for modification.
    pub fn phi_nodes_mut(&mut self) -> &mut Vec<PhiNode> {
        &mut self.phi_nodes
    }

    /// Returns the instructions of this block.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the instruction at `index`.
    #[must_use]
    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Appends a phi node.
    pub fn add_phi(&mut self, phi: PhiNode) {
        self.phi_nodes.push(phi);
    }

    /// Appends an instruction.
    pub fn add_instruction(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Returns the terminator, if the block has one.
    #[must_use]
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions
            .last()
            .filter(|instr| instr.kind().is_terminator())
    }

    /// Iterates over every value this block defines, phis first.
    pub fn defined_values(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.phi_nodes
            .iter()
            .map(PhiNode::result)
            .chain(self.instructions.iter().filter_map(Instruction::dest))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "B{}:", self.id)?;
        for phi in &self.phi_nodes {
            writeln!(f, "  {phi}")?;
        }
        for instr in &self.instructions {
            writeln!(f, "  {instr}")?;
        }
        Ok(())
    }
}
