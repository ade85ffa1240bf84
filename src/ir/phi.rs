//! Phi nodes merging values at control flow join points.
//!
//! A phi node `t3 = phi(t1 from B1, t2 from B2)` selects `t1` when control
//! arrived from block B1 and `t2` when it arrived from B2. The engine resolves
//! phis when a block is entered, reading every phi of the block against the
//! memory as it was before entry, so a phi feeding another phi of the same
//! block observes the previous iteration's value.

use std::fmt;

use crate::ir::{BlockId, Operand, Type, ValueId};

/// An operand of a phi node: the value flowing in along one predecessor edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PhiOperand {
    /// The value providing the result on this edge.
    value: Operand,
    /// The predecessor block at the source of the edge.
    predecessor: BlockId,
}

impl PhiOperand {
    /// Creates a new phi operand.
    ///
    /// # Arguments
    ///
    /// * `value` - The value flowing along the edge
    /// * `predecessor` - The block index from which this value comes
    #[must_use]
    pub const fn new(value: Operand, predecessor: BlockId) -> Self {
        Self { value, predecessor }
    }

    /// Returns the value flowing along this edge.
    #[must_use]
    pub const fn value(&self) -> &Operand {
        &self.value
    }

    /// Returns the predecessor block index.
    #[must_use]
    pub const fn predecessor(&self) -> BlockId {
        self.predecessor
    }
}

impl fmt::Display for PhiOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from B{}", self.value, self.predecessor)
    }
}

/// A phi node at the head of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct PhiNode {
    /// The value defined by this phi node.
    result: ValueId,
    /// Static type of the merged value.
    ty: Type,
    /// One operand per predecessor edge.
    operands: Vec<PhiOperand>,
}

impl PhiNode {
    /// Creates a phi node without operands.
    #[must_use]
    pub fn new(result: ValueId, ty: Type) -> Self {
        Self {
            result,
            ty,
            operands: Vec::new(),
        }
    }

    /// Returns the value defined by this phi.
    #[must_use]
    pub const fn result(&self) -> ValueId {
        self.result
    }

    /// Returns the static type of the merged value.
    #[must_use]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns the operands in insertion order.
    #[must_use]
    pub fn operands(&self) -> &[PhiOperand] {
        &self.operands
    }

    /// Adds an operand, replacing an existing one for the same predecessor.
    pub fn set_operand(&mut self, value: Operand, predecessor: BlockId) {
        if let Some(existing) = self
            .operands
            .iter_mut()
            .find(|op| op.predecessor == predecessor)
        {
            existing.value = value;
        } else {
            self.operands.push(PhiOperand::new(value, predecessor));
        }
    }

    /// Returns the operand flowing in from `predecessor`.
    #[must_use]
    pub fn operand_from(&self, predecessor: BlockId) -> Option<&PhiOperand> {
        self.operands.iter().find(|op| op.predecessor == predecessor)
    }

    /// Resolves the incoming edge against a predecessor stack.
    ///
    /// The stack holds visited blocks with the block owning this phi on top.
    /// It is scanned from the innermost predecessor outward and the first block
    /// with a matching edge wins.
    ///
    /// # Returns
    ///
    /// The matching operand, or `None` when no visited block feeds this phi.
    #[must_use]
    pub fn resolve_edge(&self, predecessors: &[BlockId]) -> Option<&PhiOperand> {
        let inner = predecessors.len().checked_sub(1)?;
        predecessors[..inner]
            .iter()
            .rev()
            .find_map(|block| self.operand_from(*block))
    }
}

impl fmt::Display for PhiNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = phi(", self.result)?;
        for (i, op) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{op}")?;
        }
        write!(f, ")")
    }
}
