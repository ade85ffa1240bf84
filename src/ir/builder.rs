//! Fluent construction of [`Function`]s.
//!
//! The builder plays the role of a front-end for embedders and tests: it
//! allocates value ids, infers result types from operand types, and appends
//! instructions to the current block.
//!
//! ```rust
//! use pathscope::ir::{BinaryOperator, FunctionBuilder, Type};
//!
//! let mut b = FunctionBuilder::new("max");
//! let x = b.param("x", Type::INT);
//! let y = b.param("y", Type::INT);
//! b.set_result(Type::INT);
//! let (then_block, else_block) = (b.new_block(), b.new_block());
//! let cond = b.binop(BinaryOperator::Gt, x, y);
//! b.branch(cond, then_block, else_block);
//! b.switch_to(then_block);
//! b.ret(x);
//! b.switch_to(else_block);
//! b.ret(y);
//! let function = b.build()?;
//! assert_eq!(function.blocks().len(), 3);
//! # Ok::<(), pathscope::Error>(())
//! ```

use rustc_hash::FxHashMap;

use crate::{
    ir::{
        BinaryOperator, Block, BlockId, Callee, Function, Instruction, InstructionKind, Intrinsic,
        Operand, Parameter, PhiNode, Type, UnaryOperator, ValueId,
    },
    Result,
};

/// Incremental builder for a [`Function`].
#[derive(Debug)]
pub struct FunctionBuilder {
    name: String,
    receiver: Option<String>,
    params: Vec<Parameter>,
    result: Option<Type>,
    blocks: Vec<Block>,
    current: BlockId,
    next_value: u32,
    types: FxHashMap<ValueId, Type>,
}

impl FunctionBuilder {
    /// Starts a free function with an empty entry block selected.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        FunctionBuilder {
            name: name.into(),
            receiver: None,
            params: Vec::new(),
            result: None,
            blocks: vec![Block::new(0)],
            current: 0,
            next_value: 0,
            types: FxHashMap::default(),
        }
    }

    /// Starts a method of `receiver` with an empty entry block selected.
    #[must_use]
    pub fn method(receiver: impl Into<String>, name: impl Into<String>) -> Self {
        let mut builder = Self::new(name);
        builder.receiver = Some(receiver.into());
        builder
    }

    /// Declares the next formal parameter.
    pub fn param(&mut self, name: impl Into<String>, ty: Type) -> ValueId {
        let id = self.fresh(ty.clone());
        self.params.push(Parameter {
            id,
            name: name.into(),
            ty,
        });
        id
    }

    /// Sets the result type.
    pub fn set_result(&mut self, ty: Type) {
        self.result = Some(ty);
    }

    /// Appends a new empty block and returns its id. The current block is unchanged.
    pub fn new_block(&mut self) -> BlockId {
        let id = self.blocks.len();
        self.blocks.push(Block::new(id));
        id
    }

    /// Makes `block` the target of subsequent instructions.
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    /// Returns the block instructions are currently appended to.
    #[must_use]
    pub const fn current_block(&self) -> BlockId {
        self.current
    }

    /// Returns the static type of an operand, if known.
    #[must_use]
    pub fn type_of(&self, operand: &Operand) -> Option<Type> {
        match operand {
            Operand::Value(id) => self.types.get(id).cloned(),
            Operand::Const(c) => Some(c.ty()),
        }
    }

    /// Appends a binary operation. Comparisons yield `bool`, everything else
    /// the left operand's type.
    pub fn binop(
        &mut self,
        op: BinaryOperator,
        left: impl Into<Operand>,
        right: impl Into<Operand>,
    ) -> ValueId {
        let (left, right) = (left.into(), right.into());
        let ty = if op.is_comparison() {
            Type::Bool
        } else {
            self.type_of(&left).unwrap_or(Type::INT)
        };
        self.define(ty, InstructionKind::BinOp { op, left, right })
    }

    /// Appends a unary operation. `Deref` yields the pointee type.
    pub fn unop(&mut self, op: UnaryOperator, operand: impl Into<Operand>) -> ValueId {
        let operand = operand.into();
        let operand_ty = self.type_of(&operand).unwrap_or(Type::INT);
        let ty = match op {
            UnaryOperator::Not => Type::Bool,
            UnaryOperator::Deref => operand_ty.element().cloned().unwrap_or(operand_ty),
            UnaryOperator::Neg | UnaryOperator::Complement => operand_ty,
        };
        self.define(ty, InstructionKind::UnOp { op, operand })
    }

    /// Appends a load through `addr`.
    pub fn load(&mut self, addr: impl Into<Operand>) -> ValueId {
        self.unop(UnaryOperator::Deref, addr)
    }

    /// Appends a numeric conversion to `to`.
    pub fn convert(&mut self, value: impl Into<Operand>, to: Type) -> ValueId {
        self.define(
            to,
            InstructionKind::Convert {
                value: value.into(),
            },
        )
    }

    /// Appends a representation-preserving type change to `to`.
    pub fn change_type(&mut self, value: impl Into<Operand>, to: Type) -> ValueId {
        self.define(
            to,
            InstructionKind::ChangeType {
                value: value.into(),
            },
        )
    }

    /// Appends a call; a result value is defined when `result` is given.
    pub fn call(
        &mut self,
        callee: Callee,
        args: Vec<Operand>,
        result: Option<Type>,
    ) -> Option<ValueId> {
        let kind = InstructionKind::Call { callee, args };
        match result {
            Some(ty) => Some(self.define(ty, kind)),
            None => {
                self.push(Instruction::effect(kind));
                None
            }
        }
    }

    /// Appends a call of an intrinsic.
    pub fn intrinsic(
        &mut self,
        intrinsic: Intrinsic,
        args: Vec<Operand>,
        result: Option<Type>,
    ) -> Option<ValueId> {
        self.call(Callee::Intrinsic(intrinsic), args, result)
    }

    /// Appends an allocation of `ty`, yielding a `*ty`.
    pub fn alloc(&mut self, ty: Type) -> ValueId {
        self.define(Type::pointer(ty.clone()), InstructionKind::Alloc { ty })
    }

    /// Appends a slice allocation of `len` elements of `elem`.
    pub fn make_slice(&mut self, elem: Type, len: impl Into<Operand>) -> ValueId {
        self.define(
            Type::slice(elem.clone()),
            InstructionKind::MakeSlice {
                elem,
                len: len.into(),
            },
        )
    }

    /// Appends a field address computation, yielding a `*field_ty`.
    pub fn field_addr(&mut self, base: impl Into<Operand>, field: usize, field_ty: Type) -> ValueId {
        self.define(
            Type::pointer(field_ty),
            InstructionKind::FieldAddr {
                base: base.into(),
                field,
            },
        )
    }

    /// Appends a field read from a struct value.
    pub fn field(&mut self, base: impl Into<Operand>, field: usize, field_ty: Type) -> ValueId {
        self.define(
            field_ty,
            InstructionKind::Field {
                base: base.into(),
                field,
            },
        )
    }

    /// Appends an element address computation.
    pub fn index_addr(&mut self, base: impl Into<Operand>, index: impl Into<Operand>) -> ValueId {
        let base = base.into();
        let elem = self.element_type(&base);
        self.define(
            Type::pointer(elem),
            InstructionKind::IndexAddr {
                base,
                index: index.into(),
            },
        )
    }

    /// Appends an element read from an array value.
    pub fn index(&mut self, base: impl Into<Operand>, index: impl Into<Operand>) -> ValueId {
        let base = base.into();
        let elem = self.element_type(&base);
        self.define(
            elem,
            InstructionKind::Index {
                base,
                index: index.into(),
            },
        )
    }

    /// Appends a store of `value` through `addr`.
    pub fn store(&mut self, addr: impl Into<Operand>, value: impl Into<Operand>) {
        self.push(Instruction::effect(InstructionKind::Store {
            addr: addr.into(),
            value: value.into(),
        }));
    }

    /// Adds a phi node to the current block.
    pub fn phi(&mut self, ty: Type, edges: &[(Operand, BlockId)]) -> ValueId {
        let id = self.fresh(ty.clone());
        let mut phi = PhiNode::new(id, ty);
        for (value, pred) in edges {
            phi.set_operand(value.clone(), *pred);
        }
        self.blocks[self.current].add_phi(phi);
        id
    }

    /// Adds or replaces one edge of a phi created earlier, e.g. a loop back edge.
    pub fn add_phi_edge(&mut self, phi: ValueId, value: impl Into<Operand>, pred: BlockId) {
        let value = value.into();
        for block in &mut self.blocks {
            if let Some(node) = block
                .phi_nodes_mut()
                .iter_mut()
                .find(|node| node.result() == phi)
            {
                node.set_operand(value, pred);
                return;
            }
        }
    }

    /// Terminates the current block with a jump.
    pub fn jump(&mut self, target: BlockId) {
        self.push(Instruction::effect(InstructionKind::Jump { target }));
    }

    /// Terminates the current block with a conditional branch.
    pub fn branch(&mut self, cond: impl Into<Operand>, then_block: BlockId, else_block: BlockId) {
        self.push(Instruction::effect(InstructionKind::If {
            cond: cond.into(),
            then_block,
            else_block,
        }));
    }

    /// Terminates the current block with a return of `value`.
    pub fn ret(&mut self, value: impl Into<Operand>) {
        self.push(Instruction::effect(InstructionKind::Return {
            value: Some(value.into()),
        }));
    }

    /// Terminates the current block with a return without value.
    pub fn ret_void(&mut self) {
        self.push(Instruction::effect(InstructionKind::Return { value: None }));
    }

    /// Terminates the current block with a panic.
    pub fn panic(&mut self, value: impl Into<Operand>) {
        self.push(Instruction::effect(InstructionKind::Panic {
            value: value.into(),
        }));
    }

    /// Appends a placeholder for a construct the engine does not model.
    pub fn unsupported(&mut self, name: impl Into<String>) {
        self.push(Instruction::effect(InstructionKind::Unsupported {
            name: name.into(),
        }));
    }

    /// Finishes the function.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if a block lacks a terminator.
    pub fn build(self) -> Result<Function> {
        Function::new(
            self.name,
            self.receiver,
            self.params,
            self.result,
            self.blocks,
        )
    }

    fn fresh(&mut self, ty: Type) -> ValueId {
        let id = ValueId::new(self.next_value);
        self.next_value += 1;
        self.types.insert(id, ty);
        id
    }

    fn define(&mut self, ty: Type, kind: InstructionKind) -> ValueId {
        let id = self.fresh(ty.clone());
        self.push(Instruction::new(Some(id), Some(ty), kind));
        id
    }

    fn push(&mut self, instruction: Instruction) {
        self.blocks[self.current].add_instruction(instruction);
    }

    fn element_type(&self, base: &Operand) -> Type {
        let base_ty = self.type_of(base).unwrap_or(Type::INT);
        match &base_ty {
            // Pointer to array: index through to the array's element.
            Type::Pointer(inner) => inner.element().cloned().unwrap_or((**inner).clone()),
            other => other.element().cloned().unwrap_or(Type::INT),
        }
    }
}
