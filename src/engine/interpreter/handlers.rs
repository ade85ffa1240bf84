//! Instruction handlers for the interpreter.
//!
//! This module implements the per-category rules used by
//! [`Interpreter::step`]: pure value construction, intrinsics, and memory
//! access through the symbolic heap.

use crate::{
    engine::{Address, CallStackFrame, ExecutionState, Interpreter, Value},
    expr::{builtin, eval, BinaryOp, Concrete, Expr},
    heap::SymbolicHeap,
    ir::{
        BinaryOperator, Instruction, InstructionKind, Intrinsic, Operand, StructDef, Type,
        UnaryOperator,
    },
    smt::SolverSession,
    Error, Result,
};

impl Interpreter<'_> {
    /// Builds the value of a side-effect free instruction.
    pub(super) fn evaluate_pure(
        &self,
        frame: &mut CallStackFrame,
        heap: &SymbolicHeap,
        instruction: &Instruction,
    ) -> Result<Value> {
        match instruction.kind() {
            InstructionKind::BinOp { op, left, right } => {
                let left = self.resolve_in(frame, heap, left)?.into_expr()?;
                let right = self.resolve_in(frame, heap, right)?.into_expr()?;
                Ok(Value::Expr(Self::binary(*op, left, right)))
            }
            InstructionKind::UnOp { op, operand } => {
                let operand = self.resolve_in(frame, heap, operand)?.into_expr()?;
                Self::unary(*op, operand).map(Value::Expr)
            }
            InstructionKind::Convert { value } => {
                let value = self.resolve_in(frame, heap, value)?.into_expr()?;
                let to = instruction
                    .ty()
                    .ok_or_else(|| malformed_error!("Conversion of {} without a type", value))?;
                Ok(Value::Expr(Expr::create_cast(value, to.clone())))
            }
            InstructionKind::ChangeType { value } => self.resolve_in(frame, heap, value),
            InstructionKind::FieldAddr { base, field } => {
                let receiver = self.load_value(heap, self.resolve_in(frame, heap, base)?)?;
                let owner = Self::owner_of(&receiver)?;
                Ok(Value::Address(Address::Field {
                    receiver,
                    owner,
                    field: *field,
                }))
            }
            InstructionKind::IndexAddr { base, index } => {
                let array = self.load_value(heap, self.resolve_in(frame, heap, base)?)?;
                let index = self.resolve_in(frame, heap, index)?.into_expr()?;
                Ok(Value::Address(Address::Element { array, index }))
            }
            other => Err(malformed_error!("{:?} is not a pure instruction", other)),
        }
    }

    /// Translates a front-end binary operator.
    ///
    /// Only `<`, `>` and `==` are primitive comparisons; the remaining ones
    /// are derived from them.
    fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
        let logical = left.ty() == Type::Bool;
        match op {
            BinaryOperator::Add => Expr::create_add(left, right),
            BinaryOperator::Sub => Expr::binary(BinaryOp::Sub, left, right),
            BinaryOperator::Mul => Expr::binary(BinaryOp::Mul, left, right),
            BinaryOperator::Div => Expr::binary(BinaryOp::Div, left, right),
            BinaryOperator::Rem => Expr::binary(BinaryOp::Rem, left, right),
            BinaryOperator::And if logical => Expr::create_and(left, right),
            BinaryOperator::Or if logical => Expr::create_or(left, right),
            BinaryOperator::And => Expr::binary(BinaryOp::And, left, right),
            BinaryOperator::Or => Expr::binary(BinaryOp::Or, left, right),
            BinaryOperator::Xor => Expr::binary(BinaryOp::Xor, left, right),
            BinaryOperator::AndNot => Expr::binary(BinaryOp::AndNot, left, right),
            BinaryOperator::Shl => Expr::binary(BinaryOp::Shl, left, right),
            BinaryOperator::Shr => Expr::binary(BinaryOp::Shr, left, right),
            BinaryOperator::Eq => Expr::equals(left, right),
            BinaryOperator::Ne => Expr::create_not(Expr::equals(left, right)),
            BinaryOperator::Lt => Expr::lt(left, right),
            BinaryOperator::Gt => Expr::gt(left, right),
            BinaryOperator::Le => {
                Expr::create_or(Expr::lt(left.clone(), right.clone()), Expr::equals(left, right))
            }
            BinaryOperator::Ge => {
                Expr::create_or(Expr::gt(left.clone(), right.clone()), Expr::equals(left, right))
            }
        }
    }

    fn unary(op: UnaryOperator, operand: Expr) -> Result<Expr> {
        let ty = operand.ty();
        match op {
            UnaryOperator::Not => Ok(Expr::create_not(operand)),
            UnaryOperator::Neg => match &ty {
                Type::Int(kind) => Ok(Expr::binary(
                    BinaryOp::Sub,
                    Expr::typed_int(0, *kind),
                    operand,
                )),
                Type::Float32 => Ok(Expr::binary(BinaryOp::Mul, operand, Expr::float32(-1.0))),
                Type::Float64 => Ok(Expr::binary(BinaryOp::Mul, operand, Expr::float64(-1.0))),
                Type::Complex64 | Type::Complex128 => Ok(Expr::binary(
                    BinaryOp::Sub,
                    Expr::complex(0.0, 0.0, ty.clone()),
                    operand,
                )),
                other => Err(unsupported_error!("Negation of {}", other)),
            },
            UnaryOperator::Complement => match ty.int_kind() {
                Some(kind) => Ok(Expr::binary(
                    BinaryOp::Xor,
                    operand,
                    Expr::typed_int(-1, kind),
                )),
                None => Err(unsupported_error!("Complement of {}", ty)),
            },
            UnaryOperator::Deref => Err(malformed_error!("Load of {} evaluated as pure", operand)),
        }
    }

    /// Returns the struct type name behind a struct value or pointer.
    fn owner_of(receiver: &Expr) -> Result<String> {
        match receiver.ty() {
            Type::Named(name) => Ok(name),
            Type::Pointer(inner) => match *inner {
                Type::Named(name) => Ok(name),
                other => Err(malformed_error!("Field of non-struct pointee {}", other)),
            },
            other => Err(malformed_error!(
                "Field of {} with non-struct type {}",
                receiver,
                other
            )),
        }
    }

    fn struct_def(&self, name: &str) -> Result<&StructDef> {
        self.program
            .struct_def(name)
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }

    /// Reads through an address; plain expressions are returned unchanged.
    fn load_value(&self, heap: &SymbolicHeap, value: Value) -> Result<Expr> {
        match value {
            Value::Expr(expr) => Ok(expr),
            Value::Address(Address::Field {
                receiver,
                owner,
                field,
            }) => heap.get_field(&receiver, self.struct_def(&owner)?, field),
            Value::Address(Address::Element { array, index }) => {
                heap.get_from_array(&array, &index)
            }
        }
    }

    /// Executes a load (`*p`) of an operand.
    pub(super) fn load_operand(
        &self,
        state: &mut ExecutionState,
        operand: &Operand,
    ) -> Result<Expr> {
        match self.resolve(state, operand)? {
            Value::Expr(pointer) => state.heap().deref(&pointer),
            address => self.load_value(state.heap(), address),
        }
    }

    /// Executes `alloc T`.
    ///
    /// Cells are not initialized: reading one before the first store yields
    /// an unconstrained value.
    pub(super) fn allocate(&self, state: &mut ExecutionState, ty: &Type) -> Result<Expr> {
        match ty {
            Type::Named(name) => {
                let def = self.struct_def(name)?;
                Ok(state.heap_mut().allocate_struct(def))
            }
            other => Ok(state.heap_mut().allocate(Type::pointer(other.clone()))),
        }
    }

    /// Executes `make []T, len`.
    pub(super) fn make_slice(state: &mut ExecutionState, elem: &Type, len: Expr) -> Expr {
        let len = Expr::create_cast(len, Type::INT);
        state.heap_mut().allocate_array(elem, len)
    }

    /// Executes `v.field` on a struct value.
    pub(super) fn read_field(
        &self,
        state: &mut ExecutionState,
        base: &Operand,
        field: usize,
    ) -> Result<Expr> {
        let value = self.resolve(state, base)?;
        let receiver = self.load_value(state.heap(), value)?;
        let def = self.struct_def(&Self::owner_of(&receiver)?)?;
        state.heap().get_field(&receiver, def, field)
    }

    /// Executes `a[i]` on an array value.
    pub(super) fn read_element(
        &self,
        state: &mut ExecutionState,
        base: &Operand,
        index: &Operand,
    ) -> Result<Expr> {
        let value = self.resolve(state, base)?;
        let array = self.load_value(state.heap(), value)?;
        let index = self.resolve(state, index)?.into_expr()?;
        state.heap().get_from_array(&array, &index)
    }

    /// Executes `*addr = value`.
    pub(super) fn store(
        &self,
        state: &mut ExecutionState,
        addr: &Operand,
        value: &Operand,
    ) -> Result<()> {
        let target = self.resolve(state, addr)?;
        let value = self.resolve(state, value)?;
        let value = self.load_value(state.heap(), value)?;

        match target {
            Value::Expr(pointer) => match pointer.ty() {
                Type::Pointer(inner) => match *inner {
                    Type::Named(name) => {
                        let def = self.struct_def(&name)?;
                        state.heap_mut().copy_struct(&pointer, &value, def)
                    }
                    _ => state.heap_mut().assign(&pointer, value),
                },
                other => Err(malformed_error!(
                    "Store through {} of non-pointer type {}",
                    pointer,
                    other
                )),
            },
            Value::Address(Address::Field {
                receiver,
                owner,
                field,
            }) => {
                let def = self.struct_def(&owner)?;
                state.heap_mut().assign_field(&receiver, def, field, value)
            }
            Value::Address(Address::Element { array, index }) => {
                state.heap_mut().assign_to_array(&array, index, value)
            }
        }
    }

    /// Executes an intrinsic call.
    ///
    /// `assume` is the only intrinsic that can end a path: the state is
    /// dropped when the assumed predicate makes its path condition
    /// unsatisfiable.
    pub(super) fn intrinsic(
        &mut self,
        mut state: ExecutionState,
        instruction: &Instruction,
        intrinsic: Intrinsic,
        args: &[Operand],
        session: &mut SolverSession,
    ) -> Result<Vec<ExecutionState>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.resolve(&mut state, arg)?;
            values.push(self.load_value(state.heap(), value)?);
        }

        let result = match (intrinsic, values.as_slice()) {
            (Intrinsic::Len, [array]) => state.heap().length(array),
            (Intrinsic::IsNaN, [x]) => Expr::create_not(Expr::equals(x.clone(), x.clone())),
            (Intrinsic::Sqrt, [x]) => {
                let ty = instruction.ty().cloned().unwrap_or_else(|| x.ty());
                Self::builtin_call(builtin::SQRT, values.clone(), ty)?
            }
            (Intrinsic::Real | Intrinsic::Imag, [c]) => {
                let ty = match instruction.ty() {
                    Some(ty) => ty.clone(),
                    None => c
                        .ty()
                        .complex_component()
                        .ok_or_else(|| malformed_error!("Projection of non-complex {}", c))?,
                };
                let signature = if intrinsic == Intrinsic::Real {
                    builtin::REAL
                } else {
                    builtin::IMAG
                };
                Self::builtin_call(signature, values.clone(), ty)?
            }
            (Intrinsic::Complex, [re, _]) => {
                let ty = match instruction.ty() {
                    Some(ty) => ty.clone(),
                    None if re.ty() == Type::Float32 => Type::Complex64,
                    None => Type::Complex128,
                };
                Self::builtin_call(builtin::COMPLEX, values.clone(), ty)?
            }
            (Intrinsic::Symbolic, []) => {
                let ty = instruction
                    .ty()
                    .ok_or_else(|| malformed_error!("symbolic() without a result type"))?
                    .clone();
                let id = i64::try_from(state.fresh_id()).unwrap_or(i64::MAX);
                Expr::call(builtin::FRESH, vec![Expr::int(id)], ty)
            }
            (Intrinsic::Assume, [predicate]) => {
                state.constrain(predicate.clone());
                let frame = state.current_frame_mut()?;
                frame.advance();
                return if self.is_feasible(&state, session)? {
                    Ok(vec![state])
                } else {
                    log::debug!("Assumption {} is infeasible", predicate);
                    Ok(Vec::new())
                };
            }
            (intrinsic, values) => {
                return Err(malformed_error!(
                    "Intrinsic {} called with {} arguments",
                    intrinsic.name(),
                    values.len()
                ))
            }
        };

        let frame = state.current_frame_mut()?;
        if let Some(dest) = instruction.dest() {
            frame.define(dest, Value::Expr(result));
        }
        frame.advance();
        Ok(vec![state])
    }

    /// Applies an interpreted built-in, folding literal arguments.
    fn builtin_call(signature: &str, args: Vec<Expr>, ty: Type) -> Result<Expr> {
        let literals: Option<Vec<Concrete>> = args.iter().map(Concrete::from_expr).collect();
        match literals {
            Some(literals) => Ok(eval::apply_builtin(signature, &literals, &ty)?.to_expr()),
            None => Ok(Expr::call(signature, args, ty)),
        }
    }
}
