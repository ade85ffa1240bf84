//! Instructions of the input graph.
//!
//! The instruction set mirrors what a Go-style SSA front-end emits for
//! numeric, array, struct and pointer code. Instructions that the engine does
//! not model are still representable ([`InstructionKind::Panic`],
//! [`InstructionKind::Unsupported`]) so that reaching them fails loudly
//! instead of being skipped.

use std::fmt;

use strum::IntoStaticStr;

use crate::ir::{BlockId, Operand, Type, ValueId};

/// Binary operators, including comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum BinaryOperator {
    /// `+`
    #[strum(serialize = "+")]
    Add,
    /// `-`
    #[strum(serialize = "-")]
    Sub,
    /// `*`
    #[strum(serialize = "*")]
    Mul,
    /// `/`
    #[strum(serialize = "/")]
    Div,
    /// `%`
    #[strum(serialize = "%")]
    Rem,
    /// `&`
    #[strum(serialize = "&")]
    And,
    /// `|`
    #[strum(serialize = "|")]
    Or,
    /// `^`
    #[strum(serialize = "^")]
    Xor,
    /// `&^` (bit clear)
    #[strum(serialize = "&^")]
    AndNot,
    /// `<<`
    #[strum(serialize = "<<")]
    Shl,
    /// `>>`, arithmetic for signed operands and logical for unsigned ones
    #[strum(serialize = ">>")]
    Shr,
    /// `==`
    #[strum(serialize = "==")]
    Eq,
    /// `!=`
    #[strum(serialize = "!=")]
    Ne,
    /// `<`
    #[strum(serialize = "<")]
    Lt,
    /// `<=`
    #[strum(serialize = "<=")]
    Le,
    /// `>`
    #[strum(serialize = ">")]
    Gt,
    /// `>=`
    #[strum(serialize = ">=")]
    Ge,
}

impl BinaryOperator {
    /// Returns `true` for the six comparison operators.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
        )
    }

    /// Returns the source token, e.g. `&^`.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        self.into()
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum UnaryOperator {
    /// Logical negation `!`
    #[strum(serialize = "!")]
    Not,
    /// Arithmetic negation `-`
    #[strum(serialize = "-")]
    Neg,
    /// Bitwise complement `^`
    #[strum(serialize = "^")]
    Complement,
    /// Pointer load `*`
    #[strum(serialize = "*")]
    Deref,
}

/// Built-in functions with a dedicated symbolic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum Intrinsic {
    /// Length of a slice or array
    #[strum(serialize = "len")]
    Len,
    /// Square root of a float
    #[strum(serialize = "sqrt")]
    Sqrt,
    /// NaN test of a float
    #[strum(serialize = "isNaN")]
    IsNaN,
    /// Fresh unconstrained value of the instruction's result type
    #[strum(serialize = "symbolic")]
    Symbolic,
    /// Conjoins the boolean argument onto the path condition
    #[strum(serialize = "assume")]
    Assume,
    /// Real part of a complex value
    #[strum(serialize = "real")]
    Real,
    /// Imaginary part of a complex value
    #[strum(serialize = "imag")]
    Imag,
    /// Builds a complex value from its real and imaginary parts
    #[strum(serialize = "complex")]
    Complex,
}

impl Intrinsic {
    /// Returns the intrinsic's source name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// The target of a call instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Callee {
    /// A built-in with a dedicated rule
    Intrinsic(Intrinsic),
    /// A free function declared in the program
    Function(String),
    /// A method declared in the program, looked up by (declaring type, name)
    Method {
        /// Declaring type name
        receiver: String,
        /// Method name
        name: String,
    },
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callee::Intrinsic(intrinsic) => write!(f, "builtin {}", intrinsic.name()),
            Callee::Function(name) => write!(f, "{name}"),
            Callee::Method { receiver, name } => write!(f, "({receiver}).{name}"),
        }
    }
}

/// The operation performed by an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    /// Binary arithmetic, bitwise, shift or comparison
    BinOp {
        /// Operator
        op: BinaryOperator,
        /// Left operand
        left: Operand,
        /// Right operand
        right: Operand,
    },
    /// Unary operation; `Deref` loads through a pointer
    UnOp {
        /// Operator
        op: UnaryOperator,
        /// Operand
        operand: Operand,
    },
    /// Numeric conversion to the instruction's result type
    Convert {
        /// Converted value
        value: Operand,
    },
    /// Type change without representation change
    ChangeType {
        /// Retyped value
        value: Operand,
    },
    /// Call of an intrinsic, free function or method
    Call {
        /// Call target
        callee: Callee,
        /// Arguments; the receiver comes first for methods
        args: Vec<Operand>,
    },
    /// Allocation of a zero-valued cell of the given type, yielding a pointer
    Alloc {
        /// Allocated type
        ty: Type,
    },
    /// Allocation of a slice with the given element type and length
    MakeSlice {
        /// Element type
        elem: Type,
        /// Length
        len: Operand,
    },
    /// Address of a struct field through a pointer
    FieldAddr {
        /// Pointer to the struct
        base: Operand,
        /// Field index
        field: usize,
    },
    /// Read of a struct field from a struct value
    Field {
        /// Struct value
        base: Operand,
        /// Field index
        field: usize,
    },
    /// Address of a slice or array element
    IndexAddr {
        /// Slice, array, or pointer to array
        base: Operand,
        /// Element index
        index: Operand,
    },
    /// Read of an element from an array value
    Index {
        /// Array value
        base: Operand,
        /// Element index
        index: Operand,
    },
    /// Store through an address
    Store {
        /// Address produced by `Alloc`, `FieldAddr` or `IndexAddr`
        addr: Operand,
        /// Stored value
        value: Operand,
    },
    /// Unconditional jump
    Jump {
        /// Destination block
        target: BlockId,
    },
    /// Two-way conditional branch
    If {
        /// Boolean condition
        cond: Operand,
        /// Destination when the condition holds
        then_block: BlockId,
        /// Destination when it does not
        else_block: BlockId,
    },
    /// Function return
    Return {
        /// Returned value, absent for functions without a result
        value: Option<Operand>,
    },
    /// Explicit panic; fatal when reached
    Panic {
        /// Panic argument
        value: Operand,
    },
    /// Any front-end construct without an engine rule; fatal when reached
    Unsupported {
        /// Front-end name of the construct, e.g. `MakeChan`
        name: String,
    },
}

impl InstructionKind {
    /// Returns `true` for block terminators.
    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstructionKind::Jump { .. }
                | InstructionKind::If { .. }
                | InstructionKind::Return { .. }
                | InstructionKind::Panic { .. }
        )
    }

    /// Returns `true` for instructions without side effects.
    ///
    /// Pure instructions are evaluated lazily, on first use of their result,
    /// instead of when the cursor passes over them.
    #[must_use]
    pub fn is_pure(&self) -> bool {
        matches!(
            self,
            InstructionKind::BinOp { .. }
                | InstructionKind::Convert { .. }
                | InstructionKind::ChangeType { .. }
                | InstructionKind::FieldAddr { .. }
                | InstructionKind::IndexAddr { .. }
        ) || matches!(
            self,
            InstructionKind::UnOp { op, .. } if !matches!(op, UnaryOperator::Deref)
        )
    }
}

/// One instruction with its optional result.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The value defined by this instruction, if any.
    dest: Option<ValueId>,
    /// Static type of the result; `None` for instructions without one.
    ty: Option<Type>,
    /// The operation.
    kind: InstructionKind,
}

impl Instruction {
    /// Creates an instruction defining `dest` of type `ty`.
    #[must_use]
    pub fn new(dest: Option<ValueId>, ty: Option<Type>, kind: InstructionKind) -> Self {
        Instruction { dest, ty, kind }
    }

    /// Creates an instruction without a result.
    #[must_use]
    pub fn effect(kind: InstructionKind) -> Self {
        Instruction {
            dest: None,
            ty: None,
            kind,
        }
    }

    /// Returns the defined value.
    #[must_use]
    pub const fn dest(&self) -> Option<ValueId> {
        self.dest
    }

    /// Returns the result type.
    #[must_use]
    pub const fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    /// Returns the operation.
    #[must_use]
    pub const fn kind(&self) -> &InstructionKind {
        &self.kind
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dest) = self.dest {
            write!(f, "{dest} = ")?;
        }
        match &self.kind {
            InstructionKind::BinOp { op, left, right } => {
                write!(f, "{left} {} {right}", op.symbol())
            }
            InstructionKind::UnOp { op, operand } => {
                let symbol: &'static str = op.into();
                write!(f, "{symbol}{operand}")
            }
            InstructionKind::Convert { value } => match &self.ty {
                Some(ty) => write!(f, "convert {ty} <- {value}"),
                None => write!(f, "convert {value}"),
            },
            InstructionKind::ChangeType { value } => write!(f, "changetype {value}"),
            InstructionKind::Call { callee, args } => {
                write!(f, "{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            InstructionKind::Alloc { ty } => write!(f, "new {ty}"),
            InstructionKind::MakeSlice { elem, len } => write!(f, "make []{elem} {len}"),
            InstructionKind::FieldAddr { base, field } => write!(f, "&{base}.#{field}"),
            InstructionKind::Field { base, field } => write!(f, "{base}.#{field}"),
            InstructionKind::IndexAddr { base, index } => write!(f, "&{base}[{index}]"),
            InstructionKind::Index { base, index } => write!(f, "{base}[{index}]"),
            InstructionKind::Store { addr, value } => write!(f, "*{addr} = {value}"),
            InstructionKind::Jump { target } => write!(f, "jump B{target}"),
            InstructionKind::If {
                cond,
                then_block,
                else_block,
            } => write!(f, "if {cond} goto B{then_block} else B{else_block}"),
            InstructionKind::Return { value: Some(value) } => write!(f, "return {value}"),
            InstructionKind::Return { value: None } => write!(f, "return"),
            InstructionKind::Panic { value } => write!(f, "panic {value}"),
            InstructionKind::Unsupported { name } => write!(f, "<{name}>"),
        }
    }
}
