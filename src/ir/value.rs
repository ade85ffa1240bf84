//! Value identifiers, constants and instruction operands.

use std::fmt;

use crate::ir::{IntKind, Type};

/// Index of a basic block within its function. Block 0 is the entry block.
pub type BlockId = usize;

/// Identifier of an SSA value: a parameter, an instruction result, or a phi result.
///
/// Value ids are unique within one function and are the keys of a frame's
/// memoized memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u32);

impl ValueId {
    /// Creates a value id from its raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        ValueId(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A typed constant appearing as an operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Boolean constant
    Bool(bool),
    /// Integer constant; the value is normalized to the kind's width
    Int {
        /// Canonical bit pattern, see [`IntKind::wrap`]
        value: i64,
        /// Integer kind
        kind: IntKind,
    },
    /// binary32 constant
    Float32(f32),
    /// binary64 constant
    Float64(f64),
    /// Complex constant
    Complex {
        /// Real part
        re: f64,
        /// Imaginary part
        im: f64,
        /// `Complex64` or `Complex128`
        ty: Type,
    },
}

impl Constant {
    /// Creates a machine-width `int` constant.
    #[must_use]
    pub const fn int(value: i64) -> Self {
        Constant::Int {
            value,
            kind: IntKind::Int,
        }
    }

    /// Creates an integer constant of the given kind, wrapping to its width.
    #[must_use]
    pub const fn typed_int(value: i64, kind: IntKind) -> Self {
        Constant::Int {
            value: kind.wrap(value),
            kind,
        }
    }

    /// Creates a `complex128` constant.
    #[must_use]
    pub const fn complex128(re: f64, im: f64) -> Self {
        Constant::Complex {
            re,
            im,
            ty: Type::Complex128,
        }
    }

    /// Returns the static type of the constant.
    #[must_use]
    pub fn ty(&self) -> Type {
        match self {
            Constant::Bool(_) => Type::Bool,
            Constant::Int { kind, .. } => Type::Int(*kind),
            Constant::Float32(_) => Type::Float32,
            Constant::Float64(_) => Type::Float64,
            Constant::Complex { ty, .. } => ty.clone(),
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Int { value, kind } if kind.is_signed() => write!(f, "{value}:{}", kind.name()),
            #[allow(clippy::cast_sign_loss)]
            Constant::Int { value, kind } => write!(f, "{}:{}", *value as u64, kind.name()),
            Constant::Float32(v) => write!(f, "{v}:float32"),
            Constant::Float64(v) => write!(f, "{v}:float64"),
            Constant::Complex { re, im, ty } => write!(f, "({re}+{im}i):{ty}"),
        }
    }
}

/// An instruction operand: either a value defined in the function or a constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Reference to a parameter, instruction result or phi result
    Value(ValueId),
    /// Inline constant
    Const(Constant),
}

impl From<ValueId> for Operand {
    fn from(value: ValueId) -> Self {
        Operand::Value(value)
    }
}

impl From<Constant> for Operand {
    fn from(value: Constant) -> Self {
        Operand::Const(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(id) => write!(f, "{id}"),
            Operand::Const(c) => write!(f, "{c}"),
        }
    }
}
