//! Operators of symbolic expressions.
//!
//! Comparisons are deliberately reduced to three primitives. The other three
//! source comparisons are lowered when expressions are built:
//!
//! | Source | Expression |
//! |--------|------------|
//! | `a != b` | `Not(Equals(a, b))` |
//! | `a <= b` | `Or(LT(a, b), Equals(a, b))` |
//! | `a >= b` | `Or(GT(a, b), Equals(a, b))` |

use strum::{EnumIter, IntoStaticStr};

/// Arithmetic, bitwise, logical and shift operators.
///
/// `And`/`Or`/`Xor` act as logical operators when both operands are boolean
/// and as bitwise operators on integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum BinaryOp {
    /// Addition
    #[strum(serialize = "+")]
    Add,
    /// Subtraction
    #[strum(serialize = "-")]
    Sub,
    /// Multiplication
    #[strum(serialize = "*")]
    Mul,
    /// Division, signed or unsigned by operand type
    #[strum(serialize = "/")]
    Div,
    /// Remainder, signed or unsigned by operand type
    #[strum(serialize = "%")]
    Rem,
    /// Conjunction / bitwise and
    #[strum(serialize = "&")]
    And,
    /// Disjunction / bitwise or
    #[strum(serialize = "|")]
    Or,
    /// Exclusive or
    #[strum(serialize = "^")]
    Xor,
    /// Bit clear, `a & !b`
    #[strum(serialize = "&^")]
    AndNot,
    /// Left shift
    #[strum(serialize = "<<")]
    Shl,
    /// Right shift, arithmetic for signed operands
    #[strum(serialize = ">>")]
    Shr,
}

impl BinaryOp {
    /// Returns the operator token.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        self.into()
    }

    /// Returns `true` if `a op b == b op a` for every operand pair.
    #[must_use]
    pub const fn is_commutative(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Mul | BinaryOp::And | BinaryOp::Or | BinaryOp::Xor
        )
    }
}

/// Primitive comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum CompareOp {
    /// Less than, signed or unsigned by operand type
    #[strum(serialize = "<")]
    Lt,
    /// Greater than, signed or unsigned by operand type
    #[strum(serialize = ">")]
    Gt,
    /// Equality; IEEE equality for floats
    #[strum(serialize = "==")]
    Equals,
}

impl CompareOp {
    /// Returns the operator token.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        self.into()
    }
}
