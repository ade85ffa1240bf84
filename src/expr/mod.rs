//! Symbolic expressions.
//!
//! Expressions are immutable, hash-consed trees: building the same structure
//! twice yields the same [`Expr`] node, so equality is identity and identical
//! subterms are shared across states, paths and frames. Path conditions,
//! memoized register values and heap contents are all expressions.
//!
//! # Key Components
//!
//! - [`Expr`] / [`ExprKind`] - Canonical nodes and their variants
//! - [`BinaryOp`] / [`CompareOp`] - Operators, with comparisons reduced to `<`, `>`, `==`
//! - [`Expr::create_and`], [`Expr::create_or`], [`Expr::create_not`],
//!   [`Expr::create_add`], [`Expr::create_cast`] - Folding constructors
//! - [`eval`] - Concrete evaluation under input bindings
//!
//! # Examples
//!
//! ```rust
//! use pathscope::expr::Expr;
//! use pathscope::ir::Type;
//!
//! let a = Expr::input("a", Type::INT);
//! let b = Expr::input("b", Type::INT);
//! let cond = Expr::gt(a.clone(), b.clone());
//!
//! assert_eq!(cond, Expr::gt(a, b));
//! assert_eq!(Expr::create_and(cond.clone(), Expr::boolean(true)), cond);
//! ```

pub mod eval;
mod node;
mod ops;

pub use eval::{Bindings, Concrete};
pub use node::{Expr, ExprKind, Literal, RegionKind};
pub use ops::{BinaryOp, CompareOp};

/// Signatures of the built-in functions that appear as
/// [`ExprKind::FunctionCall`] nodes.
///
/// `real`, `imag` and `complex` are interpreted by the encoder; the others
/// are uninterpreted functions.
pub mod builtin {
    /// Length of a slice without a recorded length
    pub const LEN: &str = "builtin_len";
    /// Square root
    pub const SQRT: &str = "builtin_sqrt";
    /// Real part of a complex value
    pub const REAL: &str = "builtin_real";
    /// Imaginary part of a complex value
    pub const IMAG: &str = "builtin_imag";
    /// Complex value from two floats
    pub const COMPLEX: &str = "builtin_complex";
    /// Fresh value minted by the interpreter, applied to a unique id
    pub const FRESH: &str = "builtin_fresh";
}
