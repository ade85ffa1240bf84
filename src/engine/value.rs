//! Values held in a frame's memory.

use std::fmt;

use crate::{expr::Expr, Result};

/// A storage location computed by an address instruction.
///
/// Pointers minted by allocation are ordinary handle expressions. Addresses
/// of struct fields and sequence elements have no handle of their own and
/// stay structural until they are loaded from or stored to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// `&receiver.field`
    Field {
        /// Struct handle
        receiver: Expr,
        /// Struct type name
        owner: String,
        /// Field index
        field: usize,
    },
    /// `&array[index]`
    Element {
        /// Slice or array handle
        array: Expr,
        /// Element index
        index: Expr,
    },
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Field {
                receiver,
                owner,
                field,
            } => write!(f, "&({owner}){receiver}.#{field}"),
            Address::Element { array, index } => write!(f, "&{array}[{index}]"),
        }
    }
}

/// The resolved value of an SSA value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A symbolic expression
    Expr(Expr),
    /// A structural address
    Address(Address),
}

impl Value {
    /// Returns the expression.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unsupported`] for addresses, which have no
    /// expression form.
    pub fn expr(&self) -> Result<&Expr> {
        match self {
            Value::Expr(expr) => Ok(expr),
            Value::Address(address) => Err(unsupported_error!(
                "Address {} used as a value",
                address
            )),
        }
    }

    /// Consumes the value and returns the expression.
    ///
    /// # Errors
    ///
    /// See [`Value::expr`].
    pub fn into_expr(self) -> Result<Expr> {
        match self {
            Value::Expr(expr) => Ok(expr),
            Value::Address(address) => Err(unsupported_error!(
                "Address {} used as a value",
                address
            )),
        }
    }
}

impl From<Expr> for Value {
    fn from(expr: Expr) -> Self {
        Value::Expr(expr)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Expr(expr) => write!(f, "{expr}"),
            Value::Address(address) => write!(f, "{address}"),
        }
    }
}
