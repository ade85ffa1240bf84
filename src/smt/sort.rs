//! Mapping from static types to solver sorts.

use std::fmt;

use crate::{ir::Type, Result};

/// Width of handle bitvectors.
pub const HANDLE_WIDTH: u32 = 64;

/// A solver sort.
///
/// Complex types have no sort of their own; they are encoded as a pair of
/// values of their component's float sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SmtSort {
    /// Boolean
    Bool,
    /// Bitvector of the given width
    BitVec(u32),
    /// IEEE float with exponent and significand widths
    Float {
        /// Exponent bits
        ebits: u32,
        /// Significand bits, including the hidden bit
        sbits: u32,
    },
    /// Array from the first sort to the second
    Array(Box<SmtSort>, Box<SmtSort>),
}

impl SmtSort {
    /// binary32
    pub const FLOAT32: SmtSort = SmtSort::Float { ebits: 8, sbits: 24 };
    /// binary64
    pub const FLOAT64: SmtSort = SmtSort::Float {
        ebits: 11,
        sbits: 53,
    };
    /// Heap handles and machine-width integers
    pub const HANDLE: SmtSort = SmtSort::BitVec(HANDLE_WIDTH);

    /// Returns the sort of a non-complex type.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unsupported`] for complex types.
    pub fn of(ty: &Type) -> Result<SmtSort> {
        match ty {
            Type::Bool => Ok(SmtSort::Bool),
            Type::Int(kind) => Ok(SmtSort::BitVec(kind.bits())),
            Type::Float32 => Ok(Self::FLOAT32),
            Type::Float64 => Ok(Self::FLOAT64),
            Type::Complex64 | Type::Complex128 => Err(unsupported_error!(
                "Type {} has no single sort",
                ty
            )),
            Type::Pointer(_) | Type::Slice(_) | Type::Array(_, _) | Type::Named(_) => {
                Ok(Self::HANDLE)
            }
        }
    }

    /// Returns the sorts a value of `ty` is encoded as: one, or two for complex types.
    ///
    /// # Errors
    ///
    /// Never fails for well-formed types; the signature mirrors [`SmtSort::of`].
    pub fn components(ty: &Type) -> Result<Vec<SmtSort>> {
        match ty.complex_component() {
            Some(component) => {
                let sort = Self::of(&component)?;
                Ok(vec![sort.clone(), sort])
            }
            None => Ok(vec![Self::of(ty)?]),
        }
    }

    /// Creates an array sort keyed by handles.
    #[must_use]
    pub fn handle_array(range: SmtSort) -> SmtSort {
        SmtSort::Array(Box::new(Self::HANDLE), Box::new(range))
    }

    /// Builds the solver sort.
    #[must_use]
    pub fn to_z3(&self) -> z3::Sort {
        match self {
            SmtSort::Bool => z3::Sort::bool(),
            SmtSort::BitVec(width) => z3::Sort::bitvector(*width),
            SmtSort::Float { ebits, sbits } => z3::Sort::float(*ebits, *sbits),
            SmtSort::Array(domain, range) => z3::Sort::array(&domain.to_z3(), &range.to_z3()),
        }
    }
}

impl fmt::Display for SmtSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmtSort::Bool => write!(f, "Bool"),
            SmtSort::BitVec(width) => write!(f, "BV{width}"),
            SmtSort::Float { ebits, sbits } => write!(f, "FP{ebits}.{sbits}"),
            SmtSort::Array(domain, range) => write!(f, "Array[{domain} -> {range}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IntKind;

    #[test]
    fn test_sort_dispatch() -> Result<()> {
        assert_eq!(SmtSort::of(&Type::Bool)?, SmtSort::Bool);
        assert_eq!(SmtSort::of(&Type::Int(IntKind::U16))?, SmtSort::BitVec(16));
        assert_eq!(SmtSort::of(&Type::INT)?, SmtSort::BitVec(64));
        assert_eq!(SmtSort::of(&Type::Float32)?, SmtSort::FLOAT32);
        assert_eq!(SmtSort::of(&Type::slice(Type::Bool))?, SmtSort::HANDLE);
        assert!(SmtSort::of(&Type::Complex128).is_err());
        assert_eq!(
            SmtSort::components(&Type::Complex64)?,
            vec![SmtSort::FLOAT32, SmtSort::FLOAT32]
        );
        Ok(())
    }
}
