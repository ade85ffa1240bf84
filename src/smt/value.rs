//! Solver values produced by the encoder.

use z3::{
    ast::{Array, Ast, Bool, Dynamic, Float, BV},
    SortKind,
};

use crate::{ir::Type, Result};

/// One solver term of a known sort class.
#[derive(Debug, Clone)]
pub enum SmtValue {
    /// Boolean term
    Bool(Bool),
    /// Bitvector term
    BV(BV),
    /// Floating-point term
    Float(Float),
    /// Array term
    Array(Array),
}

impl SmtValue {
    /// Classifies a dynamically sorted term, e.g. the result of `select`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SortMismatch`] for sorts the encoder never produces.
    pub fn from_dynamic(value: &Dynamic) -> Result<SmtValue> {
        let converted = match value.sort_kind() {
            SortKind::Bool => value.as_bool().map(SmtValue::Bool),
            SortKind::BV => value.as_bv().map(SmtValue::BV),
            SortKind::FloatingPoint => value.as_float().map(SmtValue::Float),
            SortKind::Array => value.as_array().map(SmtValue::Array),
            _ => None,
        };
        converted.ok_or_else(|| sort_mismatch!("Unexpected solver sort of {}", value))
    }

    /// Returns the term as a dynamically sorted AST.
    #[must_use]
    pub fn to_dynamic(&self) -> Dynamic {
        match self {
            SmtValue::Bool(v) => Dynamic::from_ast(v),
            SmtValue::BV(v) => Dynamic::from_ast(v),
            SmtValue::Float(v) => Dynamic::from_ast(v),
            SmtValue::Array(v) => Dynamic::from_ast(v),
        }
    }

    /// Returns a name for the sort class, for diagnostics.
    #[must_use]
    pub const fn sort_name(&self) -> &'static str {
        match self {
            SmtValue::Bool(_) => "Bool",
            SmtValue::BV(_) => "BV",
            SmtValue::Float(_) => "Float",
            SmtValue::Array(_) => "Array",
        }
    }

    /// Returns the boolean term.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SortMismatch`] for other sorts.
    pub fn as_bool(&self) -> Result<&Bool> {
        match self {
            SmtValue::Bool(v) => Ok(v),
            other => Err(sort_mismatch!("Expected Bool, found {}", other.sort_name())),
        }
    }

    /// Returns the bitvector term.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SortMismatch`] for other sorts.
    pub fn as_bv(&self) -> Result<&BV> {
        match self {
            SmtValue::BV(v) => Ok(v),
            other => Err(sort_mismatch!("Expected BV, found {}", other.sort_name())),
        }
    }

    /// Returns the float term.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SortMismatch`] for other sorts.
    pub fn as_float(&self) -> Result<&Float> {
        match self {
            SmtValue::Float(v) => Ok(v),
            other => Err(sort_mismatch!("Expected Float, found {}", other.sort_name())),
        }
    }

    /// Returns the array term.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SortMismatch`] for other sorts.
    pub fn as_array(&self) -> Result<&Array> {
        match self {
            SmtValue::Array(v) => Ok(v),
            other => Err(sort_mismatch!("Expected Array, found {}", other.sort_name())),
        }
    }

    /// Structural equality: the terms denote the same value of the sort.
    ///
    /// For floats this is not IEEE equality: `NaN` equals `NaN` and `+0`
    /// differs from `-0`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SortMismatch`] if the sort classes differ.
    pub fn same_as(&self, other: &SmtValue) -> Result<Bool> {
        match (self, other) {
            (SmtValue::Bool(a), SmtValue::Bool(b)) => Ok(a.eq(b)),
            (SmtValue::BV(a), SmtValue::BV(b)) => Ok(a.eq(b)),
            (SmtValue::Float(a), SmtValue::Float(b)) => Ok(a.eq(b)),
            (SmtValue::Array(a), SmtValue::Array(b)) => Ok(a.eq(b)),
            (a, b) => Err(sort_mismatch!(
                "Cannot compare {} with {}",
                a.sort_name(),
                b.sort_name()
            )),
        }
    }
}

/// The encoding of one expression: a single term, or a complex pair.
#[derive(Debug, Clone)]
pub enum Encoded {
    /// Any non-complex value
    Value(SmtValue),
    /// Real and imaginary component
    Complex(Float, Float),
}

impl Encoded {
    /// Returns the single term.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SortMismatch`] for complex pairs.
    pub fn single(&self) -> Result<&SmtValue> {
        match self {
            Encoded::Value(v) => Ok(v),
            Encoded::Complex(..) => {
                Err(sort_mismatch!("Expected a single term, found {}", "a complex pair"))
            }
        }
    }

    /// Returns the components, promoting a single float to `(x, 0)`.
    ///
    /// # Arguments
    ///
    /// * `component` - The float type of a component, used for the zero
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SortMismatch`] for non-float single terms.
    pub fn complex_parts(&self, component: &Type) -> Result<(Float, Float)> {
        match self {
            Encoded::Complex(re, im) => Ok((re.clone(), im.clone())),
            Encoded::Value(SmtValue::Float(re)) => {
                let zero = match component {
                    Type::Float32 => Float::from_f32(0.0),
                    _ => Float::from_f64(0.0),
                };
                Ok((re.clone(), zero))
            }
            Encoded::Value(other) => Err(sort_mismatch!(
                "Expected a complex or float term, found {}",
                other.sort_name()
            )),
        }
    }

    /// Flattens into the list of terms.
    #[must_use]
    pub fn into_values(self) -> Vec<SmtValue> {
        match self {
            Encoded::Value(v) => vec![v],
            Encoded::Complex(re, im) => vec![SmtValue::Float(re), SmtValue::Float(im)],
        }
    }
}
