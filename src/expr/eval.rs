//! Concrete evaluation of expressions.
//!
//! The evaluator gives every operator the same semantics the solver encoding
//! gives it: integers wrap at their kind's width, shifts saturate, division
//! is signed or unsigned by kind, and floats follow IEEE-754. It powers
//! literal folding in the expression constructors and lets callers replay a
//! generated test input against a symbolic result.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::{
    expr::{builtin, BinaryOp, CompareOp, Expr, ExprKind, Literal},
    ir::{IntKind, Type},
    Result,
};

/// Concrete values of inputs, by input name.
pub type Bindings = FxHashMap<String, Concrete>;

/// A concrete value.
#[derive(Debug, Clone, PartialEq)]
pub enum Concrete {
    /// Boolean
    Bool(bool),
    /// Integer, normalized to the kind's width
    Int {
        /// Canonical bit pattern, see [`IntKind::wrap`]
        value: i64,
        /// Integer kind
        kind: IntKind,
    },
    /// binary32
    Float32(f32),
    /// binary64
    Float64(f64),
    /// `complex64`
    Complex64 {
        /// Real part
        re: f32,
        /// Imaginary part
        im: f32,
    },
    /// `complex128`
    Complex128 {
        /// Real part
        re: f64,
        /// Imaginary part
        im: f64,
    },
    /// Opaque heap handle as chosen by a model
    Handle(u64),
}

impl Concrete {
    /// Creates a machine-width `int`.
    #[must_use]
    pub const fn int(value: i64) -> Self {
        Concrete::Int {
            value,
            kind: IntKind::Int,
        }
    }

    /// Creates an integer of the given kind, wrapping to its width.
    #[must_use]
    pub const fn typed_int(value: i64, kind: IntKind) -> Self {
        Concrete::Int {
            value: kind.wrap(value),
            kind,
        }
    }

    /// Creates a complex value of the given complex type.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn complex(re: f64, im: f64, ty: &Type) -> Self {
        match ty {
            Type::Complex64 => Concrete::Complex64 {
                re: re as f32,
                im: im as f32,
            },
            _ => Concrete::Complex128 { re, im },
        }
    }

    /// Creates a float of the given float type.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(value: f64, ty: &Type) -> Self {
        match ty {
            Type::Float32 => Concrete::Float32(value as f32),
            _ => Concrete::Float64(value),
        }
    }

    /// Reads a literal expression.
    #[must_use]
    pub fn from_expr(expr: &Expr) -> Option<Concrete> {
        match expr.kind() {
            ExprKind::Literal(literal) => Some(match *literal {
                Literal::Bool(b) => Concrete::Bool(b),
                Literal::Int { value, kind } => Concrete::Int { value, kind },
                Literal::Float32(bits) => Concrete::Float32(f32::from_bits(bits)),
                Literal::Float64(bits) => Concrete::Float64(f64::from_bits(bits)),
            }),
            ExprKind::ComplexLiteral { re, im, ty } => Some(Concrete::complex(
                f64::from_bits(*re),
                f64::from_bits(*im),
                ty,
            )),
            _ => None,
        }
    }

    /// Converts the value back into a literal expression.
    ///
    /// Handles have no literal form and become `uintptr` literals.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn to_expr(&self) -> Expr {
        match self {
            Concrete::Bool(b) => Expr::boolean(*b),
            Concrete::Int { value, kind } => Expr::typed_int(*value, *kind),
            Concrete::Float32(v) => Expr::float32(*v),
            Concrete::Float64(v) => Expr::float64(*v),
            Concrete::Complex64 { re, im } => {
                Expr::complex(f64::from(*re), f64::from(*im), Type::Complex64)
            }
            Concrete::Complex128 { re, im } => Expr::complex(*re, *im, Type::Complex128),
            Concrete::Handle(h) => Expr::typed_int(*h as i64, IntKind::Uintptr),
        }
    }

    /// Returns the boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Concrete::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the canonical integer value.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Concrete::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Returns a float value widened to binary64.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Concrete::Float32(v) => Some(f64::from(*v)),
            Concrete::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns both components of a complex value widened to binary64.
    #[must_use]
    pub fn as_complex(&self) -> Option<(f64, f64)> {
        match self {
            Concrete::Complex64 { re, im } => Some((f64::from(*re), f64::from(*im))),
            Concrete::Complex128 { re, im } => Some((*re, *im)),
            _ => None,
        }
    }
}

impl fmt::Display for Concrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concrete::Bool(b) => write!(f, "{b}"),
            Concrete::Int { value, kind } if kind.is_signed() => write!(f, "{value}"),
            #[allow(clippy::cast_sign_loss)]
            Concrete::Int { value, .. } => write!(f, "{}", *value as u64),
            Concrete::Float32(v) => write!(f, "{v}"),
            Concrete::Float64(v) => write!(f, "{v}"),
            Concrete::Complex64 { re, im } => write!(f, "({re}+{im}i)"),
            Concrete::Complex128 { re, im } => write!(f, "({re}+{im}i)"),
            Concrete::Handle(h) => write!(f, "#{h:x}"),
        }
    }
}

/// Evaluates `expr` under concrete input bindings.
///
/// # Arguments
///
/// * `expr` - The expression to evaluate
/// * `bindings` - A value for every input the expression mentions
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] for unbound inputs and operand type
/// mismatches, and [`crate::Error::Unsupported`] for heap reads, uninterpreted
/// functions and integer division by zero.
pub fn evaluate(expr: &Expr, bindings: &Bindings) -> Result<Concrete> {
    match expr.kind() {
        ExprKind::Literal(_) | ExprKind::ComplexLiteral { .. } => Concrete::from_expr(expr)
            .ok_or_else(|| malformed_error!("Literal {} has no concrete value", expr)),
        ExprKind::InputValue { name, .. } => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| malformed_error!("No binding for input {}", name)),
        ExprKind::Binary { op, left, right } => {
            apply_binary(*op, &evaluate(left, bindings)?, &evaluate(right, bindings)?)
        }
        ExprKind::Compare { op, left, right } => {
            apply_compare(*op, &evaluate(left, bindings)?, &evaluate(right, bindings)?)
        }
        ExprKind::Not(operand) => apply_not(&evaluate(operand, bindings)?),
        ExprKind::Cast { value, to } => apply_cast(&evaluate(value, bindings)?, to),
        ExprKind::FunctionCall {
            signature,
            args,
            result,
        } => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, bindings))
                .collect::<Result<Vec<_>>>()?;
            apply_builtin(signature, &values, result)
        }
        ExprKind::Conditional(options) => {
            for (guard, value) in options {
                if evaluate(guard, bindings)?.as_bool() == Some(true) {
                    return evaluate(value, bindings);
                }
            }
            Err(malformed_error!("No guard of {} holds", expr))
        }
        ExprKind::Array { .. } | ExprKind::ArrayAccess { .. } | ExprKind::Ref { .. } => Err(
            unsupported_error!("Concrete evaluation of heap expression {}", expr),
        ),
    }
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
fn shift_count(value: &Concrete) -> Result<u64> {
    match value {
        Concrete::Int { value, kind } if kind.is_signed() && *value < 0 => {
            Err(unsupported_error!("Negative shift count {}", value))
        }
        Concrete::Int { value, .. } => Ok(*value as u64),
        other => Err(malformed_error!("Shift count {} is not an integer", other)),
    }
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
fn int_binary(op: BinaryOp, a: i64, b: i64, kind: IntKind) -> Result<i64> {
    let signed = kind.is_signed();
    let raw = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => {
            return Err(unsupported_error!("Integer division by zero"));
        }
        BinaryOp::Div if signed => a.wrapping_div(b),
        BinaryOp::Div => ((a as u64) / (b as u64)) as i64,
        BinaryOp::Rem if signed => a.wrapping_rem(b),
        BinaryOp::Rem => ((a as u64) % (b as u64)) as i64,
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
        BinaryOp::AndNot => a & !b,
        BinaryOp::Shl | BinaryOp::Shr => {
            return Err(malformed_error!("Shift {} has no count", op.symbol()));
        }
    };
    Ok(kind.wrap(raw))
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
fn int_shift(op: BinaryOp, a: i64, count: u64, kind: IntKind) -> i64 {
    let bits = u64::from(kind.bits());
    if count >= bits {
        return match op {
            BinaryOp::Shr if kind.is_signed() && a < 0 => -1,
            _ => 0,
        };
    }
    match op {
        BinaryOp::Shl => kind.wrap(a << count),
        _ if kind.is_signed() => a >> count,
        _ => ((a as u64) >> count) as i64,
    }
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> Result<f64> {
    Ok(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        other => {
            return Err(malformed_error!(
                "Operator {} is not defined on floats",
                other.symbol()
            ))
        }
    })
}

fn complex_binary(op: BinaryOp, (a, b): (f64, f64), (c, d): (f64, f64)) -> Result<(f64, f64)> {
    Ok(match op {
        BinaryOp::Add => (a + c, b + d),
        BinaryOp::Sub => (a - c, b - d),
        BinaryOp::Mul => (a * c - b * d, a * d + b * c),
        BinaryOp::Div => {
            let denom = c * c + d * d;
            ((a * c + b * d) / denom, (b * c - a * d) / denom)
        }
        other => {
            return Err(malformed_error!(
                "Operator {} is not defined on complex numbers",
                other.symbol()
            ))
        }
    })
}

/// Applies a binary operator to concrete operands.
///
/// # Errors
///
/// Returns an error for mismatched operands, operators undefined on the
/// operand type, negative shift counts and integer division by zero.
#[allow(clippy::cast_possible_truncation)]
pub fn apply_binary(op: BinaryOp, left: &Concrete, right: &Concrete) -> Result<Concrete> {
    if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
        let Concrete::Int { value, kind } = left else {
            return Err(malformed_error!("Shifted value {} is not an integer", left));
        };
        let count = shift_count(right)?;
        return Ok(Concrete::Int {
            value: int_shift(op, *value, count, *kind),
            kind: *kind,
        });
    }

    match (left, right) {
        (Concrete::Bool(a), Concrete::Bool(b)) => match op {
            BinaryOp::And => Ok(Concrete::Bool(*a && *b)),
            BinaryOp::Or => Ok(Concrete::Bool(*a || *b)),
            BinaryOp::Xor => Ok(Concrete::Bool(a != b)),
            other => Err(malformed_error!(
                "Operator {} is not defined on booleans",
                other.symbol()
            )),
        },
        (Concrete::Int { value: a, kind }, Concrete::Int { value: b, kind: other })
            if kind == other =>
        {
            Ok(Concrete::Int {
                value: int_binary(op, *a, *b, *kind)?,
                kind: *kind,
            })
        }
        (Concrete::Float32(a), Concrete::Float32(b)) => Ok(Concrete::Float32(
            float_binary(op, f64::from(*a), f64::from(*b))? as f32,
        )),
        (Concrete::Float64(a), Concrete::Float64(b)) => {
            Ok(Concrete::Float64(float_binary(op, *a, *b)?))
        }
        (Concrete::Complex64 { .. }, Concrete::Complex64 { .. }) => {
            let (re, im) = complex_binary(op, complex_parts(left)?, complex_parts(right)?)?;
            Ok(Concrete::complex(re, im, &Type::Complex64))
        }
        (Concrete::Complex128 { .. }, Concrete::Complex128 { .. }) => {
            let (re, im) = complex_binary(op, complex_parts(left)?, complex_parts(right)?)?;
            Ok(Concrete::Complex128 { re, im })
        }
        _ => Err(malformed_error!(
            "Operands {} and {} of {} have different types",
            left,
            right,
            op.symbol()
        )),
    }
}

fn complex_parts(value: &Concrete) -> Result<(f64, f64)> {
    value
        .as_complex()
        .ok_or_else(|| malformed_error!("{} is not a complex number", value))
}

/// Applies a comparison to concrete operands.
///
/// # Errors
///
/// Returns an error for mismatched operands and for ordering comparisons of
/// booleans, complex numbers and handles.
#[allow(clippy::cast_sign_loss, clippy::float_cmp)]
pub fn apply_compare(op: CompareOp, left: &Concrete, right: &Concrete) -> Result<Concrete> {
    let ordering_undefined = || {
        malformed_error!(
            "Comparison {} is not defined between {} and {}",
            op.symbol(),
            left,
            right
        )
    };
    let result = match (left, right) {
        (Concrete::Int { value: a, kind }, Concrete::Int { value: b, kind: other })
            if kind == other =>
        {
            match op {
                CompareOp::Equals => a == b,
                CompareOp::Lt if kind.is_signed() => a < b,
                CompareOp::Gt if kind.is_signed() => a > b,
                CompareOp::Lt => (*a as u64) < (*b as u64),
                CompareOp::Gt => (*a as u64) > (*b as u64),
            }
        }
        (Concrete::Float32(_), Concrete::Float32(_))
        | (Concrete::Float64(_), Concrete::Float64(_)) => {
            let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                return Err(ordering_undefined());
            };
            match op {
                CompareOp::Equals => a == b,
                CompareOp::Lt => a < b,
                CompareOp::Gt => a > b,
            }
        }
        (Concrete::Bool(a), Concrete::Bool(b)) if op == CompareOp::Equals => a == b,
        (Concrete::Handle(a), Concrete::Handle(b)) if op == CompareOp::Equals => a == b,
        (Concrete::Complex64 { .. }, Concrete::Complex64 { .. })
        | (Concrete::Complex128 { .. }, Concrete::Complex128 { .. })
            if op == CompareOp::Equals =>
        {
            let ((a, b), (c, d)) = (complex_parts(left)?, complex_parts(right)?);
            a == c && b == d
        }
        _ => return Err(ordering_undefined()),
    };
    Ok(Concrete::Bool(result))
}

/// Applies logical negation or bitwise complement.
///
/// # Errors
///
/// Returns an error for operands that are neither booleans nor integers.
pub fn apply_not(value: &Concrete) -> Result<Concrete> {
    match value {
        Concrete::Bool(b) => Ok(Concrete::Bool(!b)),
        Concrete::Int { value, kind } => Ok(Concrete::typed_int(!value, *kind)),
        other => Err(malformed_error!("Cannot negate {}", other)),
    }
}

/// Converts a concrete value to `to`.
///
/// # Errors
///
/// Returns an error for conversions without a numeric meaning.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
pub fn apply_cast(value: &Concrete, to: &Type) -> Result<Concrete> {
    let unsupported = || malformed_error!("Cannot convert {} to {}", value, to);
    match (value, to) {
        (Concrete::Bool(b), Type::Bool) => Ok(Concrete::Bool(*b)),
        (Concrete::Int { value, .. }, Type::Int(kind)) => Ok(Concrete::typed_int(*value, *kind)),
        (Concrete::Int { value, kind }, Type::Float32 | Type::Float64) => {
            let widened = if kind.is_signed() {
                *value as f64
            } else {
                *value as u64 as f64
            };
            Ok(match to {
                Type::Float32 => Concrete::Float32(widened as f32),
                _ => Concrete::Float64(widened),
            })
        }
        (Concrete::Float32(_) | Concrete::Float64(_), Type::Int(kind)) => {
            let v = value.as_f64().ok_or_else(unsupported)?;
            let raw = if kind.is_signed() {
                v as i64
            } else {
                v as u64 as i64
            };
            Ok(Concrete::typed_int(raw, *kind))
        }
        (Concrete::Float32(_) | Concrete::Float64(_), Type::Float32) => {
            Ok(Concrete::Float32(value.as_f64().ok_or_else(unsupported)? as f32))
        }
        (Concrete::Float32(_) | Concrete::Float64(_), Type::Float64) => {
            Ok(Concrete::Float64(value.as_f64().ok_or_else(unsupported)?))
        }
        (Concrete::Complex64 { .. } | Concrete::Complex128 { .. }, Type::Complex64 | Type::Complex128) => {
            let (re, im) = complex_parts(value)?;
            Ok(Concrete::complex(re, im, to))
        }
        _ => Err(unsupported()),
    }
}

/// Applies one of the interpreted built-in functions.
///
/// # Errors
///
/// Returns [`crate::Error::Unsupported`] for uninterpreted functions.
#[allow(clippy::cast_possible_truncation)]
pub fn apply_builtin(signature: &str, args: &[Concrete], result: &Type) -> Result<Concrete> {
    match (signature, args) {
        (builtin::REAL, [c]) => {
            let (re, _) = complex_parts(c)?;
            Ok(float_of(re, result))
        }
        (builtin::IMAG, [c]) => {
            let (_, im) = complex_parts(c)?;
            Ok(float_of(im, result))
        }
        (builtin::COMPLEX, [re, im]) => {
            let re = re
                .as_f64()
                .ok_or_else(|| malformed_error!("Real part {} is not a float", re))?;
            let im = im
                .as_f64()
                .ok_or_else(|| malformed_error!("Imaginary part {} is not a float", im))?;
            Ok(Concrete::complex(re, im, result))
        }
        (builtin::SQRT, [x]) => {
            let x = x
                .as_f64()
                .ok_or_else(|| malformed_error!("sqrt argument {} is not a float", x))?;
            Ok(float_of(x.sqrt(), result))
        }
        _ => Err(unsupported_error!(
            "Uninterpreted function {} has no concrete value",
            signature
        )),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_of(value: f64, ty: &Type) -> Concrete {
    match ty {
        Type::Float32 => Concrete::Float32(value as f32),
        _ => Concrete::Float64(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(pairs: &[(&str, Concrete)]) -> Bindings {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_overflowing_multiplication_wraps() -> Result<()> {
        let a = Expr::input("a", Type::INT);
        let b = Expr::input("b", Type::INT);
        let product = Expr::binary(BinaryOp::Mul, a, b);
        let bindings = bind(&[
            ("a", Concrete::int(13_217_643_890_510_138)),
            ("b", Concrete::int(13_217_643_890_510_138)),
        ]);
        assert_eq!(
            evaluate(&product, &bindings)?,
            Concrete::int(6_778_761_081_452_962_084)
        );
        Ok(())
    }

    #[test]
    fn test_unsigned_division_and_comparison() -> Result<()> {
        let max = Concrete::typed_int(-1, IntKind::Uint);
        let two = Concrete::typed_int(2, IntKind::Uint);
        assert_eq!(
            apply_binary(BinaryOp::Div, &max, &two)?,
            Concrete::typed_int(i64::MAX, IntKind::Uint)
        );
        assert_eq!(apply_compare(CompareOp::Gt, &max, &two)?, Concrete::Bool(true));
        assert_eq!(
            apply_compare(CompareOp::Gt, &Concrete::int(-1), &Concrete::int(2))?,
            Concrete::Bool(false)
        );
        Ok(())
    }

    #[test]
    fn test_shifts_saturate() -> Result<()> {
        let one = Concrete::typed_int(1, IntKind::I8);
        assert_eq!(
            apply_binary(BinaryOp::Shl, &one, &Concrete::typed_int(7, IntKind::Uint))?,
            Concrete::typed_int(-128, IntKind::I8)
        );
        assert_eq!(
            apply_binary(BinaryOp::Shl, &one, &Concrete::typed_int(8, IntKind::Uint))?,
            Concrete::typed_int(0, IntKind::I8)
        );
        assert_eq!(
            apply_binary(
                BinaryOp::Shr,
                &Concrete::int(-8),
                &Concrete::typed_int(100, IntKind::Uint)
            )?,
            Concrete::int(-1)
        );
        assert!(apply_binary(BinaryOp::Shl, &one, &Concrete::int(-1)).is_err());
        Ok(())
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        assert!(apply_binary(BinaryOp::Div, &Concrete::int(1), &Concrete::int(0)).is_err());
        assert!(apply_binary(BinaryOp::Rem, &Concrete::int(1), &Concrete::int(0)).is_err());
    }

    #[test]
    fn test_float_comparisons_follow_ieee() -> Result<()> {
        let nan = Concrete::Float64(f64::NAN);
        assert_eq!(apply_compare(CompareOp::Equals, &nan, &nan)?, Concrete::Bool(false));
        assert_eq!(
            apply_compare(
                CompareOp::Equals,
                &Concrete::Float64(0.0),
                &Concrete::Float64(-0.0)
            )?,
            Concrete::Bool(true)
        );
        Ok(())
    }

    #[test]
    fn test_float_remainder_keeps_dividend_sign() -> Result<()> {
        assert_eq!(
            apply_binary(BinaryOp::Rem, &Concrete::Float64(-7.5), &Concrete::Float64(2.0))?,
            Concrete::Float64(-1.5)
        );
        assert_eq!(
            apply_binary(BinaryOp::Rem, &Concrete::Float32(7.0), &Concrete::Float32(-2.5))?,
            Concrete::Float32(2.0)
        );
        let by_zero = apply_binary(BinaryOp::Rem, &Concrete::Float64(1.0), &Concrete::Float64(0.0))?;
        assert!(by_zero.as_f64().is_some_and(f64::is_nan));
        Ok(())
    }

    #[test]
    fn test_complex_arithmetic() -> Result<()> {
        let a = Concrete::Complex128 { re: 1.0, im: 2.0 };
        let b = Concrete::Complex128 { re: 3.0, im: -1.0 };
        assert_eq!(
            apply_binary(BinaryOp::Mul, &a, &b)?,
            Concrete::Complex128 { re: 5.0, im: 5.0 }
        );
        assert_eq!(
            apply_builtin(builtin::REAL, &[a], &Type::Float64)?,
            Concrete::Float64(1.0)
        );
        Ok(())
    }

    #[test]
    fn test_conversions() -> Result<()> {
        assert_eq!(
            apply_cast(&Concrete::typed_int(-1, IntKind::I8), &Type::Int(IntKind::U16))?,
            Concrete::typed_int(0xFFFF, IntKind::U16)
        );
        assert_eq!(
            apply_cast(&Concrete::Float64(-2.75), &Type::INT)?,
            Concrete::int(-2)
        );
        assert_eq!(
            apply_cast(&Concrete::typed_int(-1, IntKind::Uint), &Type::Float64)?,
            Concrete::Float64(18_446_744_073_709_551_615.0)
        );
        Ok(())
    }

    #[test]
    fn test_conditional_picks_first_true_guard() -> Result<()> {
        let x = Expr::input("x", Type::INT);
        let choice = Expr::conditional(vec![
            (Expr::gt(x.clone(), Expr::int(0)), Expr::int(1)),
            (Expr::gt(x.clone(), Expr::int(-10)), Expr::int(2)),
            (Expr::boolean(true), Expr::int(3)),
        ]);
        assert_eq!(evaluate(&choice, &bind(&[("x", Concrete::int(5))]))?, Concrete::int(1));
        assert_eq!(evaluate(&choice, &bind(&[("x", Concrete::int(-5))]))?, Concrete::int(2));
        assert_eq!(evaluate(&choice, &bind(&[("x", Concrete::int(-50))]))?, Concrete::int(3));
        Ok(())
    }

    #[test]
    fn test_unbound_input_is_an_error() {
        let x = Expr::input("x", Type::INT);
        assert!(evaluate(&x, &Bindings::default()).is_err());
    }
}
