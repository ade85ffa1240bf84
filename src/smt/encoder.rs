//! Translation of expressions into solver terms.
//!
//! [`SmtEncoder`] walks an [`Expr`] bottom-up and produces solver terms with
//! sorts chosen by [`SmtSort::of`]. Because expressions are hash-consed, the
//! encoder memoizes every node it has translated and shared subterms are
//! encoded once.
//!
//! # Encoding Rules
//!
//! - Integers are bitvectors of their kind's width; signedness of the left
//!   operand picks signed or unsigned division, remainder, shifts and ordering.
//! - Floats use IEEE sorts; `==` is IEEE equality, encoded as `a <= b && a >= b`.
//!   Arithmetic rounds to nearest, ties to even; `%` truncates like `fmod`
//!   and `sqrt` is the IEEE square root.
//! - Complex values are pairs of floats named `$R_name` and `$I_name`; a float
//!   operand of a complex operation is promoted to `(x, 0)`.
//! - Conversions between bitvector widths extend or truncate. Integers
//!   convert to the nearest float; floats convert to integers by truncation
//!   through a 64-bit intermediate, then wrap to the target width.
//! - Heap regions are arrays named `$heap_<region>` keyed by 64-bit handles;
//!   element regions map handles to rows keyed by 64-bit indices.
//! - A `Ref` of handle type `T` with id `n` is `(index(T) << 32) | n`, where
//!   `index(T)` is assigned in first-seen order per encoder.

use std::fmt;

use rustc_hash::FxHashMap;
use z3::{
    ast::{Array, Ast, Bool, Dynamic, Float, RoundingMode, BV},
    FuncDecl,
};

use crate::{
    expr::{builtin, BinaryOp, CompareOp, Expr, ExprKind, Literal, RegionKind},
    ir::Type,
    smt::{
        sort::{SmtSort, HANDLE_WIDTH},
        value::{Encoded, SmtValue},
    },
    Error, Result,
};

/// Stateful expression-to-term translator.
///
/// The encoder owns the uninterpreted function declarations and the handle
/// type numbering, so all terms that are asserted into one solver must come
/// from the same encoder.
#[derive(Default)]
pub struct SmtEncoder {
    /// Memoized encodings by node identity.
    cache: FxHashMap<Expr, Encoded>,
    /// Uninterpreted functions by name and signature.
    functions: FxHashMap<String, FuncDecl>,
    /// Handle type numbering by type signature.
    handle_types: FxHashMap<String, u64>,
}

impl fmt::Debug for SmtEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtEncoder")
            .field("cached", &self.cache.len())
            .field("functions", &self.functions.len())
            .field("handle_types", &self.handle_types.len())
            .finish()
    }
}

impl SmtEncoder {
    /// Creates an encoder with empty caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates `expr` into its list of solver terms.
    ///
    /// The list has one term, or two for complex values.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SortMismatch`] for ill-sorted expressions and
    /// [`crate::Error::Unsupported`] for operations without an encoding.
    pub fn build_smt(&mut self, expr: &Expr) -> Result<Vec<SmtValue>> {
        Ok(self.encode(expr)?.into_values())
    }

    /// Translates a boolean expression.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SortMismatch`] if `expr` is not boolean.
    pub fn encode_bool(&mut self, expr: &Expr) -> Result<Bool> {
        Ok(self.encode(expr)?.single()?.as_bool()?.clone())
    }

    /// Builds `left == right` with structural equality on every component.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SortMismatch`] if the operands are encoded
    /// with different sorts.
    pub fn same_value(&mut self, left: &Expr, right: &Expr) -> Result<Bool> {
        let l = self.encode(left)?.into_values();
        let r = self.encode(right)?.into_values();
        if l.len() != r.len() {
            return Err(sort_mismatch!("Cannot compare {} with {}", left, right));
        }
        let parts = l
            .iter()
            .zip(&r)
            .map(|(a, b)| a.same_as(b))
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<&Bool> = parts.iter().collect();
        Ok(Bool::and(&refs))
    }

    /// Returns the number assigned to a handle type.
    pub fn type_index(&mut self, ty: &Type) -> u64 {
        let next = self.handle_types.len() as u64;
        *self.handle_types.entry(ty.to_string()).or_insert(next)
    }

    /// Translates `expr`, reusing the memoized encoding when available.
    ///
    /// # Errors
    ///
    /// See [`SmtEncoder::build_smt`].
    pub fn encode(&mut self, expr: &Expr) -> Result<Encoded> {
        if let Some(hit) = self.cache.get(expr) {
            return Ok(hit.clone());
        }
        let encoded = self.encode_node(expr)?;
        self.cache.insert(expr.clone(), encoded.clone());
        Ok(encoded)
    }

    fn encode_node(&mut self, expr: &Expr) -> Result<Encoded> {
        match expr.kind() {
            ExprKind::Literal(literal) => Ok(Encoded::Value(Self::literal(*literal))),
            ExprKind::ComplexLiteral { re, im, ty } => {
                let component = Self::component_of(ty)?;
                Ok(Encoded::Complex(
                    Self::float_literal(f64::from_bits(*re), &component),
                    Self::float_literal(f64::from_bits(*im), &component),
                ))
            }
            ExprKind::InputValue { name, ty } => Self::constant(name, ty),
            ExprKind::Binary { op, left, right } => self.binary(*op, left, right),
            ExprKind::Compare { op, left, right } => self.compare(*op, left, right),
            ExprKind::Not(operand) => match self.encode(operand)?.single()? {
                SmtValue::Bool(b) => Ok(Encoded::Value(SmtValue::Bool(b.not()))),
                SmtValue::BV(b) => Ok(Encoded::Value(SmtValue::BV(b.bvnot()))),
                other => Err(sort_mismatch!("Cannot negate a {} term", other.sort_name())),
            },
            ExprKind::Cast { value, to } => self.cast(value, to),
            ExprKind::FunctionCall {
                signature,
                args,
                result,
            } => self.function_call(signature, args, result),
            ExprKind::Array {
                region,
                kind,
                component,
                known,
                ..
            } => self.array(region, kind, component, known),
            ExprKind::ArrayAccess { array, index } => {
                let array = self.encode(array)?.single()?.as_array()?.clone();
                let index = self.key(index)?;
                Ok(Encoded::Value(SmtValue::from_dynamic(&array.select(&index))?))
            }
            ExprKind::Ref { id, ty } => {
                let tagged = (self.type_index(ty) << 32) | id;
                Ok(Encoded::Value(SmtValue::BV(BV::from_u64(tagged, HANDLE_WIDTH))))
            }
            ExprKind::Conditional(options) => self.conditional(options),
        }
    }

    fn literal(literal: Literal) -> SmtValue {
        match literal {
            Literal::Bool(b) => SmtValue::Bool(Bool::from_bool(b)),
            Literal::Int { value, kind } => SmtValue::BV(BV::from_i64(value, kind.bits())),
            Literal::Float32(bits) => SmtValue::Float(Float::from_f32(f32::from_bits(bits))),
            Literal::Float64(bits) => SmtValue::Float(Float::from_f64(f64::from_bits(bits))),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn float_literal(value: f64, component: &Type) -> Float {
        match component {
            Type::Float32 => Float::from_f32(value as f32),
            _ => Float::from_f64(value),
        }
    }

    fn component_of(ty: &Type) -> Result<Type> {
        ty.complex_component()
            .ok_or_else(|| sort_mismatch!("Type {} is not complex", ty))
    }

    fn constant_of_sort(name: &str, sort: &SmtSort) -> SmtValue {
        match sort {
            SmtSort::Bool => SmtValue::Bool(Bool::new_const(name)),
            SmtSort::BitVec(width) => SmtValue::BV(BV::new_const(name, *width)),
            SmtSort::Float { ebits, sbits } => {
                SmtValue::Float(Float::new_const(name, *ebits, *sbits))
            }
            SmtSort::Array(domain, range) => {
                SmtValue::Array(Array::new_const(name, &domain.to_z3(), &range.to_z3()))
            }
        }
    }

    fn float_constant(name: &str, component: &Type) -> Result<Float> {
        Ok(Self::constant_of_sort(name, &SmtSort::of(component)?)
            .as_float()?
            .clone())
    }

    fn constant(name: &str, ty: &Type) -> Result<Encoded> {
        if let Some(component) = ty.complex_component() {
            return Ok(Encoded::Complex(
                Self::float_constant(&format!("$R_{name}"), &component)?,
                Self::float_constant(&format!("$I_{name}"), &component)?,
            ));
        }
        Ok(Encoded::Value(Self::constant_of_sort(name, &SmtSort::of(ty)?)))
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Encoded> {
        let ty = left.ty();
        if ty.is_complex() || right.ty().is_complex() {
            return self.complex_binary(op, left, right);
        }

        let l = self.encode(left)?;
        let r = self.encode(right)?;
        let value = match (l.single()?, r.single()?) {
            (SmtValue::Bool(a), SmtValue::Bool(b)) => SmtValue::Bool(match op {
                BinaryOp::And => Bool::and(&[a, b]),
                BinaryOp::Or => Bool::or(&[a, b]),
                BinaryOp::Xor => a.xor(b),
                other => {
                    return Err(sort_mismatch!(
                        "Operator {} applied to booleans",
                        other.symbol()
                    ))
                }
            }),
            (SmtValue::BV(a), SmtValue::BV(b)) => {
                SmtValue::BV(Self::bv_binary(op, a, b, ty.is_signed())?)
            }
            (SmtValue::Float(a), SmtValue::Float(b)) => SmtValue::Float(
                Self::float_binary(op, a, b).ok_or_else(|| {
                    unsupported_error!(
                        "Float operator {} applied to {} and {}",
                        op.symbol(),
                        left,
                        right
                    )
                })?,
            ),
            (a, b) => {
                return Err(sort_mismatch!(
                    "Operator {} applied to {} and {}",
                    op.symbol(),
                    a.sort_name(),
                    b.sort_name()
                ))
            }
        };
        Ok(Encoded::Value(value))
    }

    fn bv_binary(op: BinaryOp, a: &BV, b: &BV, signed: bool) -> Result<BV> {
        if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
            return Ok(Self::bv_shift(op, a, b, signed));
        }
        if a.get_size() != b.get_size() {
            return Err(sort_mismatch!(
                "Operator {} applied to BV{} and BV{}",
                op.symbol(),
                a.get_size(),
                b.get_size()
            ));
        }
        Ok(match op {
            BinaryOp::Add => a.bvadd(b),
            BinaryOp::Sub => a.bvsub(b),
            BinaryOp::Mul => a.bvmul(b),
            BinaryOp::Div if signed => a.bvsdiv(b),
            BinaryOp::Div => a.bvudiv(b),
            BinaryOp::Rem if signed => a.bvsrem(b),
            BinaryOp::Rem => a.bvurem(b),
            BinaryOp::And => a.bvand(b),
            BinaryOp::Or => a.bvor(b),
            BinaryOp::Xor => a.bvxor(b),
            BinaryOp::AndNot => a.bvand(&b.bvnot()),
            BinaryOp::Shl | BinaryOp::Shr => Self::bv_shift(op, a, b, signed),
        })
    }

    fn float_binary(op: BinaryOp, a: &Float, b: &Float) -> Option<Float> {
        let rm = RoundingMode::round_nearest_ties_to_even();
        Some(match op {
            BinaryOp::Add => a.add_with_rounding_mode(b, &rm),
            BinaryOp::Sub => a.sub_with_rounding_mode(b, &rm),
            BinaryOp::Mul => a.mul_with_rounding_mode(b, &rm),
            BinaryOp::Div => a.div_with_rounding_mode(b, &rm),
            BinaryOp::Rem => Self::truncated_rem(a, b),
            _ => return None,
        })
    }

    /// Remainder with the sign of the dividend.
    ///
    /// The IEEE remainder rounds the quotient to nearest; when that overshoots,
    /// the result has the wrong sign and one more `|b|` towards the dividend
    /// fixes it. The correction is exact.
    fn truncated_rem(a: &Float, b: &Float) -> Float {
        let rm = RoundingMode::round_nearest_ties_to_even();
        let r = a.rem(b);
        let dividend_negative = a.is_negative();
        let overshoot = Bool::and(&[&r.is_zero().not(), &r.is_negative().xor(&dividend_negative)]);
        let magnitude = b.unary_abs();
        let step = dividend_negative.ite(&magnitude.unary_neg(), &magnitude);
        overshoot.ite(&r.add_with_rounding_mode(&step, &rm), &r)
    }

    /// Shifts saturate: counts of at least the width yield 0, or -1 for
    /// arithmetic right shifts of negative values.
    fn bv_shift(op: BinaryOp, value: &BV, count: &BV, signed: bool) -> BV {
        let width = value.get_size();
        let count_width = count.get_size();
        let shift = |c: &BV| match op {
            BinaryOp::Shl => value.bvshl(c),
            _ if signed => value.bvashr(c),
            _ => value.bvlshr(c),
        };

        if count_width == width {
            shift(count)
        } else if count_width < width {
            shift(&count.zero_ext(width - count_width))
        } else {
            let overflow = count.bvuge(&BV::from_u64(u64::from(width), count_width));
            let saturated = match op {
                BinaryOp::Shr if signed => {
                    value.bvashr(&BV::from_u64(u64::from(width - 1), width))
                }
                _ => BV::from_u64(0, width),
            };
            overflow.ite(&saturated, &shift(&count.extract(width - 1, 0)))
        }
    }

    fn complex_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Encoded> {
        let ty = if left.ty().is_complex() {
            left.ty()
        } else {
            right.ty()
        };
        let component = Self::component_of(&ty)?;
        let (a, b) = self.encode(left)?.complex_parts(&component)?;
        let (c, d) = self.encode(right)?.complex_parts(&component)?;

        let rm = RoundingMode::round_nearest_ties_to_even();
        let add = |x: &Float, y: &Float| x.add_with_rounding_mode(y, &rm);
        let sub = |x: &Float, y: &Float| x.sub_with_rounding_mode(y, &rm);
        let mul = |x: &Float, y: &Float| x.mul_with_rounding_mode(y, &rm);
        let (re, im) = match op {
            BinaryOp::Add => (add(&a, &c), add(&b, &d)),
            BinaryOp::Sub => (sub(&a, &c), sub(&b, &d)),
            BinaryOp::Mul => (
                sub(&mul(&a, &c), &mul(&b, &d)),
                add(&mul(&a, &d), &mul(&b, &c)),
            ),
            BinaryOp::Div => {
                let denom = add(&mul(&c, &c), &mul(&d, &d));
                (
                    add(&mul(&a, &c), &mul(&b, &d)).div_with_rounding_mode(&denom, &rm),
                    sub(&mul(&b, &c), &mul(&a, &d)).div_with_rounding_mode(&denom, &rm),
                )
            }
            other => {
                return Err(unsupported_error!(
                    "Complex operator {}",
                    other.symbol()
                ))
            }
        };
        Ok(Encoded::Complex(re, im))
    }

    fn float_equals(a: &Float, b: &Float) -> Bool {
        Bool::and(&[&a.le(b), &a.ge(b)])
    }

    fn compare(&mut self, op: CompareOp, left: &Expr, right: &Expr) -> Result<Encoded> {
        let ty = left.ty();
        if ty.is_complex() || right.ty().is_complex() {
            if op != CompareOp::Equals {
                return Err(unsupported_error!("Ordering of complex values"));
            }
            let component = Self::component_of(if ty.is_complex() {
                &ty
            } else {
                &right.ty()
            })?;
            let (a, b) = self.encode(left)?.complex_parts(&component)?;
            let (c, d) = self.encode(right)?.complex_parts(&component)?;
            let both = Bool::and(&[&Self::float_equals(&a, &c), &Self::float_equals(&b, &d)]);
            return Ok(Encoded::Value(SmtValue::Bool(both)));
        }

        let l = self.encode(left)?;
        let r = self.encode(right)?;
        let result = match (l.single()?, r.single()?) {
            (SmtValue::BV(a), SmtValue::BV(b)) => {
                if a.get_size() != b.get_size() {
                    return Err(sort_mismatch!(
                        "Comparison of BV{} with BV{}",
                        a.get_size(),
                        b.get_size()
                    ));
                }
                let signed = ty.is_signed();
                match op {
                    CompareOp::Equals => a.eq(b),
                    CompareOp::Lt if signed => a.bvslt(b),
                    CompareOp::Lt => a.bvult(b),
                    CompareOp::Gt if signed => a.bvsgt(b),
                    CompareOp::Gt => a.bvugt(b),
                }
            }
            (SmtValue::Float(a), SmtValue::Float(b)) => match op {
                CompareOp::Equals => Self::float_equals(a, b),
                CompareOp::Lt => a.lt(b),
                CompareOp::Gt => a.gt(b),
            },
            (SmtValue::Bool(a), SmtValue::Bool(b)) if op == CompareOp::Equals => a.eq(b),
            (SmtValue::Array(a), SmtValue::Array(b)) if op == CompareOp::Equals => a.eq(b),
            (a, b) => {
                return Err(sort_mismatch!(
                    "Comparison {} of {} and {}",
                    op.symbol(),
                    a.sort_name(),
                    b.sort_name()
                ))
            }
        };
        Ok(Encoded::Value(SmtValue::Bool(result)))
    }

    fn resize(value: &BV, width: u32, signed: bool) -> BV {
        let size = value.get_size();
        if size == width {
            value.clone()
        } else if size < width && signed {
            value.sign_ext(width - size)
        } else if size < width {
            value.zero_ext(width - size)
        } else {
            value.extract(width - 1, 0)
        }
    }

    fn cast(&mut self, value: &Expr, to: &Type) -> Result<Encoded> {
        let from = value.ty();
        let nearest = RoundingMode::round_nearest_ties_to_even();
        if let (Some(from_component), Some(to_component)) =
            (from.complex_component(), to.complex_component())
        {
            let (re, im) = self.encode(value)?.complex_parts(&from_component)?;
            if from_component == to_component {
                return Ok(Encoded::Complex(re, im));
            }
            let sort = SmtSort::of(&to_component)?.to_z3();
            return Ok(Encoded::Complex(
                re.to_fp_with_rounding_mode(&nearest, &sort),
                im.to_fp_with_rounding_mode(&nearest, &sort),
            ));
        }

        let encoded = self.encode(value)?;
        let term = encoded.single()?;
        let target = SmtSort::of(to)?;
        let value = match (term, &target) {
            (SmtValue::Bool(b), SmtSort::Bool) => SmtValue::Bool(b.clone()),
            (SmtValue::BV(b), SmtSort::BitVec(width)) => {
                SmtValue::BV(Self::resize(b, *width, from.is_signed()))
            }
            (SmtValue::BV(b), SmtSort::Float { .. }) if matches!(from, Type::Int(_)) => {
                SmtValue::Float(Self::int_to_float(b, from.is_signed(), &target)?)
            }
            (SmtValue::Float(f), SmtSort::BitVec(width)) if matches!(to, Type::Int(_)) => {
                let truncate = RoundingMode::round_towards_zero();
                let signed = to.is_signed();
                let full = if signed {
                    f.to_sbv_with_rounding_mode(&truncate, HANDLE_WIDTH)
                } else {
                    f.to_ubv_with_rounding_mode(&truncate, HANDLE_WIDTH)
                };
                SmtValue::BV(Self::resize(&full, *width, signed))
            }
            (SmtValue::Float(f), SmtSort::Float { .. }) => {
                SmtValue::Float(f.to_fp_with_rounding_mode(&nearest, &target.to_z3()))
            }
            (term, _) => {
                return Err(unsupported_error!(
                    "Conversion of a {} term from {} to {}",
                    term.sort_name(),
                    from,
                    to
                ))
            }
        };
        Ok(Encoded::Value(value))
    }

    /// Rounds an integer bitvector to the nearest float of `sort`.
    fn int_to_float(value: &BV, signed: bool, sort: &SmtSort) -> Result<Float> {
        let nearest = RoundingMode::round_nearest_ties_to_even();
        let target = sort.to_z3();
        let ctx = value.get_ctx();
        let raw = unsafe {
            if signed {
                z3_sys::Z3_mk_fpa_to_fp_signed(
                    ctx.get_z3_context(),
                    nearest.get_z3_ast(),
                    value.get_z3_ast(),
                    target.get_z3_sort(),
                )
            } else {
                z3_sys::Z3_mk_fpa_to_fp_unsigned(
                    ctx.get_z3_context(),
                    nearest.get_z3_ast(),
                    value.get_z3_ast(),
                    target.get_z3_sort(),
                )
            }
        }
        .ok_or_else(|| Error::Solver(format!("Cannot convert BV{} to {sort}", value.get_size())))?;
        // the wrapper takes its own reference on the new term
        Ok(unsafe { Float::wrap(ctx, raw) })
    }

    fn function(&mut self, name: &str, domain: &[SmtSort], range: &SmtSort) -> FuncDecl {
        let key = format!(
            "{name}({})->{range}",
            domain
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        );
        self.functions
            .entry(key)
            .or_insert_with(|| {
                let sorts: Vec<z3::Sort> = domain.iter().map(SmtSort::to_z3).collect();
                let sort_refs: Vec<&z3::Sort> = sorts.iter().collect();
                FuncDecl::new(name, &sort_refs, &range.to_z3())
            })
            .clone()
    }

    fn sort_of_value(value: &SmtValue) -> Result<SmtSort> {
        Ok(match value {
            SmtValue::Bool(_) => SmtSort::Bool,
            SmtValue::BV(b) => SmtSort::BitVec(b.get_size()),
            SmtValue::Float(f) => match f.get_sort().float_exponent_size() {
                Some(8) => SmtSort::FLOAT32,
                _ => SmtSort::FLOAT64,
            },
            SmtValue::Array(_) => {
                return Err(unsupported_error!(
                    "Arrays as arguments of uninterpreted functions"
                ))
            }
        })
    }

    fn function_call(&mut self, signature: &str, args: &[Expr], result: &Type) -> Result<Encoded> {
        match (signature, args) {
            (builtin::REAL | builtin::IMAG, [value]) => {
                let component = Self::component_of(&value.ty())?;
                let (re, im) = self.encode(value)?.complex_parts(&component)?;
                let part = if signature == builtin::REAL { re } else { im };
                return Ok(Encoded::Value(SmtValue::Float(part)));
            }
            (builtin::SQRT, [x]) => {
                let x = self.encode(x)?.single()?.as_float()?.clone();
                return Ok(Encoded::Value(SmtValue::Float(x.sqrt())));
            }
            (builtin::COMPLEX, [re, im]) => {
                let re = self.encode(re)?.single()?.as_float()?.clone();
                let im = self.encode(im)?.single()?.as_float()?.clone();
                return Ok(Encoded::Complex(re, im));
            }
            _ => {}
        }

        let mut terms = Vec::new();
        for arg in args {
            terms.extend(self.encode(arg)?.into_values());
        }
        let domain = terms
            .iter()
            .map(Self::sort_of_value)
            .collect::<Result<Vec<_>>>()?;
        let dynamic: Vec<Dynamic> = terms.iter().map(SmtValue::to_dynamic).collect();
        let arg_refs: Vec<&dyn Ast> = dynamic.iter().map(|d| d as &dyn Ast).collect();

        let ranges = SmtSort::components(result)?;
        let mut outputs = Vec::with_capacity(ranges.len());
        for (position, range) in ranges.iter().enumerate() {
            let name = match (ranges.len(), position) {
                (1, _) => signature.to_string(),
                (_, 0) => format!("$R_{signature}"),
                _ => format!("$I_{signature}"),
            };
            let decl = self.function(&name, &domain, range);
            outputs.push(SmtValue::from_dynamic(&decl.apply(&arg_refs))?);
        }

        match outputs.as_slice() {
            [single] => Ok(Encoded::Value(single.clone())),
            [re, im] => Ok(Encoded::Complex(re.as_float()?.clone(), im.as_float()?.clone())),
            _ => Err(sort_mismatch!("Function {} has no result sort", signature)),
        }
    }

    /// Array keys are 64-bit: handles already are, integer indices are extended.
    fn key(&mut self, index: &Expr) -> Result<BV> {
        let encoded = self.encode(index)?;
        let key = encoded.single()?.as_bv()?;
        Ok(Self::resize(key, HANDLE_WIDTH, index.ty().is_signed()))
    }

    fn region_base(region: &str, component: &Type, nested: bool) -> Result<Array> {
        let value_sort = SmtSort::of(component)?;
        let range = if nested {
            SmtSort::handle_array(value_sort)
        } else {
            value_sort
        };
        Ok(Array::new_const(
            format!("$heap_{region}"),
            &SmtSort::HANDLE.to_z3(),
            &range.to_z3(),
        ))
    }

    fn array(
        &mut self,
        region: &str,
        kind: &RegionKind,
        component: &Type,
        known: &[(Expr, Expr)],
    ) -> Result<Encoded> {
        let mut array = match kind {
            RegionKind::Cells | RegionKind::Field => Self::region_base(region, component, false)?,
            RegionKind::Elements => Self::region_base(region, component, true)?,
            RegionKind::Row(owner) => {
                let rows = Self::region_base(region, component, true)?;
                let owner = self.key(owner)?;
                SmtValue::from_dynamic(&rows.select(&owner))?
                    .as_array()?
                    .clone()
            }
        };
        for (key, value) in known {
            let key = self.key(key)?;
            let value = self.encode(value)?.single()?.to_dynamic();
            array = array.store(&key, &value);
        }
        Ok(Encoded::Value(SmtValue::Array(array)))
    }

    fn ite(cond: &Bool, then: &SmtValue, otherwise: &SmtValue) -> Result<SmtValue> {
        Ok(match (then, otherwise) {
            (SmtValue::Bool(a), SmtValue::Bool(b)) => SmtValue::Bool(cond.ite(a, b)),
            (SmtValue::BV(a), SmtValue::BV(b)) => SmtValue::BV(cond.ite(a, b)),
            (SmtValue::Float(a), SmtValue::Float(b)) => SmtValue::Float(cond.ite(a, b)),
            (SmtValue::Array(a), SmtValue::Array(b)) => SmtValue::Array(cond.ite(a, b)),
            (a, b) => {
                return Err(sort_mismatch!(
                    "Conditional options of {} and {}",
                    a.sort_name(),
                    b.sort_name()
                ))
            }
        })
    }

    fn conditional(&mut self, options: &[(Expr, Expr)]) -> Result<Encoded> {
        let Some(((_, last), rest)) = options.split_last() else {
            return Err(malformed_error!("Conditional without options"));
        };
        let mut acc = self.encode(last)?;
        for (guard, value) in rest.iter().rev() {
            let guard = self.encode_bool(guard)?;
            let value = self.encode(value)?;
            acc = match (&value, &acc) {
                (Encoded::Complex(a, b), Encoded::Complex(c, d)) => {
                    Encoded::Complex(guard.ite(a, c), guard.ite(b, d))
                }
                (Encoded::Value(a), Encoded::Value(b)) => Encoded::Value(Self::ite(&guard, a, b)?),
                _ => {
                    return Err(sort_mismatch!(
                        "Conditional mixes {} and {}",
                        "complex",
                        "scalar options"
                    ))
                }
            };
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{expr::Concrete, ir::IntKind, smt::SolverSession, testgen};

    fn int(name: &str) -> Expr {
        Expr::input(name, Type::INT)
    }

    #[test]
    fn test_shared_subterms_are_encoded_once() -> Result<()> {
        let mut encoder = SmtEncoder::new();
        let sum = Expr::binary(BinaryOp::Add, int("a"), int("b"));
        let twice = Expr::binary(BinaryOp::Mul, sum.clone(), sum);
        encoder.build_smt(&twice)?;
        // a, b, a + b and the product
        assert_eq!(encoder.cache.len(), 4);
        Ok(())
    }

    #[test]
    fn test_complex_inputs_are_pairs() -> Result<()> {
        let mut encoder = SmtEncoder::new();
        let z = Expr::input("z", Type::Complex128);
        let values = encoder.build_smt(&z)?;
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].as_float()?.to_string(), "$R_z");
        assert_eq!(values[1].as_float()?.to_string(), "$I_z");
        Ok(())
    }

    #[test]
    fn test_handle_types_are_numbered_in_order() {
        let mut encoder = SmtEncoder::new();
        assert_eq!(encoder.type_index(&Type::pointer(Type::INT)), 0);
        assert_eq!(encoder.type_index(&Type::slice(Type::INT)), 1);
        assert_eq!(encoder.type_index(&Type::pointer(Type::INT)), 0);
    }

    #[test]
    fn test_ill_sorted_operations_are_rejected() {
        let mut encoder = SmtEncoder::new();
        let mixed = Expr::binary(
            BinaryOp::Add,
            int("a"),
            Expr::input("b", Type::Int(IntKind::I8)),
        );
        assert!(matches!(
            encoder.build_smt(&mixed),
            Err(crate::Error::SortMismatch { .. })
        ));

        let flag = Expr::input("f", Type::Bool);
        assert!(encoder
            .build_smt(&Expr::binary(BinaryOp::Add, flag.clone(), flag))
            .is_err());
    }

    /// Model value of `value` once `input` is pinned to `pinned`.
    fn pinned(input: &Expr, pinned: Expr, value: &Expr) -> Result<Option<Concrete>> {
        let mut session = SolverSession::default();
        testgen::check_result(&Expr::equals(input.clone(), pinned), value, &mut session)
    }

    #[test]
    fn test_float_arithmetic_rounds_to_nearest() -> Result<()> {
        let x = Expr::input("x", Type::Float64);
        let sum = Expr::binary(BinaryOp::Add, x.clone(), Expr::float64(0.2));
        assert_eq!(
            pinned(&x, Expr::float64(0.1), &sum)?,
            Some(Concrete::Float64(0.1 + 0.2))
        );

        let third = Expr::binary(BinaryOp::Div, x.clone(), Expr::float64(3.0));
        let expected = 2.0_f64 / 3.0;
        let found = pinned(&x, Expr::float64(2.0), &third)?.and_then(|c| c.as_f64());
        assert_eq!(found.map(f64::to_bits), Some(expected.to_bits()));
        Ok(())
    }

    #[test]
    fn test_float_remainder_truncates() -> Result<()> {
        let x = Expr::input("x", Type::Float64);
        for (dividend, divisor) in [(-7.5, 2.0), (5.0, 3.0), (7.0, -2.5), (1.0e300, 3.0)] {
            let rem = Expr::binary(BinaryOp::Rem, x.clone(), Expr::float64(divisor));
            let found = pinned(&x, Expr::float64(dividend), &rem)?.and_then(|c| c.as_f64());
            let expected: f64 = dividend % divisor;
            assert_eq!(
                found.map(f64::to_bits),
                Some(expected.to_bits()),
                "{dividend} % {divisor}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_sqrt_is_interpreted() -> Result<()> {
        let x = Expr::input("x", Type::Float64);
        let root = Expr::call(builtin::SQRT, vec![x.clone()], Type::Float64);
        assert_eq!(
            pinned(&x, Expr::float64(2.0), &root)?,
            Some(Concrete::Float64(2.0_f64.sqrt()))
        );

        // no model with a negative root
        let mut session = SolverSession::default();
        assert_eq!(
            session.probe(&Expr::lt(root, Expr::float64(0.0)))?,
            crate::smt::SolveOutcome::Unsat
        );
        Ok(())
    }

    #[test]
    fn test_numeric_conversions() -> Result<()> {
        let n = int("n");
        let widened = Expr::cast(n.clone(), Type::Float64);
        // 2^53 + 1 ties between two floats and rounds to the even one
        let big = (1_i64 << 53) + 1;
        assert_eq!(
            pinned(&n, Expr::int(big), &widened)?,
            Some(Concrete::Float64(9_007_199_254_740_992.0))
        );

        let x = Expr::input("x", Type::Float64);
        assert_eq!(
            pinned(&x, Expr::float64(-2.75), &Expr::cast(x.clone(), Type::INT))?,
            Some(Concrete::int(-2))
        );
        assert_eq!(
            pinned(&x, Expr::float64(300.5), &Expr::cast(x.clone(), Type::Int(IntKind::U8)))?,
            Some(Concrete::typed_int(44, IntKind::U8))
        );
        assert_eq!(
            pinned(&x, Expr::float64(0.1), &Expr::cast(x.clone(), Type::Float32))?,
            Some(Concrete::Float32(0.1))
        );
        Ok(())
    }
}
