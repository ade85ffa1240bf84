//! Hash-consed expression nodes.
//!
//! Every [`Expr`] is a shared handle to an immutable [`ExprKind`]. Nodes are
//! created exclusively through the constructors on [`Expr`], which look the
//! node up in a process-wide intern table first, so structurally identical
//! expressions are always the same allocation. Equality and hashing of [`Expr`]
//! are therefore pointer comparisons, and children of a node are canonical by
//! construction.
//!
//! The intern table holds weak references; nodes die with their last handle.
//! [`Expr::purge`] drops the table entries of dead nodes.

use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock, Weak},
};

use dashmap::{mapref::entry::Entry, DashMap};
use rustc_hash::FxBuildHasher;

use crate::{
    expr::{
        eval::{self, Concrete},
        BinaryOp, CompareOp,
    },
    ir::{Constant, IntKind, Type},
};

/// A scalar literal.
///
/// Floats are kept as their IEEE bit patterns so literals can be hashed and
/// compared bitwise; `NaN` literals are therefore equal to themselves here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Literal {
    /// Boolean
    Bool(bool),
    /// Integer, normalized to the kind's width
    Int {
        /// Canonical bit pattern, see [`IntKind::wrap`]
        value: i64,
        /// Integer kind
        kind: IntKind,
    },
    /// binary32 bit pattern
    Float32(u32),
    /// binary64 bit pattern
    Float64(u64),
}

impl Literal {
    /// Returns the static type of the literal.
    #[must_use]
    pub const fn ty(&self) -> Type {
        match self {
            Literal::Bool(_) => Type::Bool,
            Literal::Int { kind, .. } => Type::Int(*kind),
            Literal::Float32(_) => Type::Float32,
            Literal::Float64(_) => Type::Float64,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int { value, kind } if kind.is_signed() => write!(f, "{value}"),
            #[allow(clippy::cast_sign_loss)]
            Literal::Int { value, .. } => write!(f, "{}", *value as u64),
            Literal::Float32(bits) => write!(f, "{}", f32::from_bits(*bits)),
            Literal::Float64(bits) => write!(f, "{}", f64::from_bits(*bits)),
        }
    }
}

/// What a heap region array stores, and how it is keyed.
///
/// Every region is keyed by heap handles. [`RegionKind::Elements`] regions
/// store one row per slice handle; a row is itself an array keyed by index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// Values behind pointers of one pointer type
    Cells,
    /// One field of one struct type
    Field,
    /// Element rows of all slices of one slice type
    Elements,
    /// The element row of one slice, owned by the given handle
    Row(Expr),
}

/// The node variants of the expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// Scalar literal
    Literal(Literal),
    /// Complex literal, component bit patterns stored as binary64
    ComplexLiteral {
        /// Real part bits
        re: u64,
        /// Imaginary part bits
        im: u64,
        /// `Complex64` or `Complex128`
        ty: Type,
    },
    /// A named symbolic input
    InputValue {
        /// Input name, unique per analysis
        name: String,
        /// Static type
        ty: Type,
    },
    /// Arithmetic, bitwise, logical or shift operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Expr,
        /// Right operand
        right: Expr,
    },
    /// Primitive comparison
    Compare {
        /// Operator
        op: CompareOp,
        /// Left operand
        left: Expr,
        /// Right operand
        right: Expr,
    },
    /// Logical negation of booleans, bitwise complement of integers
    Not(Expr),
    /// Numeric conversion
    Cast {
        /// Converted value
        value: Expr,
        /// Target type
        to: Type,
    },
    /// Application of an uninterpreted or built-in function
    FunctionCall {
        /// Function signature, the identity of the uninterpreted function
        signature: String,
        /// Arguments
        args: Vec<Expr>,
        /// Result type
        result: Type,
    },
    /// Snapshot of a heap region: a background array plus known stores
    Array {
        /// Region name
        region: String,
        /// What the region stores
        kind: RegionKind,
        /// Type of the stored values (of row entries for element regions)
        component: Type,
        /// Optional length
        size: Option<Expr>,
        /// Known stores in insertion order, keyed by expression identity
        known: Vec<(Expr, Expr)>,
    },
    /// Read of an array at an index
    ArrayAccess {
        /// Array or nested access
        array: Expr,
        /// Index or handle
        index: Expr,
    },
    /// Heap handle
    Ref {
        /// Per-type allocation counter
        id: u64,
        /// The handle type, e.g. `*int`, `[]float64` or `*Point`
        ty: Type,
    },
    /// Ordered guarded options, the first satisfiable guard wins
    Conditional(Vec<(Expr, Expr)>),
}

/// A canonical, shared expression.
#[derive(Clone)]
pub struct Expr(Arc<ExprKind>);

type InternTable = DashMap<ExprKind, Weak<ExprKind>, FxBuildHasher>;

fn intern_table() -> &'static InternTable {
    static TABLE: OnceLock<InternTable> = OnceLock::new();
    TABLE.get_or_init(|| DashMap::with_hasher(FxBuildHasher))
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl Expr {
    /// Returns the canonical node for `kind`, creating it if needed.
    fn intern(kind: ExprKind) -> Expr {
        match intern_table().entry(kind) {
            Entry::Occupied(mut entry) => {
                if let Some(live) = entry.get().upgrade() {
                    return Expr(live);
                }
                let node = Arc::new(entry.key().clone());
                entry.insert(Arc::downgrade(&node));
                Expr(node)
            }
            Entry::Vacant(entry) => {
                let node = Arc::new(entry.key().clone());
                entry.insert(Arc::downgrade(&node));
                Expr(node)
            }
        }
    }

    /// Drops intern table entries whose nodes are no longer alive.
    pub fn purge() {
        intern_table().retain(|_, node| node.strong_count() > 0);
    }

    /// Returns the node variant.
    #[must_use]
    pub fn kind(&self) -> &ExprKind {
        &self.0
    }

    /// Creates a literal.
    #[must_use]
    pub fn literal(literal: Literal) -> Expr {
        Self::intern(ExprKind::Literal(literal))
    }

    /// Creates a boolean literal.
    #[must_use]
    pub fn boolean(value: bool) -> Expr {
        Self::literal(Literal::Bool(value))
    }

    /// Creates a machine-width `int` literal.
    #[must_use]
    pub fn int(value: i64) -> Expr {
        Self::typed_int(value, IntKind::Int)
    }

    /// Creates an integer literal of the given kind, wrapping to its width.
    #[must_use]
    pub fn typed_int(value: i64, kind: IntKind) -> Expr {
        Self::literal(Literal::Int {
            value: kind.wrap(value),
            kind,
        })
    }

    /// Creates a binary32 literal.
    #[must_use]
    pub fn float32(value: f32) -> Expr {
        Self::literal(Literal::Float32(value.to_bits()))
    }

    /// Creates a binary64 literal.
    #[must_use]
    pub fn float64(value: f64) -> Expr {
        Self::literal(Literal::Float64(value.to_bits()))
    }

    /// Creates a complex literal; `ty` must be `Complex64` or `Complex128`.
    #[must_use]
    pub fn complex(re: f64, im: f64, ty: Type) -> Expr {
        Self::intern(ExprKind::ComplexLiteral {
            re: re.to_bits(),
            im: im.to_bits(),
            ty,
        })
    }

    /// Converts an instruction constant.
    #[must_use]
    pub fn from_constant(constant: &Constant) -> Expr {
        match constant {
            Constant::Bool(b) => Self::boolean(*b),
            Constant::Int { value, kind } => Self::typed_int(*value, *kind),
            Constant::Float32(v) => Self::float32(*v),
            Constant::Float64(v) => Self::float64(*v),
            Constant::Complex { re, im, ty } => Self::complex(*re, *im, ty.clone()),
        }
    }

    /// Creates a named symbolic input.
    #[must_use]
    pub fn input(name: impl Into<String>, ty: Type) -> Expr {
        Self::intern(ExprKind::InputValue {
            name: name.into(),
            ty,
        })
    }

    /// Creates a binary operation, folding it when both operands are literals.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        if let (Some(l), Some(r)) = (Concrete::from_expr(&left), Concrete::from_expr(&right)) {
            if let Ok(folded) = eval::apply_binary(op, &l, &r) {
                return folded.to_expr();
            }
        }
        Self::intern(ExprKind::Binary { op, left, right })
    }

    /// Creates a primitive comparison, folding it when both operands are literals.
    #[must_use]
    pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Expr {
        if let (Some(l), Some(r)) = (Concrete::from_expr(&left), Concrete::from_expr(&right)) {
            if let Ok(folded) = eval::apply_compare(op, &l, &r) {
                return folded.to_expr();
            }
        }
        Self::intern(ExprKind::Compare { op, left, right })
    }

    /// `left < right`
    #[must_use]
    pub fn lt(left: Expr, right: Expr) -> Expr {
        Self::compare(CompareOp::Lt, left, right)
    }

    /// `left > right`
    #[must_use]
    pub fn gt(left: Expr, right: Expr) -> Expr {
        Self::compare(CompareOp::Gt, left, right)
    }

    /// `left == right`
    #[must_use]
    pub fn equals(left: Expr, right: Expr) -> Expr {
        Self::compare(CompareOp::Equals, left, right)
    }

    /// Creates a negation without folding.
    #[must_use]
    pub fn not(operand: Expr) -> Expr {
        Self::intern(ExprKind::Not(operand))
    }

    /// Creates a numeric conversion without folding.
    #[must_use]
    pub fn cast(value: Expr, to: Type) -> Expr {
        Self::intern(ExprKind::Cast { value, to })
    }

    /// Creates a function application.
    #[must_use]
    pub fn call(signature: impl Into<String>, args: Vec<Expr>, result: Type) -> Expr {
        Self::intern(ExprKind::FunctionCall {
            signature: signature.into(),
            args,
            result,
        })
    }

    /// Creates a region snapshot.
    #[must_use]
    pub fn array(
        region: impl Into<String>,
        kind: RegionKind,
        component: Type,
        size: Option<Expr>,
        known: Vec<(Expr, Expr)>,
    ) -> Expr {
        Self::intern(ExprKind::Array {
            region: region.into(),
            kind,
            component,
            size,
            known,
        })
    }

    /// Creates an array read.
    #[must_use]
    pub fn array_access(array: Expr, index: Expr) -> Expr {
        Self::intern(ExprKind::ArrayAccess { array, index })
    }

    /// Creates a heap handle.
    #[must_use]
    pub fn reference(id: u64, ty: Type) -> Expr {
        Self::intern(ExprKind::Ref { id, ty })
    }

    /// Creates a guarded choice.
    #[must_use]
    pub fn conditional(options: Vec<(Expr, Expr)>) -> Expr {
        Self::intern(ExprKind::Conditional(options))
    }

    /// Conjunction with literal folding.
    ///
    /// `create_and(e, true) == e` and `create_and(e, false) == false`, in
    /// either argument order.
    #[must_use]
    pub fn create_and(left: Expr, right: Expr) -> Expr {
        match (left.as_bool(), right.as_bool()) {
            (Some(false), _) | (_, Some(false)) => Self::boolean(false),
            (Some(true), _) => right,
            (_, Some(true)) => left,
            _ if left == right => left,
            _ => Self::intern(ExprKind::Binary {
                op: BinaryOp::And,
                left,
                right,
            }),
        }
    }

    /// Disjunction with literal folding.
    ///
    /// `create_or(e, false) == e` and `create_or(e, true) == true`, in either
    /// argument order.
    #[must_use]
    pub fn create_or(left: Expr, right: Expr) -> Expr {
        match (left.as_bool(), right.as_bool()) {
            (Some(true), _) | (_, Some(true)) => Self::boolean(true),
            (Some(false), _) => right,
            (_, Some(false)) => left,
            _ if left == right => left,
            _ => Self::intern(ExprKind::Binary {
                op: BinaryOp::Or,
                left,
                right,
            }),
        }
    }

    /// Addition with literal folding.
    #[must_use]
    pub fn create_add(left: Expr, right: Expr) -> Expr {
        Self::binary(BinaryOp::Add, left, right)
    }

    /// Negation with literal folding and double-negation elimination.
    #[must_use]
    pub fn create_not(operand: Expr) -> Expr {
        if let ExprKind::Not(inner) = operand.kind() {
            return inner.clone();
        }
        if let Some(value) = Concrete::from_expr(&operand) {
            if let Ok(folded) = eval::apply_not(&value) {
                return folded.to_expr();
            }
        }
        Self::not(operand)
    }

    /// Conversion with identity elimination and literal folding.
    #[must_use]
    pub fn create_cast(value: Expr, to: Type) -> Expr {
        if value.ty() == to {
            return value;
        }
        if let Some(concrete) = Concrete::from_expr(&value) {
            if let Ok(folded) = eval::apply_cast(&concrete, &to) {
                return folded.to_expr();
            }
        }
        Self::cast(value, to)
    }

    /// Returns the scalar literal, if this is one.
    #[must_use]
    pub fn as_literal(&self) -> Option<Literal> {
        match self.kind() {
            ExprKind::Literal(literal) => Some(*literal),
            _ => None,
        }
    }

    /// Returns the value of a boolean literal.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_literal()? {
            Literal::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the canonical value of an integer literal.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self.as_literal()? {
            Literal::Int { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns `true` for the literal `true`.
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.as_bool() == Some(true)
    }

    /// Returns `true` for the literal `false`.
    #[must_use]
    pub fn is_false(&self) -> bool {
        self.as_bool() == Some(false)
    }

    /// Computes the static type of the expression.
    #[must_use]
    pub fn ty(&self) -> Type {
        match self.kind() {
            ExprKind::Literal(literal) => literal.ty(),
            ExprKind::ComplexLiteral { ty, .. } | ExprKind::InputValue { ty, .. } => ty.clone(),
            ExprKind::Binary { left, .. } => left.ty(),
            ExprKind::Compare { .. } => Type::Bool,
            ExprKind::Not(operand) => operand.ty(),
            ExprKind::Cast { to, .. } => to.clone(),
            ExprKind::FunctionCall { result, .. } => result.clone(),
            ExprKind::Array {
                kind, component, ..
            } => match kind {
                RegionKind::Elements => Type::slice(Type::slice(component.clone())),
                _ => Type::slice(component.clone()),
            },
            ExprKind::ArrayAccess { array, .. } => match array.ty() {
                Type::Slice(inner) => *inner,
                other => other,
            },
            ExprKind::Ref { ty, .. } => ty.clone(),
            ExprKind::Conditional(options) => options
                .first()
                .map_or(Type::Bool, |(_, value)| value.ty()),
        }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expr({self})")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExprKind::Literal(literal) => write!(f, "{literal}"),
            ExprKind::ComplexLiteral { re, im, .. } => write!(
                f,
                "({}+{}i)",
                f64::from_bits(*re),
                f64::from_bits(*im)
            ),
            ExprKind::InputValue { name, .. } => write!(f, "{name}"),
            ExprKind::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            ExprKind::Compare { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            ExprKind::Not(operand) => write!(f, "!{operand}"),
            ExprKind::Cast { value, to } => write!(f, "{to}({value})"),
            ExprKind::FunctionCall {
                signature, args, ..
            } => {
                write!(f, "{signature}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            ExprKind::Array {
                region, kind, known, ..
            } => {
                write!(f, "{region}")?;
                if let RegionKind::Row(owner) = kind {
                    write!(f, "[{owner}]")?;
                }
                write!(f, "{{")?;
                for (i, (key, value)) in known.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            ExprKind::ArrayAccess { array, index } => write!(f, "{array}[{index}]"),
            ExprKind::Ref { id, ty } => write!(f, "Ref({id}, {ty})"),
            ExprKind::Conditional(options) => {
                write!(f, "{{")?;
                for (i, (guard, value)) in options.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{guard} => {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn var(name: &str) -> Expr {
        Expr::input(name, Type::INT)
    }

    #[test]
    fn test_structurally_equal_nodes_are_identical() {
        let a1 = Expr::binary(BinaryOp::Add, var("a"), Expr::int(1));
        let a2 = Expr::binary(BinaryOp::Add, var("a"), Expr::int(1));
        assert_eq!(a1, a2);
        assert!(Arc::ptr_eq(&a1.0, &a2.0));

        let mut set = HashSet::new();
        set.insert(a1);
        assert!(set.contains(&a2));
    }

    #[test]
    fn test_distinct_types_are_distinct_nodes() {
        assert_ne!(Expr::input("x", Type::INT), Expr::input("x", Type::UINT));
        assert_ne!(Expr::int(1), Expr::typed_int(1, IntKind::I32));
    }

    #[test]
    fn test_create_and_identities() {
        let e = Expr::gt(var("a"), var("b"));
        assert_eq!(Expr::create_and(e.clone(), Expr::boolean(true)), e);
        assert_eq!(Expr::create_and(Expr::boolean(true), e.clone()), e);
        assert!(Expr::create_and(e.clone(), Expr::boolean(false)).is_false());
        assert!(Expr::create_and(Expr::boolean(false), e).is_false());
    }

    #[test]
    fn test_create_or_identities() {
        let e = Expr::lt(var("a"), var("b"));
        assert_eq!(Expr::create_or(e.clone(), Expr::boolean(false)), e);
        assert_eq!(Expr::create_or(Expr::boolean(false), e.clone()), e);
        assert!(Expr::create_or(e.clone(), Expr::boolean(true)).is_true());
        assert!(Expr::create_or(Expr::boolean(true), e).is_true());
    }

    #[test]
    fn test_literal_folding() {
        assert_eq!(Expr::create_add(Expr::int(2), Expr::int(3)), Expr::int(5));
        assert_eq!(
            Expr::create_add(
                Expr::typed_int(250, IntKind::U8),
                Expr::typed_int(10, IntKind::U8)
            ),
            Expr::typed_int(4, IntKind::U8)
        );
        assert!(Expr::lt(Expr::int(1), Expr::int(2)).is_true());
        assert_eq!(Expr::create_not(Expr::boolean(true)), Expr::boolean(false));
    }

    #[test]
    fn test_division_by_literal_zero_is_not_folded() {
        let div = Expr::binary(BinaryOp::Div, Expr::int(1), Expr::int(0));
        assert!(matches!(div.kind(), ExprKind::Binary { .. }));
    }

    #[test]
    fn test_create_not_eliminates_double_negation() {
        let e = Expr::gt(var("a"), var("b"));
        assert_eq!(Expr::create_not(Expr::create_not(e.clone())), e);
    }

    #[test]
    fn test_create_cast() {
        let a = var("a");
        assert_eq!(Expr::create_cast(a.clone(), Type::INT), a);
        assert_eq!(
            Expr::create_cast(Expr::int(3), Type::Float64),
            Expr::float64(3.0)
        );
        assert_eq!(
            Expr::create_cast(Expr::int(-1), Type::Int(IntKind::U8)),
            Expr::typed_int(255, IntKind::U8)
        );
        let symbolic = Expr::create_cast(a, Type::Float64);
        assert_eq!(symbolic.ty(), Type::Float64);
        assert!(matches!(symbolic.kind(), ExprKind::Cast { .. }));
    }

    #[test]
    fn test_types() {
        let a = var("a");
        assert_eq!(Expr::gt(a.clone(), Expr::int(0)).ty(), Type::Bool);
        assert_eq!(Expr::binary(BinaryOp::Mul, a.clone(), a.clone()).ty(), Type::INT);

        let handle = Expr::input("s", Type::slice(Type::INT));
        let rows = Expr::array("[]int", RegionKind::Elements, Type::INT, None, Vec::new());
        let row = Expr::array_access(rows, handle);
        assert_eq!(row.ty(), Type::slice(Type::INT));
        assert_eq!(Expr::array_access(row, a).ty(), Type::INT);
    }

    #[test]
    fn test_display() {
        let a = var("a");
        let b = var("b");
        let cond = Expr::create_and(
            Expr::create_not(Expr::gt(a.clone(), b.clone())),
            Expr::lt(a, b),
        );
        assert_eq!(cond.to_string(), "(!(a > b) & (a < b))");
        assert_eq!(Expr::reference(1, Type::pointer(Type::INT)).to_string(), "Ref(1, *int)");
    }
}
