//! Static types carried by the input graph.
//!
//! The front-end type-checks the analyzed program before handing it over; the
//! engine only needs enough of the type system to pick solver sorts, decide
//! signedness, and name heap regions. Every [`Type`] renders to a stable type
//! signature through [`Display`](std::fmt::Display), and those signatures are
//! what the heap and the encoder use as keys.
//!
//! | Type | Signature | Solver sort |
//! |------|-----------|-------------|
//! | `Bool` | `bool` | Bool |
//! | `Int(I8..I64)` | `int8`..`int64` | BV(8..64) |
//! | `Int(Int/Uint/Uintptr)` | `int`, `uint`, `uintptr` | BV(64) |
//! | `Float32` / `Float64` | `float32` / `float64` | FP(8,24) / FP(11,53) |
//! | `Complex64` / `Complex128` | `complex64` / `complex128` | pair of floats |
//! | `Pointer`, `Slice`, `Array`, `Named` | `*T`, `[]T`, `[n]T`, `Name` | BV(64) handle |

use std::fmt;

use strum::{EnumIter, IntoStaticStr};

/// Bit width of the machine-sized integer types (`int`, `uint`, `uintptr`).
pub const MACHINE_WIDTH: u32 = 64;

/// Integer flavours, sized and machine-sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum IntKind {
    /// 8-bit signed integer
    #[strum(serialize = "int8")]
    I8,
    /// 16-bit signed integer
    #[strum(serialize = "int16")]
    I16,
    /// 32-bit signed integer
    #[strum(serialize = "int32")]
    I32,
    /// 64-bit signed integer
    #[strum(serialize = "int64")]
    I64,
    /// Machine-width signed integer
    #[strum(serialize = "int")]
    Int,
    /// 8-bit unsigned integer
    #[strum(serialize = "uint8")]
    U8,
    /// 16-bit unsigned integer
    #[strum(serialize = "uint16")]
    U16,
    /// 32-bit unsigned integer
    #[strum(serialize = "uint32")]
    U32,
    /// 64-bit unsigned integer
    #[strum(serialize = "uint64")]
    U64,
    /// Machine-width unsigned integer
    #[strum(serialize = "uint")]
    Uint,
    /// Machine-width unsigned integer able to hold a pointer
    #[strum(serialize = "uintptr")]
    Uintptr,
}

impl IntKind {
    /// Returns the bit width of this integer kind.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            IntKind::I8 | IntKind::U8 => 8,
            IntKind::I16 | IntKind::U16 => 16,
            IntKind::I32 | IntKind::U32 => 32,
            IntKind::I64 | IntKind::U64 => 64,
            IntKind::Int | IntKind::Uint | IntKind::Uintptr => MACHINE_WIDTH,
        }
    }

    /// Returns `true` for the two's complement signed kinds.
    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64 | IntKind::Int
        )
    }

    /// Normalizes a raw value to this kind's width.
    ///
    /// Signed kinds are sign-extended from their width, unsigned kinds are
    /// zero-extended, so the returned `i64` holds the canonical bit pattern
    /// every other component agrees on.
    ///
    /// # Arguments
    ///
    /// * `value` - The raw value, possibly wider than this kind
    #[must_use]
    pub const fn wrap(self, value: i64) -> i64 {
        let bits = self.bits();
        if bits == 64 {
            return value;
        }
        let shift = 64 - bits;
        if self.is_signed() {
            (value << shift) >> shift
        } else {
            ((value as u64) << shift >> shift) as i64
        }
    }

    /// Returns the type signature, e.g. `int32`.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// A static type of the analyzed program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Boolean
    Bool,
    /// Integer of the given kind
    Int(IntKind),
    /// IEEE-754 binary32
    Float32,
    /// IEEE-754 binary64
    Float64,
    /// Complex number made of two `Float32` components
    Complex64,
    /// Complex number made of two `Float64` components
    Complex128,
    /// Pointer to a value of the inner type
    Pointer(Box<Type>),
    /// Variable-length sequence of the inner type
    Slice(Box<Type>),
    /// Fixed-length array of the inner type
    Array(Box<Type>, u64),
    /// Struct type defined in the program's type table
    Named(String),
}

impl Type {
    /// The machine-width signed integer type, `int`.
    pub const INT: Type = Type::Int(IntKind::Int);

    /// The machine-width unsigned integer type, `uint`.
    pub const UINT: Type = Type::Int(IntKind::Uint);

    /// Creates a pointer type to `inner`.
    #[must_use]
    pub fn pointer(inner: Type) -> Self {
        Type::Pointer(Box::new(inner))
    }

    /// Creates a slice type of `elem`.
    #[must_use]
    pub fn slice(elem: Type) -> Self {
        Type::Slice(Box::new(elem))
    }

    /// Creates a named struct type reference.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Type::Named(name.into())
    }

    /// Returns `true` for integer types.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Type::Int(_))
    }

    /// Returns `true` for `Float32` and `Float64`.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Type::Float32 | Type::Float64)
    }

    /// Returns `true` for `Complex64` and `Complex128`.
    #[must_use]
    pub const fn is_complex(&self) -> bool {
        matches!(self, Type::Complex64 | Type::Complex128)
    }

    /// Returns `true` for types represented by an opaque heap handle.
    #[must_use]
    pub const fn is_handle(&self) -> bool {
        matches!(
            self,
            Type::Pointer(_) | Type::Slice(_) | Type::Array(_, _) | Type::Named(_)
        )
    }

    /// Returns `true` if the type is a signed integer.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        match self {
            Type::Int(kind) => kind.is_signed(),
            _ => false,
        }
    }

    /// Returns the integer kind, if this is an integer type.
    #[must_use]
    pub const fn int_kind(&self) -> Option<IntKind> {
        match self {
            Type::Int(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Returns the element type of slices and arrays, and the pointee of pointers.
    #[must_use]
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Pointer(inner) | Type::Slice(inner) | Type::Array(inner, _) => Some(inner),
            _ => None,
        }
    }

    /// Returns the float type of one component of a complex type.
    #[must_use]
    pub const fn complex_component(&self) -> Option<Type> {
        match self {
            Type::Complex64 => Some(Type::Float32),
            Type::Complex128 => Some(Type::Float64),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int(kind) => write!(f, "{}", kind.name()),
            Type::Float32 => write!(f, "float32"),
            Type::Float64 => write!(f, "float64"),
            Type::Complex64 => write!(f, "complex64"),
            Type::Complex128 => write!(f, "complex128"),
            Type::Pointer(inner) => write!(f, "*{inner}"),
            Type::Slice(inner) => write!(f, "[]{inner}"),
            Type::Array(inner, len) => write!(f, "[{len}]{inner}"),
            Type::Named(name) => write!(f, "{name}"),
        }
    }
}

/// A field of a struct definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: Type,
}

/// A struct type definition from the program's type table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    /// Type name, as used by [`Type::Named`]
    pub name: String,
    /// Fields in declaration order; the field index is the position here
    pub fields: Vec<FieldDef>,
}

impl StructDef {
    /// Creates a struct definition from `(name, type)` pairs.
    ///
    /// # Arguments
    ///
    /// * `name` - The struct's type name
    /// * `fields` - Field names and types in declaration order
    #[must_use]
    pub fn new<N: Into<String>>(name: N, fields: impl IntoIterator<Item = (N, Type)>) -> Self {
        StructDef {
            name: name.into(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| FieldDef {
                    name: name.into(),
                    ty,
                })
                .collect(),
        }
    }

    /// Returns the field at `index`.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&FieldDef> {
        self.fields.get(index)
    }
}
