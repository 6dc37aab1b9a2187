//! Static type descriptors used to select conversion strategies.
//!
//! A [`TypeDescriptor`] is the runtime stand-in for reflection: it carries the
//! `TypeId`, a readable name and the [`TypeKind`] classification of a
//! convertible type. The engine never inspects values to pick a strategy, only
//! descriptors.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Primitive kinds understood by the range-checked conversion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Decimal,
    DateTime,
    String,
}

impl PrimitiveKind {
    /// Short, user-facing name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Decimal => "Decimal",
            PrimitiveKind::DateTime => "DateTime",
            PrimitiveKind::String => "String",
        }
    }

    #[inline]
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::I8
                | PrimitiveKind::U8
                | PrimitiveKind::I16
                | PrimitiveKind::U16
                | PrimitiveKind::I32
                | PrimitiveKind::U32
                | PrimitiveKind::I64
                | PrimitiveKind::U64
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification of a convertible type.
#[derive(Clone, Copy)]
pub enum TypeKind {
    /// One of the built-in primitive kinds.
    Primitive(PrimitiveKind),
    /// A field-less enumeration backed by an integral primitive.
    Enum(PrimitiveKind),
    /// `Option<T>`; the function yields the descriptor of `T`.
    Nullable(fn() -> TypeDescriptor),
    /// The erased [`AnyValue`](crate::AnyValue) container.
    Object,
    /// Any other user type. Only casts, parsers and string rendering apply.
    Other,
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Primitive(kind) => write!(f, "Primitive({kind})"),
            TypeKind::Enum(kind) => write!(f, "Enum({kind})"),
            TypeKind::Nullable(inner) => write!(f, "Nullable({})", inner().name()),
            TypeKind::Object => f.write_str("Object"),
            TypeKind::Other => f.write_str("Other"),
        }
    }
}

/// Identity and classification of a convertible type.
///
/// Equality and hashing consider only the `TypeId`.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
}

impl TypeDescriptor {
    /// Describe `T` with the given classification.
    pub fn of<T: Any>(kind: TypeKind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind,
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Returns `true` if this descriptor describes `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// The primitive kind reachable through the primitive path, if any.
    ///
    /// Enumerations report their underlying integral kind.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Primitive(kind) | TypeKind::Enum(kind) => Some(kind),
            _ => None,
        }
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(PrimitiveKind::String))
    }

    #[inline]
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum(_))
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        matches!(self.kind, TypeKind::Nullable(_))
    }

    /// The descriptor with nullability stripped.
    pub fn underlying(&self) -> TypeDescriptor {
        match self.kind {
            TypeKind::Nullable(inner) => inner(),
            _ => *self,
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
