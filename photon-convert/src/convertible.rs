//! The [`Convertible`] trait and its implementations for the built-in types.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use photon_result::{Error, Result};
use rust_decimal::Decimal;

use crate::datetime::DateTime;
use crate::descriptor::{PrimitiveKind, TypeDescriptor, TypeKind};
use crate::engine::{ConversionEngine, Converter};
use crate::primitive::{Primitive, parse_bool};
use crate::value::{AnyValue, ErasedValue};

/// String parse hook exposed by a convertible type.
pub enum Parser<T> {
    /// Parse that may reject its input; a rejection becomes
    /// [`Error::InvalidCast`].
    Fallible(fn(&str) -> Option<T>),
    /// Parse that accepts every input.
    Infallible(fn(&str) -> T),
}

impl<T> Clone for Parser<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Parser<T> {}

/// A type the [`ConversionEngine`] can convert from and to.
///
/// Only [`descriptor`](Convertible::descriptor) is required. The remaining
/// hooks opt a type into individual strategies: `to_primitive` and
/// `from_primitive` into the primitive path, `parser` into string parsing,
/// `render` into the string fallback. Nullable wrappers additionally override
/// the null hooks.
pub trait Convertible: Any + Clone + PartialEq + fmt::Debug + Send + Sync {
    fn descriptor() -> TypeDescriptor;

    fn to_primitive(&self) -> Option<Primitive> {
        None
    }

    fn from_primitive(value: Primitive) -> Result<Self> {
        Err(Error::invalid_cast(
            value.kind().name(),
            std::any::type_name::<Self>(),
        ))
    }

    fn parser() -> Option<Parser<Self>> {
        None
    }

    /// String form used by the string fallback.
    fn render(&self) -> String {
        format!("{self:?}")
    }

    fn is_null(&self) -> bool {
        false
    }

    /// Payload of a nullable or boxed value; `None` when null or not a wrapper.
    fn inner_value(&self) -> Option<&dyn ErasedValue> {
        None
    }

    /// The null value of this type, if it has one.
    fn null_value() -> Option<Self> {
        None
    }

    fn to_any_value(&self) -> AnyValue {
        AnyValue::from_shared(Arc::new(self.clone()))
    }

    /// Build a converter that wraps a converted value into `Self`.
    ///
    /// Only nullable targets return `Some`.
    fn wrap_converter(
        _engine: &ConversionEngine,
        _source: TypeDescriptor,
    ) -> Option<Result<Converter<Self>>> {
        None
    }
}

/// Integral primitives usable as the underlying type of an enumeration.
pub trait Integral: Convertible + Copy {
    const KIND: PrimitiveKind;
}

macro_rules! primitive_convertible {
    ($($ty:ty => $kind:ident, $to:ident, $parse:expr;)*) => {
        $(
            impl Convertible for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::of::<$ty>(TypeKind::Primitive(PrimitiveKind::$kind))
                }

                fn to_primitive(&self) -> Option<Primitive> {
                    Some(Primitive::$kind(self.clone()))
                }

                fn from_primitive(value: Primitive) -> Result<Self> {
                    value.$to()
                }

                fn parser() -> Option<Parser<Self>> {
                    Some(Parser::Fallible($parse))
                }

                fn render(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

primitive_convertible! {
    bool => Bool, to_bool, parse_bool;
    char => Char, to_char, |text| text.parse().ok();
    i8 => I8, to_i8, |text| text.trim().parse().ok();
    u8 => U8, to_u8, |text| text.trim().parse().ok();
    i16 => I16, to_i16, |text| text.trim().parse().ok();
    u16 => U16, to_u16, |text| text.trim().parse().ok();
    i32 => I32, to_i32, |text| text.trim().parse().ok();
    u32 => U32, to_u32, |text| text.trim().parse().ok();
    i64 => I64, to_i64, |text| text.trim().parse().ok();
    u64 => U64, to_u64, |text| text.trim().parse().ok();
    f32 => F32, to_f32, |text| text.trim().parse().ok();
    f64 => F64, to_f64, |text| text.trim().parse().ok();
    Decimal => Decimal, to_decimal, |text| text.trim().parse().ok();
    DateTime => DateTime, to_datetime, |text| text.parse().ok();
}

macro_rules! integral {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Integral for $ty {
                const KIND: PrimitiveKind = PrimitiveKind::$kind;
            }
        )*
    };
}

integral!(i8 => I8, u8 => U8, i16 => I16, u16 => U16, i32 => I32, u32 => U32, i64 => I64, u64 => U64);

impl Convertible for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<String>(TypeKind::Primitive(PrimitiveKind::String))
    }

    fn to_primitive(&self) -> Option<Primitive> {
        Some(Primitive::String(self.clone()))
    }

    fn from_primitive(value: Primitive) -> Result<Self> {
        Ok(value.into_string())
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl<T: Convertible> Convertible for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(TypeKind::Nullable(T::descriptor))
    }

    fn render(&self) -> String {
        match self {
            Some(value) => value.render(),
            None => "null".to_string(),
        }
    }

    fn is_null(&self) -> bool {
        self.is_none()
    }

    fn inner_value(&self) -> Option<&dyn ErasedValue> {
        self.as_ref().map(|value| value as &dyn ErasedValue)
    }

    fn null_value() -> Option<Self> {
        Some(None)
    }

    fn to_any_value(&self) -> AnyValue {
        match self {
            Some(value) => value.to_any_value(),
            None => AnyValue::null(),
        }
    }

    fn wrap_converter(
        engine: &ConversionEngine,
        source: TypeDescriptor,
    ) -> Option<Result<Converter<Self>>> {
        let wrapped = engine.converter::<T>(source).map(|inner| -> Converter<Self> {
            Arc::new(move |engine: &ConversionEngine, value: &dyn ErasedValue| {
                inner(engine, value).map(Some)
            })
        });
        Some(wrapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_parse_case_insensitively() {
        let Some(Parser::Fallible(parse)) = bool::parser() else {
            panic!("bool should expose a fallible parser");
        };
        assert_eq!(parse("True"), Some(true));
        assert_eq!(parse(" FALSE "), Some(false));
        assert_eq!(parse("yes"), None);
    }

    #[test]
    fn nullable_hooks() {
        let some: Option<i32> = Some(5);
        assert!(!Convertible::is_null(&some));
        assert_eq!(some.render(), "5");
        assert_eq!(None::<i32>.render(), "null");
        assert_eq!(<Option<i32>>::null_value(), Some(None));
        assert!(i32::null_value().is_none());
        assert!(None::<i32>.to_any_value().is_null());
    }

    #[test]
    fn strings_have_no_parser() {
        assert!(String::parser().is_none());
        assert_eq!(
            String::from_primitive(Primitive::I32(17)).unwrap(),
            "17".to_string()
        );
    }
}
