//! Type-erased values.
//!
//! [`ErasedValue`] is the object-safe face of every [`Convertible`] type and is
//! what converters consume. [`AnyValue`] is the owned, shareable box used where
//! the static type of a slot is "any value": it is itself convertible, and
//! converting out of it re-resolves against the payload's runtime type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use photon_result::Result;

use crate::convertible::Convertible;
use crate::descriptor::{TypeDescriptor, TypeKind};
use crate::engine::ConversionEngine;
use crate::primitive::Primitive;

/// Object-safe view of a convertible value.
///
/// Implemented for every [`Convertible`] type; there is no reason to implement
/// it by hand.
pub trait ErasedValue: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn type_descriptor(&self) -> TypeDescriptor;

    fn primitive_value(&self) -> Option<Primitive>;

    fn display_string(&self) -> String;

    fn is_null_value(&self) -> bool;

    /// Payload of a nullable or boxed value, `None` when null.
    fn nested(&self) -> Option<&dyn ErasedValue>;

    fn boxed(&self) -> AnyValue;

    fn dyn_eq(&self, other: &dyn ErasedValue) -> bool;
}

impl<T: Convertible> ErasedValue for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn type_descriptor(&self) -> TypeDescriptor {
        T::descriptor()
    }

    fn primitive_value(&self) -> Option<Primitive> {
        self.to_primitive()
    }

    fn display_string(&self) -> String {
        self.render()
    }

    fn is_null_value(&self) -> bool {
        Convertible::is_null(self)
    }

    fn nested(&self) -> Option<&dyn ErasedValue> {
        self.inner_value()
    }

    fn boxed(&self) -> AnyValue {
        self.to_any_value()
    }

    fn dyn_eq(&self, other: &dyn ErasedValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

impl dyn ErasedValue + '_ {
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Convert through the process-wide engine.
    pub fn convert<T: Convertible>(&self) -> Result<T> {
        ConversionEngine::global().convert_ref::<T>(self)
    }
}

impl fmt::Debug for dyn ErasedValue + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_descriptor().name(), self.display_string())
    }
}

/// A shared, possibly-null value of any convertible type.
///
/// Cloning is cheap (reference counted). Nullable values are unwrapped when
/// boxed, so `AnyValue::new(Some(5))` holds an `i32` and `AnyValue::new(None::<i32>)`
/// is the null value.
#[derive(Clone, Default)]
pub struct AnyValue(Option<Arc<dyn ErasedValue>>);

impl AnyValue {
    pub fn new<T: Convertible>(value: T) -> Self {
        value.to_any_value()
    }

    #[inline]
    pub fn null() -> Self {
        AnyValue(None)
    }

    pub(crate) fn from_shared(value: Arc<dyn ErasedValue>) -> Self {
        AnyValue(Some(value))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// The boxed payload, `None` for the null value.
    #[inline]
    pub fn value(&self) -> Option<&dyn ErasedValue> {
        self.0.as_deref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value().and_then(|value| value.downcast_ref::<T>())
    }

    /// Runtime type of the payload.
    pub fn type_descriptor(&self) -> Option<TypeDescriptor> {
        self.value().map(|value| value.type_descriptor())
    }

    /// Convert the payload through the process-wide engine.
    pub fn to<T: Convertible>(&self) -> Result<T> {
        ConversionEngine::global().convert_ref::<T>(self)
    }
}

impl PartialEq for AnyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self.value(), other.value()) {
            (None, None) => true,
            (Some(lhs), Some(rhs)) => lhs.dyn_eq(rhs),
            _ => false,
        }
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "AnyValue({value:?})"),
            None => f.write_str("AnyValue(null)"),
        }
    }
}

impl fmt::Display for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Convertible for AnyValue {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<AnyValue>(TypeKind::Object)
    }

    fn render(&self) -> String {
        match self.value() {
            Some(value) => value.display_string(),
            None => "null".to_string(),
        }
    }

    fn is_null(&self) -> bool {
        self.0.is_none()
    }

    fn inner_value(&self) -> Option<&dyn ErasedValue> {
        self.value()
    }

    fn null_value() -> Option<Self> {
        Some(AnyValue::null())
    }

    fn to_any_value(&self) -> AnyValue {
        self.clone()
    }
}

impl<T: Convertible> From<Option<T>> for AnyValue {
    fn from(value: Option<T>) -> Self {
        value.to_any_value()
    }
}
