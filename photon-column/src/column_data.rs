use std::any::Any;
use std::fmt;
use std::sync::Arc;

use photon_convert::{
    AnyValue, ConversionEngine, Convertible, DateTime, Decimal, ErasedValue, TypeDescriptor,
};
use photon_result::{Error, Result};

use crate::nullable::NullableColumnData;
use crate::observers::{ColumnObserver, ObserverId};
use crate::plain::PlainColumnData;

/// Storage for one column across every slot of a record set.
///
/// Implementations hold a value for each slot in `[0, capacity)` regardless of
/// which slots are live. Typed access goes through [`get`](Self::get) and
/// [`set`](Self::set) on `dyn ColumnData`, which convert through the
/// process-wide [`ConversionEngine`] when the requested type differs from the
/// column's native type.
pub trait ColumnData: Send + Sync {
    /// The native (declared) type of the column.
    fn data_type(&self) -> TypeDescriptor;

    fn capacity(&self) -> usize;

    /// Borrow the value at `slot`.
    fn value(&self, slot: usize) -> Result<&dyn ErasedValue>;

    /// Write the value at `slot` into `out` if `out` is an `Option` of the
    /// native type. Returns `false` without touching `out` otherwise.
    fn read_native(&self, slot: usize, out: &mut dyn Any) -> Result<bool>;

    /// Convert and store a pending value. Returns `true` if the cell changed;
    /// observers are notified only in that case.
    fn assign(&mut self, slot: usize, value: &mut dyn Assignable) -> Result<bool>;

    /// Reset `slot` to the default (or absent) value without notifying.
    fn clear(&mut self, slot: usize) -> Result<bool>;

    fn is_null(&self, slot: usize) -> Result<bool>;

    /// Move the value at `from` into `to` without notifying. `from` is left
    /// holding the default value.
    fn move_value(&mut self, from: usize, to: usize) -> Result<()>;

    /// Reallocate to `capacity` slots, keeping the first `preserve` of them.
    fn resize(&mut self, capacity: usize, preserve: usize) -> Result<()>;

    fn subscribe(&self, observer: Arc<dyn ColumnObserver>) -> ObserverId;

    fn unsubscribe(&self, id: ObserverId) -> bool;

    fn as_any(&self) -> &dyn Any;
}

impl dyn ColumnData + '_ {
    /// Read `slot` as `T`, converting from the native type if needed.
    pub fn get<T: Convertible>(&self, slot: usize) -> Result<T> {
        let mut native: Option<T> = None;
        if self.read_native(slot, &mut native)? {
            return native.ok_or_else(|| Error::internal("native read produced no value"));
        }
        ConversionEngine::global().convert_ref::<T>(self.value(slot)?)
    }

    /// Convert `value` to the native type and store it at `slot`.
    ///
    /// Returns `true` if the stored value changed.
    pub fn set<T: Convertible>(&mut self, slot: usize, value: T) -> Result<bool> {
        self.assign(slot, &mut Pending::new(value))
    }

    /// Read `slot` as a boxed value of the native type.
    pub fn get_boxed(&self, slot: usize) -> Result<AnyValue> {
        Ok(self.value(slot)?.boxed())
    }

    pub fn downcast_ref<C: ColumnData + 'static>(&self) -> Option<&C> {
        self.as_any().downcast_ref::<C>()
    }
}

impl fmt::Debug for dyn ColumnData + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnData")
            .field("data_type", &self.data_type().name())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// A value on its way into a column.
///
/// The column takes the value by move when its type matches the native type
/// and converts from the erased view otherwise.
pub trait Assignable {
    fn erased(&self) -> Result<&dyn ErasedValue>;

    /// The pending value as `&mut Option<T>`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Owned [`Assignable`] carrier.
#[derive(Debug)]
pub struct Pending<T>(Option<T>);

impl<T: Convertible> Pending<T> {
    pub fn new(value: T) -> Self {
        Pending(Some(value))
    }
}

impl<T: Convertible> Assignable for Pending<T> {
    fn erased(&self) -> Result<&dyn ErasedValue> {
        self.0
            .as_ref()
            .map(|value| value as &dyn ErasedValue)
            .ok_or_else(|| Error::internal("pending value was already taken"))
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.0
    }
}

/// Take `value` as `N`, by move if it already is one.
pub(crate) fn take_native<N: Convertible>(value: &mut dyn Assignable) -> Result<N> {
    if let Some(native) = value
        .as_any_mut()
        .downcast_mut::<Option<N>>()
        .and_then(Option::take)
    {
        return Ok(native);
    }
    ConversionEngine::global().convert_ref::<N>(value.erased()?)
}

#[inline]
pub(crate) fn check_slot(slot: usize, capacity: usize) -> Result<()> {
    if slot < capacity {
        Ok(())
    } else {
        Err(Error::InvalidArgumentError(format!(
            "slot {slot} is out of range for capacity {capacity}"
        )))
    }
}

/// A type that can be declared as a column type.
///
/// The associated constructor picks the default storage variant: plain for
/// every type except `Option<T>`, which uses nullable storage. Hosts can
/// override the choice per type through
/// [`ColumnDataFactory`](crate::ColumnDataFactory).
pub trait ColumnValue: Convertible + Default {
    fn new_column_data() -> Box<dyn ColumnData> {
        Box::new(PlainColumnData::<Self>::new())
    }
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    fn new_column_data() -> Box<dyn ColumnData> {
        Box::new(NullableColumnData::<T>::new())
    }
}

macro_rules! plain_column_value {
    ($($ty:ty),* $(,)?) => {
        $(impl ColumnValue for $ty {})*
    };
}

plain_column_value!(
    bool, char, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64, Decimal, DateTime, String,
    AnyValue,
);
