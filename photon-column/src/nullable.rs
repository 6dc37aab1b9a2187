use std::any::Any;
use std::sync::Arc;

use photon_convert::{Convertible, ErasedValue, TypeDescriptor};
use photon_result::Result;

use crate::column_data::{Assignable, ColumnData, check_slot, take_native};
use crate::observers::{ColumnChange, ColumnObserver, ObserverId, ObserverList};
use crate::store::NullableColumnStore;

/// Column storage for `Option<T>` backed by a flat `T` array plus a presence
/// bitmap.
///
/// The native type is `Option<T>`. Absent slots read as `None` whatever their
/// backing cell holds.
pub struct NullableColumnData<T> {
    store: NullableColumnStore<T>,
    observers: ObserverList<dyn ColumnObserver>,
    null: Option<T>,
}

impl<T: Convertible + Default> NullableColumnData<T> {
    pub fn new() -> Self {
        Self {
            store: NullableColumnStore::new(),
            observers: ObserverList::new(),
            null: None,
        }
    }

    pub fn store(&self) -> &NullableColumnStore<T> {
        &self.store
    }

    fn notify(&self, slot: usize, old: &Option<T>) {
        let observers = self.observers.snapshot();
        if observers.is_empty() {
            return;
        }
        let new = self.store.get(slot).cloned();
        let change = ColumnChange {
            column: self,
            slot,
            old,
            new: &new,
        };
        for (_, observer) in observers.iter() {
            observer.on_change(&change);
        }
    }
}

impl<T: Convertible + Default> Default for NullableColumnData<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Convertible + Default> ColumnData for NullableColumnData<T> {
    fn data_type(&self) -> TypeDescriptor {
        <Option<T>>::descriptor()
    }

    fn capacity(&self) -> usize {
        self.store.capacity()
    }

    fn value(&self, slot: usize) -> Result<&dyn ErasedValue> {
        check_slot(slot, self.store.capacity())?;
        let value: &dyn ErasedValue = match self.store.get(slot) {
            Some(value) => value,
            None => &self.null,
        };
        Ok(value)
    }

    fn read_native(&self, slot: usize, out: &mut dyn Any) -> Result<bool> {
        let Some(out) = out.downcast_mut::<Option<Option<T>>>() else {
            return Ok(false);
        };
        check_slot(slot, self.store.capacity())?;
        *out = Some(self.store.get(slot).cloned());
        Ok(true)
    }

    fn assign(&mut self, slot: usize, value: &mut dyn Assignable) -> Result<bool> {
        check_slot(slot, self.store.capacity())?;
        let value = take_native::<Option<T>>(value)?;
        match self.store.update(slot, value) {
            Some(old) => {
                self.notify(slot, &old);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&mut self, slot: usize) -> Result<bool> {
        check_slot(slot, self.store.capacity())?;
        Ok(self.store.reset(slot))
    }

    fn is_null(&self, slot: usize) -> Result<bool> {
        check_slot(slot, self.store.capacity())?;
        Ok(!self.store.is_present(slot))
    }

    fn move_value(&mut self, from: usize, to: usize) -> Result<()> {
        check_slot(from, self.store.capacity())?;
        check_slot(to, self.store.capacity())?;
        self.store.move_value(from, to);
        Ok(())
    }

    fn resize(&mut self, capacity: usize, preserve: usize) -> Result<()> {
        self.store.resize(capacity, preserve)
    }

    fn subscribe(&self, observer: Arc<dyn ColumnObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    fn unsubscribe(&self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
