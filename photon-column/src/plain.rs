use std::any::Any;
use std::sync::Arc;

use photon_convert::{Convertible, ErasedValue, TypeDescriptor};
use photon_result::{Error, Result};

use crate::column_data::{Assignable, ColumnData, check_slot, take_native};
use crate::observers::{ColumnChange, ColumnObserver, ObserverId, ObserverList};
use crate::store::ColumnStore;

/// Column storage holding the native type directly.
///
/// The column's equality rule is `T`'s `PartialEq`.
pub struct PlainColumnData<T> {
    store: ColumnStore<T>,
    observers: ObserverList<dyn ColumnObserver>,
}

impl<T: Convertible + Default> PlainColumnData<T> {
    pub fn new() -> Self {
        Self {
            store: ColumnStore::new(),
            observers: ObserverList::new(),
        }
    }

    pub fn store(&self) -> &ColumnStore<T> {
        &self.store
    }

    fn cell(&self, slot: usize) -> Result<&T> {
        check_slot(slot, self.store.capacity())?;
        self.store
            .get(slot)
            .ok_or_else(|| Error::internal("column cell missing inside capacity"))
    }

    fn notify(&self, slot: usize, old: &T) -> Result<()> {
        let observers = self.observers.snapshot();
        if observers.is_empty() {
            return Ok(());
        }
        let change = ColumnChange {
            column: self,
            slot,
            old,
            new: self.cell(slot)?,
        };
        for (_, observer) in observers.iter() {
            observer.on_change(&change);
        }
        Ok(())
    }
}

impl<T: Convertible + Default> Default for PlainColumnData<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Convertible + Default> ColumnData for PlainColumnData<T> {
    fn data_type(&self) -> TypeDescriptor {
        T::descriptor()
    }

    fn capacity(&self) -> usize {
        self.store.capacity()
    }

    fn value(&self, slot: usize) -> Result<&dyn ErasedValue> {
        let cell: &dyn ErasedValue = self.cell(slot)?;
        Ok(cell)
    }

    fn read_native(&self, slot: usize, out: &mut dyn Any) -> Result<bool> {
        let Some(out) = out.downcast_mut::<Option<T>>() else {
            return Ok(false);
        };
        *out = Some(self.cell(slot)?.clone());
        Ok(true)
    }

    fn assign(&mut self, slot: usize, value: &mut dyn Assignable) -> Result<bool> {
        check_slot(slot, self.store.capacity())?;
        let value = take_native::<T>(value)?;
        match self.store.update(slot, value) {
            Some(old) => {
                self.notify(slot, &old)?;
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
        Ok(Convertible::is_null(self.cell(slot)?))
    }

    fn move_value(&mut self, from: usize, to: usize) -> Result<()> {
        check_slot(from, self.store.capacity())?;
        check_slot(to, self.store.capacity())?;
        self.store.move_value(from, to);
        Ok(())
    }

    fn resize(&mut self, capacity: usize, preserve: usize) -> Result<()> {
        self.store.resize(capacity, preserve);
        Ok(())
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
