//! The record set: catalog, column storage and slot management.
//!
//! Every row occupies a slot (handle) that indexes all column arrays in
//! parallel. Slots move through `Free -> Reserved -> Live -> Removed -> Free`:
//! `add` reserves a slot from the free pool (most recently freed first) or by
//! extending the high-water mark, and attaches the record to it; `remove`
//! clears every cell of the slot before returning it to the pool.
//!
//! Invariants maintained by every operation:
//! - `columns[i]` stores `catalog[i]`'s declared type and `catalog[i]` reports
//!   ordinal `i`
//! - every slot at or below the high-water mark is either live or pooled; the
//!   pool holds nothing above it
//! - `capacity > high_water`
//!
//! The set performs no locking. Mutation takes `&mut self`; callers that share
//! a set across threads serialize writers themselves.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use photon_column::{ColumnData, ColumnDataFactory, ColumnStore, ObserverId, ObserverList};
use photon_convert::Convertible;
use photon_result::{Error, Result};

use crate::catalog::Catalog;
use crate::column::{Column, DETACHED};
use crate::config::RecordSetConfig;
use crate::cursor::{Iter, RecordCursor};
use crate::events::{
    ChangeRelay, CollectionChange, CollectionObserver, RecordChange, RecordObserver,
};
use crate::record::Record;

static NEXT_RECORD_SET_ID: AtomicU64 = AtomicU64::new(DETACHED + 1);

/// Storage of one catalog column plus its relay subscription.
struct ColumnSlot {
    data: Box<dyn ColumnData>,
    relay: ObserverId,
}

/// A collection of records stored column by column.
pub struct RecordSet {
    id: u64,
    catalog: Catalog,
    columns: Vec<ColumnSlot>,
    /// Slot -> record living there.
    records: ColumnStore<Option<Record>>,
    /// Free slots below the high-water mark; popped LIFO.
    free: Vec<usize>,
    count: usize,
    high_water: Option<usize>,
    version: u64,
    record_observers: ObserverList<dyn RecordObserver>,
    collection_observers: ObserverList<dyn CollectionObserver>,
    relay: Arc<ChangeRelay>,
    factory: Arc<ColumnDataFactory>,
    config: RecordSetConfig,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::with_config(RecordSetConfig::default())
    }

    pub fn with_config(config: RecordSetConfig) -> Self {
        let id = NEXT_RECORD_SET_ID.fetch_add(1, Ordering::Relaxed);
        let mut set = Self {
            id,
            catalog: Catalog::new(),
            columns: Vec::new(),
            records: ColumnStore::new(),
            free: Vec::new(),
            count: 0,
            high_water: None,
            version: 0,
            record_observers: ObserverList::new(),
            collection_observers: ObserverList::new(),
            relay: Arc::new(ChangeRelay::default()),
            factory: Arc::new(ColumnDataFactory::new()),
            config,
        };
        // No columns exist yet, so only the records array is allocated.
        set.records.resize(config.initial_capacity, 0);
        set
    }

    /// Use `factory` to create storage for columns added from now on.
    pub fn with_factory(mut self, factory: Arc<ColumnDataFactory>) -> Self {
        self.factory = factory;
        self
    }

    #[inline]
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub(crate) fn high_water(&self) -> Option<usize> {
        self.high_water
    }

    #[inline]
    pub(crate) fn record_at(&self, slot: usize) -> Option<&Record> {
        self.records.get(slot).and_then(Option::as_ref)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> RecordSetConfig {
        self.config
    }

    /// Number of live records.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of allocated slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    pub fn contains(&self, record: &Record) -> bool {
        record
            .slot_in(self.id)
            .and_then(|slot| self.record_at(slot))
            .is_some_and(|live| live == record)
    }

    /// Storage of the column at `ordinal`, for column-level subscriptions.
    pub fn column_data(&self, ordinal: usize) -> Option<&dyn ColumnData> {
        self.columns.get(ordinal).map(|slot| &*slot.data)
    }

    pub(crate) fn column_at(&self, ordinal: usize) -> Result<&Column> {
        self.catalog
            .get(ordinal)
            .ok_or_else(|| ordinal_out_of_range(ordinal, self.catalog.len()))
    }

    // ========================================================================
    // Rows
    // ========================================================================

    /// Attach `record` to this set.
    ///
    /// Fails with [`Error::InvalidArgumentError`] if the record is already
    /// attached here or to another record set.
    pub fn add(&mut self, record: &Record) -> Result<()> {
        if record.is_attached() {
            let whose = if record.owner() == self.id {
                "this"
            } else {
                "another"
            };
            return Err(Error::InvalidArgumentError(format!(
                "the record already belongs to {whose} record set"
            )));
        }

        let required = self.count + 1;
        if self.capacity() < required {
            let grown = self.config.grown_capacity(self.capacity(), required);
            self.resize_storage(grown)?;
        }

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => self.high_water.map_or(0, |high| high + 1),
        };
        record.attach(self.id, slot);
        self.records.update(slot, Some(record.clone()));
        self.high_water = Some(self.high_water.map_or(slot, |high| high.max(slot)));
        self.count += 1;
        self.version += 1;

        self.notify_collection(&CollectionChange::Added {
            record: record.clone(),
            slot,
        });
        Ok(())
    }

    /// Create a record, attach it and return it.
    pub fn add_new(&mut self) -> Result<Record> {
        let record = Record::new();
        self.add(&record)?;
        Ok(record)
    }

    /// Detach `record` from this set.
    ///
    /// Returns `false`, and does nothing, when the record is not live in this
    /// set.
    pub fn remove(&mut self, record: &Record) -> bool {
        if !self.contains(record) {
            return false;
        }
        let Some(slot) = record.slot_in(self.id) else {
            return false;
        };

        self.clear_slot(slot);
        self.records.update(slot, None);
        record.detach();
        self.free.push(slot);
        if self.high_water == Some(slot) {
            self.lower_high_water(slot);
        }
        self.count -= 1;
        self.version += 1;

        self.notify_collection(&CollectionChange::Removed {
            record: record.clone(),
            slot,
        });
        true
    }

    /// Detach every record and release all slot storage.
    pub fn clear(&mut self) -> Result<()> {
        for record in self.records.iter().flatten() {
            record.detach();
        }
        for column in &mut self.columns {
            column.data.resize(0, 0)?;
        }
        self.records.resize(0, 0);
        self.free.clear();
        self.count = 0;
        self.high_water = None;
        self.version += 1;
        tracing::debug!(record_set = self.id, "cleared record set");

        self.notify_collection(&CollectionChange::Reset);
        Ok(())
    }

    /// Change the number of allocated slots.
    ///
    /// Growing keeps every row in place. Shrinking first compacts live rows
    /// into `[0, capacity)`. Fails with [`Error::InvalidOperation`] when
    /// `capacity` is below the number of live records.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        if capacity < self.count {
            return Err(Error::InvalidOperation(format!(
                "capacity {capacity} is below the record count {}",
                self.count
            )));
        }
        if capacity == self.capacity() {
            return Ok(());
        }
        if capacity < self.capacity() {
            self.compact_to(capacity)?;
        }
        self.resize_storage(capacity)?;
        self.version += 1;
        Ok(())
    }

    /// Move live rows down so they occupy `[0, len)`.
    pub fn compact(&mut self) -> Result<()> {
        self.compact_to(self.count)
    }

    /// Relocate rows until the high-water mark is below `floor`.
    ///
    /// Each step moves the row at the high-water mark into the largest pooled
    /// slot. `floor` must be at least the live count.
    fn compact_to(&mut self, floor: usize) -> Result<()> {
        let mut moved = 0usize;
        while let Some(high) = self.high_water {
            if high < floor {
                break;
            }
            let Some((index, target)) = self
                .free
                .iter()
                .copied()
                .enumerate()
                .max_by_key(|&(_, slot)| slot)
            else {
                break;
            };
            self.free.swap_remove(index);

            for column in &mut self.columns {
                column.data.move_value(high, target)?;
                column.data.clear(high)?;
            }
            self.records.move_value(high, target);
            if let Some(record) = self.record_at(target) {
                record.set_handle(target);
            }
            tracing::trace!(from = high, to = target, "compacted record");

            self.lower_high_water(high);
            moved += 1;
        }

        if moved > 0 {
            self.version += 1;
            tracing::debug!(record_set = self.id, moved, "compacted record set");
        }
        Ok(())
    }

    /// Reallocate every column to `capacity`, preserving `[0, high_water]`.
    fn resize_storage(&mut self, capacity: usize) -> Result<()> {
        let from = self.capacity();
        let preserve = self.high_water.map_or(0, |high| high + 1);
        for column in &mut self.columns {
            column.data.resize(capacity, preserve)?;
        }
        self.records.resize(capacity, preserve);
        tracing::debug!(
            record_set = self.id,
            from,
            capacity,
            "resized record set"
        );
        Ok(())
    }

    /// Reset every cell of `slot`.
    fn clear_slot(&mut self, slot: usize) {
        for column in &mut self.columns {
            if let Err(err) = column.data.clear(slot) {
                tracing::warn!(slot, %err, "failed to clear removed slot");
            }
        }
    }

    /// Lower the high-water mark to the last live slot below `from` and drop
    /// pooled slots above it.
    fn lower_high_water(&mut self, from: usize) {
        self.high_water = (0..from).rev().find(|&slot| self.record_at(slot).is_some());
        match self.high_water {
            Some(high) => self.free.retain(|&slot| slot < high),
            None => self.free.clear(),
        }
    }

    fn slot_of(&self, record: &Record) -> Result<usize> {
        record
            .slot_in(self.id)
            .ok_or_else(Error::detached_record)
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Read field `ordinal` of `record` as `T`.
    pub fn get_field<T: Convertible>(&self, record: &Record, ordinal: usize) -> Result<T> {
        let slot = self.slot_of(record)?;
        self.data(ordinal)?.get::<T>(slot)
    }

    pub fn get_field_by_name<T: Convertible>(&self, record: &Record, name: &str) -> Result<T> {
        let ordinal = self.ordinal_of(name)?;
        self.get_field(record, ordinal)
    }

    /// Write field `ordinal` of `record`. Returns `true` if the value changed,
    /// in which case record observers have been notified.
    pub fn set_field<T: Convertible>(
        &mut self,
        record: &Record,
        ordinal: usize,
        value: T,
    ) -> Result<bool> {
        let slot = self.slot_of(record)?;
        let len = self.columns.len();
        let column = self
            .columns
            .get_mut(ordinal)
            .ok_or_else(|| ordinal_out_of_range(ordinal, len))?;
        let changed = column.data.set(slot, value)?;
        if changed {
            self.publish_record_changes();
        }
        Ok(changed)
    }

    pub fn set_field_by_name<T: Convertible>(
        &mut self,
        record: &Record,
        name: &str,
        value: T,
    ) -> Result<bool> {
        let ordinal = self.ordinal_of(name)?;
        self.set_field(record, ordinal, value)
    }

    pub fn is_null(&self, record: &Record, ordinal: usize) -> Result<bool> {
        let slot = self.slot_of(record)?;
        self.data(ordinal)?.is_null(slot)
    }

    pub(crate) fn display_slot(&self, slot: usize) -> String {
        let fields: Vec<String> = self
            .columns
            .iter()
            .map(|column| match column.data.is_null(slot) {
                Ok(true) => "Null".to_string(),
                Ok(false) => column
                    .data
                    .value(slot)
                    .map(|value| value.display_string())
                    .unwrap_or_default(),
                Err(_) => String::new(),
            })
            .collect();
        format!("[{}]", fields.join(", "))
    }

    pub(crate) fn display_record(&self, record: &Record) -> String {
        match record.slot_in(self.id) {
            Some(slot) => self.display_slot(slot),
            None => String::new(),
        }
    }

    fn data(&self, ordinal: usize) -> Result<&dyn ColumnData> {
        self.column_data(ordinal)
            .ok_or_else(|| ordinal_out_of_range(ordinal, self.columns.len()))
    }

    fn ordinal_of(&self, name: &str) -> Result<usize> {
        self.catalog
            .ordinal_of(name)
            .ok_or_else(|| Error::column_not_found(name))
    }

    // ========================================================================
    // Columns
    // ========================================================================

    pub fn add_column(&mut self, column: Column) -> Result<()> {
        self.insert_column(self.catalog.len(), column)
    }

    /// Add `columns` in order. Stops at the first failure; columns added
    /// before it stay.
    pub fn add_columns<I>(&mut self, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = Column>,
    {
        for column in columns {
            self.add_column(column)?;
        }
        Ok(())
    }

    /// Insert `column` at `ordinal`, shifting later columns right.
    ///
    /// Existing rows read the new column's default value.
    pub fn insert_column(&mut self, ordinal: usize, column: Column) -> Result<()> {
        if ordinal > self.catalog.len() {
            return Err(ordinal_out_of_range(ordinal, self.catalog.len() + 1));
        }
        self.validate_new_column(&column, None)?;

        let slot = self.create_column_slot(&column)?;
        column.attach(self.id);
        self.catalog.insert(ordinal, column.clone());
        self.columns.insert(ordinal, slot);
        tracing::debug!(
            record_set = self.id,
            column = column.name(),
            ordinal,
            "attached column"
        );
        Ok(())
    }

    /// Remove the column at `ordinal`, shifting later columns left. The
    /// returned column is detached.
    pub fn remove_column(&mut self, ordinal: usize) -> Result<Column> {
        if ordinal >= self.catalog.len() {
            return Err(ordinal_out_of_range(ordinal, self.catalog.len()));
        }
        let column = self.catalog.remove(ordinal);
        let slot = self.columns.remove(ordinal);
        slot.data.unsubscribe(slot.relay);
        column.detach();
        tracing::debug!(
            record_set = self.id,
            column = column.name(),
            ordinal,
            "detached column"
        );
        Ok(column)
    }

    /// Replace the column at `ordinal` with `column`, discarding the old
    /// column's values. Returns the detached old column.
    ///
    /// Replacing a column with itself keeps its values and returns it.
    pub fn replace_column(&mut self, ordinal: usize, column: Column) -> Result<Column> {
        let Some(old) = self.catalog.get(ordinal).cloned() else {
            return Err(ordinal_out_of_range(ordinal, self.catalog.len()));
        };
        if old == column {
            return Ok(column);
        }
        self.validate_new_column(&column, Some(&old))?;

        let slot = self.create_column_slot(&column)?;
        column.attach(self.id);
        self.catalog.replace(ordinal, column.clone());
        let previous = std::mem::replace(&mut self.columns[ordinal], slot);
        previous.data.unsubscribe(previous.relay);
        old.detach();
        tracing::debug!(
            record_set = self.id,
            old = old.name(),
            column = column.name(),
            ordinal,
            "replaced column"
        );
        Ok(old)
    }

    /// Remove every column. Rows stay attached with no fields.
    pub fn clear_columns(&mut self) {
        for (column, slot) in self.catalog.clear().into_iter().zip(self.columns.drain(..)) {
            slot.data.unsubscribe(slot.relay);
            column.detach();
        }
        tracing::debug!(record_set = self.id, "cleared columns");
    }

    fn validate_new_column(&self, column: &Column, replacing: Option<&Column>) -> Result<()> {
        if column.is_attached() {
            let whose = if column.owner() == self.id {
                "this"
            } else {
                "another"
            };
            return Err(Error::InvalidArgumentError(format!(
                "column '{}' already belongs to {whose} record set",
                column.name()
            )));
        }
        let renames_itself = replacing.is_some_and(|old| old.name() == column.name());
        if !renames_itself && self.catalog.contains_name(column.name()) {
            return Err(Error::InvalidArgumentError(format!(
                "a column named '{}' already exists",
                column.name()
            )));
        }
        Ok(())
    }

    /// Build storage for `column` through the factory.
    ///
    /// Overrides may pick the nullable variant of the declared type, but
    /// never storage of another type.
    fn create_column_slot(&self, column: &Column) -> Result<ColumnSlot> {
        let mut data = column.create_storage(&self.factory);
        let stored = data.data_type();
        if stored.underlying() != column.data_type().underlying() {
            return Err(Error::InvalidArgumentError(format!(
                "storage of type {} cannot hold column '{}' declared as {}",
                stored.name(),
                column.name(),
                column.data_type().name()
            )));
        }
        data.resize(self.capacity(), 0)?;
        let relay = data.subscribe(self.relay.observer_for(column.clone()));
        Ok(ColumnSlot { data, relay })
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Live records in ascending slot order.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }

    /// A version-checked cursor that does not borrow the set.
    ///
    /// Stepping it after any structural change (add, remove, capacity change,
    /// compaction, clear) fails with [`Error::ConcurrentModification`].
    pub fn cursor(&self) -> RecordCursor {
        RecordCursor::new(self)
    }

    // ========================================================================
    // Observers
    // ========================================================================

    pub fn subscribe(&self, observer: Arc<dyn RecordObserver>) -> ObserverId {
        let id = self.record_observers.subscribe(observer);
        self.relay.set_listening(true);
        id
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let removed = self.record_observers.unsubscribe(id);
        self.relay.set_listening(!self.record_observers.is_empty());
        removed
    }

    pub fn subscribe_collection(&self, observer: Arc<dyn CollectionObserver>) -> ObserverId {
        self.collection_observers.subscribe(observer)
    }

    pub fn unsubscribe_collection(&self, id: ObserverId) -> bool {
        self.collection_observers.unsubscribe(id)
    }

    fn publish_record_changes(&self) {
        let pending = self.relay.drain();
        if pending.is_empty() {
            return;
        }
        let observers = self.record_observers.snapshot();
        for change in &pending {
            let Some(record) = self.record_at(change.slot) else {
                continue;
            };
            let change = RecordChange {
                records: self,
                record,
                ordinal: change.ordinal,
                old: &change.old,
                new: &change.new,
            };
            for (_, observer) in observers.iter() {
                observer.on_record_change(&change);
            }
        }
    }

    fn notify_collection(&self, change: &CollectionChange) {
        for (_, observer) in self.collection_observers.snapshot().iter() {
            observer.on_collection_change(self, change);
        }
    }
}

impl Drop for RecordSet {
    fn drop(&mut self) {
        for record in self.records.iter().flatten() {
            record.detach();
        }
        for column in self.catalog.iter() {
            column.detach();
        }
    }
}

impl Default for RecordSet {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = crate::cursor::RecordView<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSet")
            .field("id", &self.id)
            .field("columns", &self.catalog.names().collect::<Vec<_>>())
            .field("len", &self.count)
            .field("capacity", &self.capacity())
            .field("high_water", &self.high_water)
            .field("version", &self.version)
            .finish()
    }
}

fn ordinal_out_of_range(ordinal: usize, len: usize) -> Error {
    Error::InvalidArgumentError(format!(
        "column ordinal {ordinal} is out of range for {len} columns"
    ))
}
