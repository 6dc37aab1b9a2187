use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use photon_convert::{Convertible, TypeDescriptor};
use photon_result::{Error, Result};

use crate::column::DETACHED;
use crate::record_set::RecordSet;

/// A row handle.
///
/// A record holds only the identity of the record set it belongs to and its
/// slot there; the row's values live in the record set's columns. Field
/// access therefore takes the owning [`RecordSet`] as an argument and fails
/// with [`Error::InvalidOperation`] when the record is not attached to it.
///
/// `Record` is a shared handle: clones refer to the same row, and equality is
/// identity. Compaction may move a row to another slot; every clone observes
/// the new [`handle`](Self::handle).
#[derive(Clone)]
pub struct Record {
    state: Arc<RecordState>,
}

struct RecordState {
    owner: AtomicU64,
    handle: AtomicUsize,
}

impl Record {
    /// Create a detached record.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RecordState {
                owner: AtomicU64::new(DETACHED),
                handle: AtomicUsize::new(0),
            }),
        }
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.owner() != DETACHED
    }

    /// Slot of this record in its record set, `None` while detached.
    pub fn handle(&self) -> Option<usize> {
        self.is_attached()
            .then(|| self.state.handle.load(Ordering::Acquire))
    }

    pub fn is_attached_to(&self, records: &RecordSet) -> bool {
        self.owner() == records.id()
    }

    pub fn get_field<T: Convertible>(&self, records: &RecordSet, ordinal: usize) -> Result<T> {
        records.get_field(self, ordinal)
    }

    pub fn get_field_by_name<T: Convertible>(&self, records: &RecordSet, name: &str) -> Result<T> {
        records.get_field_by_name(self, name)
    }

    pub fn set_field<T: Convertible>(
        &self,
        records: &mut RecordSet,
        ordinal: usize,
        value: T,
    ) -> Result<bool> {
        records.set_field(self, ordinal, value)
    }

    pub fn set_field_by_name<T: Convertible>(
        &self,
        records: &mut RecordSet,
        name: &str,
        value: T,
    ) -> Result<bool> {
        records.set_field_by_name(self, name, value)
    }

    pub fn is_null(&self, records: &RecordSet, ordinal: usize) -> Result<bool> {
        records.is_null(self, ordinal)
    }

    /// Number of fields (columns) of the owning record set.
    pub fn field_count(&self, records: &RecordSet) -> Result<usize> {
        self.ensure_attached(records)?;
        Ok(records.catalog().len())
    }

    pub fn field_type(&self, records: &RecordSet, ordinal: usize) -> Result<TypeDescriptor> {
        self.ensure_attached(records)?;
        records.column_at(ordinal).map(|column| column.data_type())
    }

    /// Ordinal of the field named `name`.
    pub fn ordinal(&self, records: &RecordSet, name: &str) -> Result<usize> {
        self.ensure_attached(records)?;
        records
            .catalog()
            .ordinal_of(name)
            .ok_or_else(|| Error::column_not_found(name))
    }

    pub fn name<'a>(&self, records: &'a RecordSet, ordinal: usize) -> Result<&'a str> {
        self.ensure_attached(records)?;
        records.column_at(ordinal).map(|column| column.name())
    }

    /// Render the row as `[v1, v2, ...]`, or an empty string when the record
    /// is not attached to `records`.
    pub fn display(&self, records: &RecordSet) -> String {
        records.display_record(self)
    }

    fn ensure_attached(&self, records: &RecordSet) -> Result<()> {
        if self.is_attached_to(records) {
            Ok(())
        } else {
            Err(Error::detached_record())
        }
    }

    #[inline]
    pub(crate) fn owner(&self) -> u64 {
        self.state.owner.load(Ordering::Acquire)
    }

    /// Slot in the record set identified by `owner`.
    pub(crate) fn slot_in(&self, owner: u64) -> Option<usize> {
        (self.owner() == owner).then(|| self.state.handle.load(Ordering::Acquire))
    }

    pub(crate) fn attach(&self, owner: u64, handle: usize) {
        self.state.handle.store(handle, Ordering::Release);
        self.state.owner.store(owner, Ordering::Release);
    }

    pub(crate) fn set_handle(&self, handle: usize) {
        self.state.handle.store(handle, Ordering::Release);
    }

    pub(crate) fn detach(&self) {
        self.state.owner.store(DETACHED, Ordering::Release);
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for Record {}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("handle", &self.handle())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_follow_attachment() {
        let record = Record::new();
        assert!(!record.is_attached());
        assert_eq!(record.handle(), None);

        record.attach(3, 5);
        let alias = record.clone();
        assert_eq!(alias.handle(), Some(5));
        assert_eq!(alias.slot_in(3), Some(5));
        assert_eq!(alias.slot_in(4), None);

        record.set_handle(1);
        assert_eq!(alias.handle(), Some(1));

        record.detach();
        assert_eq!(alias.handle(), None);
        assert_eq!(record, alias);
        assert_ne!(record, Record::new());
    }
}
