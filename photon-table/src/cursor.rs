use std::iter::FusedIterator;

use photon_convert::Convertible;
use photon_result::{Error, Result};

use crate::record::Record;
use crate::record_set::RecordSet;

/// A live record seen through a borrowed record set.
#[derive(Clone, Copy)]
pub struct RecordView<'a> {
    records: &'a RecordSet,
    record: &'a Record,
    slot: usize,
}

impl<'a> RecordView<'a> {
    #[inline]
    pub fn record(&self) -> &'a Record {
        self.record
    }

    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn get<T: Convertible>(&self, ordinal: usize) -> Result<T> {
        self.records.get_field(self.record, ordinal)
    }

    pub fn get_by_name<T: Convertible>(&self, name: &str) -> Result<T> {
        self.records.get_field_by_name(self.record, name)
    }

    pub fn is_null(&self, ordinal: usize) -> Result<bool> {
        self.records.is_null(self.record, ordinal)
    }

    /// Render the row as `[v1, v2, ...]`.
    pub fn display(&self) -> String {
        self.records.display_slot(self.slot)
    }
}

impl std::fmt::Debug for RecordView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordView")
            .field("slot", &self.slot)
            .field("fields", &self.display())
            .finish()
    }
}

/// Borrowing iterator over live records in ascending slot order.
///
/// The borrow rules out structural changes while it is alive; use
/// [`RecordCursor`] to walk a set that may be mutated between steps.
pub struct Iter<'a> {
    records: &'a RecordSet,
    next: usize,
    end: usize,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(records: &'a RecordSet) -> Self {
        Self {
            records,
            next: 0,
            end: records.high_water().map_or(0, |high| high + 1),
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = RecordView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.end {
            let slot = self.next;
            self.next += 1;
            if let Some(record) = self.records.record_at(slot) {
                return Some(RecordView {
                    records: self.records,
                    record,
                    slot,
                });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.end - self.next))
    }
}

impl FusedIterator for Iter<'_> {}

/// Version-checked position in a record set.
///
/// The cursor captures the set's structural version when created. Each step
/// re-checks it and fails with [`Error::ConcurrentModification`] once the set
/// has been structurally modified. Field writes do not invalidate a cursor.
#[derive(Debug, Clone)]
pub struct RecordCursor {
    owner: u64,
    version: u64,
    next: usize,
}

impl RecordCursor {
    pub(crate) fn new(records: &RecordSet) -> Self {
        Self {
            owner: records.id(),
            version: records.version(),
            next: 0,
        }
    }

    /// Advance to the next live record, `Ok(None)` at the end.
    pub fn next_record(&mut self, records: &RecordSet) -> Result<Option<Record>> {
        if records.id() != self.owner {
            return Err(Error::InvalidArgumentError(
                "the cursor belongs to another record set".to_string(),
            ));
        }
        if records.version() != self.version {
            return Err(Error::ConcurrentModification);
        }
        let end = records.high_water().map_or(0, |high| high + 1);
        while self.next < end {
            let slot = self.next;
            self.next += 1;
            if let Some(record) = records.record_at(slot) {
                return Ok(Some(record.clone()));
            }
        }
        Ok(None)
    }
}
