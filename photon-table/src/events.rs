//! Record-level and collection-level notifications.
//!
//! Column storage reports cell changes to a per-column relay observer, which
//! queues them here. The record set drains the queue after each field write
//! and republishes every change, tagged with its record and current ordinal,
//! to the record observers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use photon_column::{ColumnChange, ColumnObserver};
use photon_convert::AnyValue;

use crate::column::Column;
use crate::record::Record;
use crate::record_set::RecordSet;

/// A committed field change.
pub struct RecordChange<'a> {
    pub records: &'a RecordSet,
    pub record: &'a Record,
    pub ordinal: usize,
    pub old: &'a AnyValue,
    pub new: &'a AnyValue,
}

/// Receives every committed field change of a record set.
pub trait RecordObserver: Send + Sync {
    fn on_record_change(&self, change: &RecordChange<'_>);
}

impl<F> RecordObserver for F
where
    F: Fn(&RecordChange<'_>) + Send + Sync,
{
    fn on_record_change(&self, change: &RecordChange<'_>) {
        self(change)
    }
}

/// A structural change of a record set.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionChange {
    Added { record: Record, slot: usize },
    Removed { record: Record, slot: usize },
    /// Every record was removed at once.
    Reset,
}

/// Receives structural changes of a record set.
pub trait CollectionObserver: Send + Sync {
    fn on_collection_change(&self, records: &RecordSet, change: &CollectionChange);
}

impl<F> CollectionObserver for F
where
    F: Fn(&RecordSet, &CollectionChange) + Send + Sync,
{
    fn on_collection_change(&self, records: &RecordSet, change: &CollectionChange) {
        self(records, change)
    }
}

pub(crate) struct PendingChange {
    pub(crate) ordinal: usize,
    pub(crate) slot: usize,
    pub(crate) old: AnyValue,
    pub(crate) new: AnyValue,
}

/// Queue between column observers and record observers.
#[derive(Default)]
pub(crate) struct ChangeRelay {
    /// Set while at least one record observer is registered.
    listening: AtomicBool,
    pending: Mutex<Vec<PendingChange>>,
}

impl ChangeRelay {
    pub(crate) fn set_listening(&self, listening: bool) {
        self.listening.store(listening, Ordering::Release);
    }

    pub(crate) fn drain(&self) -> Vec<PendingChange> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Column observer feeding this relay on behalf of `column`.
    pub(crate) fn observer_for(self: &Arc<Self>, column: Column) -> Arc<dyn ColumnObserver> {
        Arc::new(RelayObserver {
            relay: Arc::clone(self),
            column,
        })
    }
}

struct RelayObserver {
    relay: Arc<ChangeRelay>,
    column: Column,
}

impl ColumnObserver for RelayObserver {
    fn on_change(&self, change: &ColumnChange<'_>) {
        if !self.relay.listening.load(Ordering::Acquire) {
            return;
        }
        let Some(ordinal) = self.column.ordinal() else {
            return;
        };
        self.relay
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PendingChange {
                ordinal,
                slot: change.slot,
                old: change.old.boxed(),
                new: change.new.boxed(),
            });
    }
}
