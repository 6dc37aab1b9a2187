//! Copy-on-write observer registration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use photon_convert::ErasedValue;

use crate::column_data::ColumnData;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// A committed change of one column cell.
///
/// `old` and `new` are views of the column's native type.
pub struct ColumnChange<'a> {
    pub column: &'a dyn ColumnData,
    pub slot: usize,
    pub old: &'a dyn ErasedValue,
    pub new: &'a dyn ErasedValue,
}

/// Receives cell changes from a [`ColumnData`].
pub trait ColumnObserver: Send + Sync {
    fn on_change(&self, change: &ColumnChange<'_>);
}

impl<F> ColumnObserver for F
where
    F: Fn(&ColumnChange<'_>) + Send + Sync,
{
    fn on_change(&self, change: &ColumnChange<'_>) {
        self(change)
    }
}

type Entries<O> = Arc<[(ObserverId, Arc<O>)]>;

/// Ordered observer registrations.
///
/// Every subscribe/unsubscribe swaps in a new immutable snapshot, so a
/// notification loop iterating an earlier [`snapshot`](Self::snapshot) is
/// unaffected by callbacks that re-subscribe or unsubscribe.
pub struct ObserverList<O: ?Sized> {
    entries: RwLock<Entries<O>>,
    next_id: AtomicU64,
}

impl<O: ?Sized> ObserverList<O> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Arc::from(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self, observer: Arc<O>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.to_vec();
        next.push((id, observer));
        *entries = Arc::from(next);
        id
    }

    /// Returns `true` if `id` was registered.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let next: Vec<_> = entries
            .iter()
            .filter(|(existing, _)| *existing != id)
            .cloned()
            .collect();
        *entries = Arc::from(next);
        true
    }

    /// The current registrations, in subscription order.
    pub fn snapshot(&self) -> Entries<O> {
        Arc::clone(&self.entries.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registration.
    pub fn clear(&self) {
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(Vec::new());
    }
}

impl<O: ?Sized> Default for ObserverList<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized> std::fmt::Debug for ObserverList<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.len())
            .finish()
    }
}
