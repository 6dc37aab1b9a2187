use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, AtomicU64, Ordering};

use photon_column::{ColumnData, ColumnDataCtor, ColumnDataFactory, ColumnValue};
use photon_convert::TypeDescriptor;

/// Owner id of a column that belongs to no record set.
pub(crate) const DETACHED: u64 = 0;

static NEXT_ANONYMOUS: AtomicU64 = AtomicU64::new(1);

/// Metadata of one column: name, declared type and position.
///
/// A column is created detached. Inserting it into a record set attaches it
/// and assigns its ordinal, which then follows neighbouring inserts and
/// removals. Removing it detaches it again (no owner, no ordinal).
///
/// `Column` is a shared handle; clones refer to the same column.
#[derive(Clone)]
pub struct Column {
    inner: Arc<ColumnInner>,
}

struct ColumnInner {
    name: String,
    data_type: TypeDescriptor,
    ctor: ColumnDataCtor,
    ordinal: AtomicIsize,
    owner: AtomicU64,
}

impl Column {
    /// Declare a column named `name` holding values of `T`.
    pub fn new<T: ColumnValue>(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ColumnInner {
                name: name.into(),
                data_type: T::descriptor(),
                ctor: T::new_column_data,
                ordinal: AtomicIsize::new(-1),
                owner: AtomicU64::new(DETACHED),
            }),
        }
    }

    /// Declare a column with a generated name (`Column1`, `Column2`, ...).
    pub fn anonymous<T: ColumnValue>() -> Self {
        let n = NEXT_ANONYMOUS.fetch_add(1, Ordering::Relaxed);
        Self::new::<T>(format!("Column{n}"))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    pub fn data_type(&self) -> TypeDescriptor {
        self.inner.data_type
    }

    /// Position in the owning record set, `None` while detached.
    pub fn ordinal(&self) -> Option<usize> {
        usize::try_from(self.inner.ordinal.load(Ordering::Acquire)).ok()
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.owner() != DETACHED
    }

    #[inline]
    pub(crate) fn owner(&self) -> u64 {
        self.inner.owner.load(Ordering::Acquire)
    }

    pub(crate) fn attach(&self, owner: u64) {
        self.inner.owner.store(owner, Ordering::Release);
    }

    pub(crate) fn set_ordinal(&self, ordinal: usize) {
        let ordinal = isize::try_from(ordinal).unwrap_or(isize::MAX);
        self.inner.ordinal.store(ordinal, Ordering::Release);
    }

    pub(crate) fn detach(&self) {
        self.inner.owner.store(DETACHED, Ordering::Release);
        self.inner.ordinal.store(-1, Ordering::Release);
    }

    /// Create empty storage for this column.
    pub(crate) fn create_storage(&self, factory: &ColumnDataFactory) -> Box<dyn ColumnData> {
        factory.create(self.inner.data_type, self.inner.ctor)
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Column {}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name())
            .field("data_type", &self.data_type().name())
            .field("ordinal", &self.ordinal())
            .finish()
    }
}
