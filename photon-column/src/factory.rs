use std::any::TypeId;

use photon_convert::{Convertible, TypeDescriptor};
use rustc_hash::FxHashMap;

use crate::column_data::{ColumnData, ColumnValue};

/// Constructor of an empty column storage.
pub type ColumnDataCtor = fn() -> Box<dyn ColumnData>;

/// Chooses the storage variant for a declared column type.
///
/// Without registrations every type gets its default variant (see
/// [`ColumnValue`]). Registrations replace the variant for one exact type.
#[derive(Clone, Default)]
pub struct ColumnDataFactory {
    overrides: FxHashMap<TypeId, ColumnDataCtor>,
}

impl ColumnDataFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `ctor` for columns declared as `T`. Returns the constructor it
    /// replaces, if any.
    pub fn register<T: Convertible>(&mut self, ctor: ColumnDataCtor) -> Option<ColumnDataCtor> {
        tracing::debug!(
            column_type = std::any::type_name::<T>(),
            "registered column storage"
        );
        self.overrides.insert(TypeId::of::<T>(), ctor)
    }

    pub fn is_registered(&self, descriptor: TypeDescriptor) -> bool {
        self.overrides.contains_key(&descriptor.id())
    }

    /// Create empty storage for `descriptor`, falling back to `default_ctor`.
    pub fn create(
        &self,
        descriptor: TypeDescriptor,
        default_ctor: ColumnDataCtor,
    ) -> Box<dyn ColumnData> {
        let ctor = self
            .overrides
            .get(&descriptor.id())
            .copied()
            .unwrap_or(default_ctor);
        ctor()
    }

    /// Create empty storage for a column declared as `T`.
    pub fn create_for<T: ColumnValue>(&self) -> Box<dyn ColumnData> {
        self.create(T::descriptor(), T::new_column_data)
    }
}

impl std::fmt::Debug for ColumnDataFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnDataFactory")
            .field("overrides", &self.overrides.len())
            .finish()
    }
}
