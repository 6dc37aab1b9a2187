//! Slot-addressed column storage for the Photon record store.
//!
//! A column holds one value per slot of its record set, for every slot up to
//! the set's capacity. This crate provides the raw arrays
//! ([`ColumnStore`], [`NullableColumnStore`]), the object-safe
//! [`ColumnData`] interface with its plain and nullable variants, the
//! [`ColumnDataFactory`] that picks a variant per declared type, and the
//! copy-on-write [`ObserverList`] used for change notification.
//!
//! Storage never locks. Callers serialize mutation; observer lists are the one
//! structure that tolerates re-entrant mutation during notification.

pub mod column_data;
pub mod factory;
pub mod nullable;
pub mod observers;
pub mod plain;
pub mod store;

pub use column_data::{Assignable, ColumnData, ColumnValue, Pending};
pub use factory::{ColumnDataCtor, ColumnDataFactory};
pub use nullable::NullableColumnData;
pub use observers::{ColumnChange, ColumnObserver, ObserverId, ObserverList};
pub use plain::PlainColumnData;
pub use store::{ColumnStore, NullableColumnStore};
