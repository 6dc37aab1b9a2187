//! Photon: an in-process typed columnar record store.
//!
//! This crate is the entrypoint of the Photon workspace. It re-exports the
//! record set API together with the conversion engine and column storage it
//! is built on, so most users need no other `photon-*` dependency.
//!
//! # Quick Start
//!
//! ```rust
//! use photon::{Column, RecordSet};
//!
//! let mut greetings = RecordSet::new();
//! greetings
//!     .add_columns([Column::new::<i32>("Id"), Column::new::<String>("Greeting")])
//!     .unwrap();
//!
//! let hello = greetings.add_new().unwrap();
//! hello.set_field(&mut greetings, 0, 1).unwrap();
//! hello.set_field(&mut greetings, 1, "Goodbye".to_string()).unwrap();
//!
//! let ids: Vec<i64> = greetings.iter().map(|row| row.get(0).unwrap()).collect();
//! assert_eq!(ids, vec![1]);
//! ```
//!
//! # Architecture
//!
//! Photon is organized as a layered workspace:
//!
//! - **Errors** (`photon-result`): the shared [`Error`] and [`Result`] types.
//! - **Conversion** (`photon-convert`): the [`ConversionEngine`], its strategies and
//!   converter cache, and the [`Convertible`] hooks types expose to it.
//! - **Storage** (`photon-column`): slot-addressed [`ColumnData`] arrays with
//!   per-cell change notification.
//! - **Records** (`photon-table`): [`RecordSet`], its [`Catalog`] and the
//!   [`Record`] handles that address rows.

// Records
pub use photon_table::{
    Catalog, CollectionChange, CollectionObserver, Column, Iter, Record, RecordChange,
    RecordCursor, RecordObserver, RecordSet, RecordSetConfig, RecordView,
};

// Conversion
pub use photon_convert::{
    AnyValue, ConversionEngine, Convertible, Converter, DateTime, Decimal, ErasedValue,
    Integral, Parser, Primitive, PrimitiveKind, Strategy, TypeDescriptor, TypeKind, convert,
    convertible_enum, is_null,
};

pub mod column {
    //! Column storage and column-level change notification.
    //!
    //! Reach a record set's storage through
    //! [`RecordSet::column_data`](crate::RecordSet::column_data).

    pub use photon_column::{
        Assignable, ColumnChange, ColumnData, ColumnDataCtor, ColumnDataFactory,
        ColumnObserver, ColumnStore, ColumnValue, NullableColumnData, NullableColumnStore,
        ObserverId, ObserverList, Pending, PlainColumnData,
    };
}

pub use column::{ColumnValue, ObserverId};

// Re-export result types for error handling
pub use photon_result::{Error, Result};
