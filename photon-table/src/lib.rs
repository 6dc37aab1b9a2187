//! Record sets for the Photon record store.
//!
//! A [`RecordSet`] stores rows column by column: its [`Catalog`] lists the
//! [`Column`]s, each column owns one typed storage array, and each row is a
//! slot index shared by all of them. [`Record`] is the row handle handed to
//! callers.
//!
//! # Example
//!
//! ```
//! use photon_table::{Column, RecordSet};
//!
//! let mut set = RecordSet::new();
//! set.add_column(Column::new::<i32>("Id")).unwrap();
//! set.add_column(Column::new::<String>("Greeting")).unwrap();
//!
//! let row = set.add_new().unwrap();
//! row.set_field(&mut set, 0, 1).unwrap();
//! row.set_field_by_name(&mut set, "Greeting", "Goodbye".to_string()).unwrap();
//!
//! assert_eq!(row.get_field::<String>(&set, 0).unwrap(), "1");
//! assert_eq!(row.display(&set), "[1, Goodbye]");
//! ```

pub mod catalog;
pub mod column;
pub mod config;
pub mod cursor;
pub mod events;
pub mod record;
pub mod record_set;

pub use catalog::Catalog;
pub use column::Column;
pub use config::RecordSetConfig;
pub use cursor::{Iter, RecordCursor, RecordView};
pub use events::{CollectionChange, CollectionObserver, RecordChange, RecordObserver};
pub use record::Record;
pub use record_set::RecordSet;
