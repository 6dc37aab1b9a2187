//! Ordered, named column metadata of a record set.
//!
//! The catalog owns ordinal assignment: after every mutation the column at
//! position `i` reports ordinal `i`. Names are unique and case-sensitive.

use photon_result::{Error, Result};
use rustc_hash::FxHashMap;

use crate::column::Column;

#[derive(Debug, Default)]
pub struct Catalog {
    columns: Vec<Column>,
    /// Column name -> ordinal
    by_name: FxHashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Column> {
        self.columns.get(ordinal)
    }

    pub fn find(&self, name: &str) -> Option<&Column> {
        self.ordinal_of(name).and_then(|ordinal| self.columns.get(ordinal))
    }

    /// Look up a column by name, failing with [`Error::KeyNotFound`].
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.find(name).ok_or_else(|| Error::column_not_found(name))
    }

    #[inline]
    pub fn ordinal_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    pub(crate) fn insert(&mut self, ordinal: usize, column: Column) {
        self.columns.insert(ordinal, column);
        self.renumber(ordinal);
    }

    pub(crate) fn remove(&mut self, ordinal: usize) -> Column {
        let column = self.columns.remove(ordinal);
        self.by_name.remove(column.name());
        self.renumber(ordinal);
        column
    }

    pub(crate) fn replace(&mut self, ordinal: usize, column: Column) -> Column {
        let old = std::mem::replace(&mut self.columns[ordinal], column);
        self.by_name.remove(old.name());
        self.renumber(ordinal);
        old
    }

    pub(crate) fn clear(&mut self) -> Vec<Column> {
        self.by_name.clear();
        std::mem::take(&mut self.columns)
    }

    /// Reassign ordinals and name entries from `from` onward.
    fn renumber(&mut self, from: usize) {
        for (ordinal, column) in self.columns.iter().enumerate().skip(from) {
            column.set_ordinal(ordinal);
            self.by_name.insert(column.name().to_string(), ordinal);
        }
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_keep_ordinals_dense() {
        let mut catalog = Catalog::new();
        catalog.insert(0, Column::new::<i32>("Id"));
        catalog.insert(1, Column::new::<String>("Greeting"));
        catalog.insert(1, Column::new::<bool>("Flag"));

        let names: Vec<_> = catalog.names().collect();
        assert_eq!(names, vec!["Id", "Flag", "Greeting"]);
        for (ordinal, column) in catalog.iter().enumerate() {
            assert_eq!(column.ordinal(), Some(ordinal));
            assert_eq!(catalog.ordinal_of(column.name()), Some(ordinal));
        }

        let removed = catalog.remove(0);
        assert_eq!(removed.name(), "Id");
        assert_eq!(catalog.ordinal_of("Greeting"), Some(1));
        assert!(catalog.find("Id").is_none());

        let old = catalog.replace(0, Column::new::<u8>("Level"));
        assert_eq!(old.name(), "Flag");
        assert_eq!(catalog.ordinal_of("Level"), Some(0));
        assert!(!catalog.contains_name("Flag"));
    }

    #[test]
    fn unknown_names_are_key_errors() {
        let catalog = Catalog::new();
        assert!(matches!(
            catalog.column("Missing"),
            Err(Error::KeyNotFound(_))
        ));
    }
}
