//! Flat, slot-addressed value arrays.
//!
//! These are the raw backing stores of the column variants. They know nothing
//! about conversion or observers; they only hold values and report whether a
//! write actually changed anything.

use std::mem;

use photon_result::{Error, Result};
use roaring::RoaringBitmap;

/// Growable flat array of `T`, one cell per slot.
///
/// Every slot in `[0, capacity)` always holds a value; fresh cells hold
/// `T::default()`.
#[derive(Debug, Clone, Default)]
pub struct ColumnStore<T> {
    values: Vec<T>,
}

impl<T: Default + PartialEq> ColumnStore<T> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut store = Self::new();
        store.resize(capacity, 0);
        store
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<&T> {
        self.values.get(slot)
    }

    /// Store `value` at `slot` if it differs from the current cell.
    ///
    /// Returns the previous value when the cell changed, `None` when the value
    /// was equal or the slot is out of range.
    pub fn update(&mut self, slot: usize, value: T) -> Option<T> {
        let cell = self.values.get_mut(slot)?;
        if *cell == value {
            return None;
        }
        Some(mem::replace(cell, value))
    }

    /// Reset `slot` to the default value. Returns `true` if the cell changed.
    pub fn reset(&mut self, slot: usize) -> bool {
        self.update(slot, T::default()).is_some()
    }

    /// Move the value at `from` into `to`, leaving the default behind.
    pub fn move_value(&mut self, from: usize, to: usize) {
        if from == to || to >= self.values.len() {
            return;
        }
        if let Some(cell) = self.values.get_mut(from) {
            let value = mem::take(cell);
            self.values[to] = value;
        }
    }

    /// Reallocate to `capacity` cells, keeping the first `preserve` of them.
    pub fn resize(&mut self, capacity: usize, preserve: usize) {
        self.values.truncate(preserve.min(capacity));
        self.values.resize_with(capacity, T::default);
        self.values.shrink_to(capacity);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }
}

/// A [`ColumnStore`] plus a presence bitmap.
///
/// Absent slots read as `None`. Their backing cell is reset to the default
/// whenever presence is cleared, so an absent slot never keeps a value alive.
#[derive(Debug, Clone, Default)]
pub struct NullableColumnStore<T> {
    values: ColumnStore<T>,
    present: RoaringBitmap,
}

impl<T: Default + PartialEq> NullableColumnStore<T> {
    pub fn new() -> Self {
        Self {
            values: ColumnStore::new(),
            present: RoaringBitmap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut store = Self::new();
        store.resize(capacity, 0)?;
        Ok(store)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    #[inline]
    pub fn is_present(&self, slot: usize) -> bool {
        bit(slot).is_some_and(|bit| self.present.contains(bit))
    }

    /// Number of present slots.
    #[inline]
    pub fn present_count(&self) -> u64 {
        self.present.len()
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        if self.is_present(slot) {
            self.values.get(slot)
        } else {
            None
        }
    }

    /// Store `value` at `slot` if it differs from the current cell.
    ///
    /// Returns the previous value when the cell changed, `None` when the value
    /// was equal or the slot is out of range.
    pub fn update(&mut self, slot: usize, value: Option<T>) -> Option<Option<T>> {
        let bit = bit(slot).filter(|_| slot < self.capacity())?;
        let was_present = self.present.contains(bit);
        match value {
            Some(value) => {
                self.present.insert(bit);
                match self.values.update(slot, value) {
                    Some(old) if was_present => Some(Some(old)),
                    Some(_) => Some(None),
                    // Equal payload: only a presence change counts.
                    None if was_present => None,
                    None => Some(None),
                }
            }
            None if was_present => {
                self.present.remove(bit);
                let old = self.values.update(slot, T::default());
                Some(Some(old.unwrap_or_default()))
            }
            None => None,
        }
    }

    /// Clear presence and reset the backing cell. Returns `true` if the slot
    /// was present.
    pub fn reset(&mut self, slot: usize) -> bool {
        self.update(slot, None).is_some()
    }

    /// Move value and presence from `from` into `to`; `from` becomes absent.
    pub fn move_value(&mut self, from: usize, to: usize) {
        let (Some(from_bit), Some(to_bit)) = (bit(from), bit(to)) else {
            return;
        };
        if from == to || to >= self.capacity() {
            return;
        }
        let was_present = self.present.remove(from_bit);
        self.values.move_value(from, to);
        if was_present {
            self.present.insert(to_bit);
        } else {
            self.present.remove(to_bit);
        }
    }

    /// Reallocate to `capacity` cells, keeping the first `preserve` of them.
    /// Bits beyond the preserved region are dropped; new slots start absent.
    pub fn resize(&mut self, capacity: usize, preserve: usize) -> Result<()> {
        let limit = u32::try_from(capacity)
            .map_err(|_| Error::overflow(capacity, "nullable column capacity"))?;
        let keep = preserve.min(capacity) as u32;
        self.present.remove_range(keep.min(limit)..);
        self.values.resize(capacity, preserve);
        Ok(())
    }
}

#[inline]
fn bit(slot: usize) -> Option<u32> {
    u32::try_from(slot).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_reports_only_real_changes() {
        let mut store = ColumnStore::<i32>::with_capacity(4);
        assert_eq!(store.capacity(), 4);
        assert_eq!(store.update(1, 0), None);
        assert_eq!(store.update(1, 7), Some(0));
        assert_eq!(store.update(1, 7), None);
        assert_eq!(store.update(9, 1), None);
        assert!(store.reset(1));
        assert!(!store.reset(1));
    }

    #[test]
    fn resize_preserves_prefix_and_defaults_new_cells() {
        let mut store = ColumnStore::<String>::with_capacity(3);
        for slot in 0..3 {
            store.update(slot, format!("v{slot}"));
        }
        store.resize(5, 2);
        let values: Vec<_> = store.iter().cloned().collect();
        assert_eq!(values, vec!["v0", "v1", "", "", ""]);
        store.resize(1, 5);
        assert_eq!(store.get(0).map(String::as_str), Some("v0"));
        assert_eq!(store.get(1), None);
    }

    #[test]
    fn nullable_presence_tracks_writes() {
        let mut store = NullableColumnStore::<i64>::with_capacity(4).unwrap();
        assert_eq!(store.get(0), None);
        // Writing the default payload still flips presence.
        assert_eq!(store.update(0, Some(0)), Some(None));
        assert_eq!(store.get(0), Some(&0));
        assert_eq!(store.update(0, Some(0)), None);
        assert_eq!(store.update(0, Some(5)), Some(Some(0)));
        assert_eq!(store.update(0, None), Some(Some(5)));
        assert_eq!(store.update(0, None), None);
        assert_eq!(store.present_count(), 0);
    }

    #[test]
    fn nullable_move_and_resize() {
        let mut store = NullableColumnStore::<u8>::with_capacity(4).unwrap();
        store.update(3, Some(9));
        store.move_value(3, 0);
        assert_eq!(store.get(0), Some(&9));
        assert!(!store.is_present(3));

        store.update(2, Some(1));
        store.resize(2, 2).unwrap();
        assert!(!store.is_present(2));
        store.resize(4, 2).unwrap();
        assert_eq!(store.get(2), None);
        assert_eq!(store.get(0), Some(&9));
    }
}
