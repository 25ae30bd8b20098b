//! A success value that can be changed in place.
//!
//! [`Outcome`] never changes after construction. [`MutableOk`] is the
//! separate owned cell for call sites that do change their success value,
//! so the type shows where post-construction changes can be observed.

use crate::item::Item;
use crate::outcome::Outcome;
use std::fmt;

/// An exclusively owned, changeable success value.
///
/// # Example
///
/// ```
/// use aletheia_core::{MutableOk, Outcome};
///
/// let mut cell = MutableOk::empty();
/// cell.set(1);
/// cell.update(|old| old.unwrap_or(0) + 1);
///
/// let outcome: Outcome<i32, String> = cell.into_outcome();
/// assert_eq!(outcome.or_else(0), 2);
/// ```
pub struct MutableOk<T> {
    item: Item<T>,
}

impl<T> MutableOk<T> {
    /// Creates a cell holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            item: Item::single(value),
        }
    }

    /// Creates an empty cell.
    #[must_use]
    pub fn empty() -> Self {
        Self { item: Item::none() }
    }

    /// Creates a cell over an existing item.
    #[must_use]
    pub fn from_item(item: Item<T>) -> Self {
        Self { item }
    }

    /// Replaces the contents with `value`. The cell is present afterwards,
    /// whatever it held before.
    pub fn set(&mut self, value: T) {
        self.item = Item::single(value);
    }

    /// Sets `value` and returns the previous first value.
    pub fn replace(&mut self, value: T) -> Option<T> {
        std::mem::replace(&mut self.item, Item::single(value)).into_option()
    }

    /// Removes and returns the first value, leaving the cell empty.
    pub fn take(&mut self) -> Option<T> {
        std::mem::take(&mut self.item).into_option()
    }

    /// Computes the new value from the previous one.
    pub fn update(&mut self, f: impl FnOnce(Option<T>) -> T) {
        let previous = self.take();
        self.set(f(previous));
    }

    /// Returns `true` if a value is present.
    pub fn is_present(&mut self) -> bool {
        self.item.is_present()
    }

    /// Borrows the first value.
    pub fn get(&mut self) -> Option<&T> {
        self.item.first()
    }

    /// Mutably borrows the first value, reducing a sequence to it.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.item.is_many() {
            self.item = std::mem::take(&mut self.item).reduce_first();
        }
        match &mut self.item {
            Item::Single(value) => value.as_mut(),
            Item::Many(_) => None,
        }
    }

    /// Freezes the cell into a success outcome.
    pub fn into_outcome<E>(self) -> Outcome<T, E> {
        Outcome::Ok(self.item)
    }
}

impl<T> Default for MutableOk<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<T> for MutableOk<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for MutableOk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutableOk").field(&self.item).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_makes_present() {
        let mut cell = MutableOk::empty();
        assert!(!cell.is_present());
        cell.set("x");
        assert!(cell.is_present());
        assert_eq!(cell.get(), Some(&"x"));
    }

    #[test]
    fn test_set_over_sequence() {
        let mut cell = MutableOk::from_item(Item::many(Vec::<i32>::new()));
        assert!(!cell.is_present());
        cell.set(3);
        assert_eq!(cell.get(), Some(&3));
    }

    #[test]
    fn test_replace_and_take() {
        let mut cell = MutableOk::new(1);
        assert_eq!(cell.replace(2), Some(1));
        assert_eq!(cell.take(), Some(2));
        assert!(!cell.is_present());
    }

    #[test]
    fn test_update() {
        let mut cell = MutableOk::empty();
        cell.update(|old: Option<i32>| old.map_or(10, |v| v + 1));
        cell.update(|old| old.map_or(10, |v| v + 1));
        assert_eq!(cell.get(), Some(&11));
    }

    #[test]
    fn test_get_mut_reduces_sequence() {
        let mut cell = MutableOk::from_item(Item::many(vec![4, 5]));
        if let Some(value) = cell.get_mut() {
            *value *= 10;
        }
        let outcome: Outcome<i32, ()> = cell.into_outcome();
        assert_eq!(outcome.or_else(0), 40);
    }
}
