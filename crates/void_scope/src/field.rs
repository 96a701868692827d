//! Shared external storage for reflected native members
//!
//! A native struct that wants a table entry to mirror one of its members
//! declares the member as a [`Field`]. The table's external datum and the
//! struct then view the same buffer: a write from either side is visible to
//! the other immediately.
//!
//! A field's length is fixed when it is created. Cloning a field gives the
//! clone its own buffer, so `#[derive(Clone)]` on a reflecting struct yields
//! an independent object; only the table layer creates aliases.

use std::fmt;
use std::sync::Arc;

use parking_lot::{MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Fixed-length buffer shared between a native object and its table
pub struct Field<T> {
    cell: Arc<RwLock<Vec<T>>>,
}

impl<T> Field<T> {
    /// Create a single-element field
    pub fn new(value: T) -> Self {
        Self::from_vec(vec![value])
    }

    /// Create a field holding every element of `values`
    pub fn from_vec(values: Vec<T>) -> Self {
        Self {
            cell: Arc::new(RwLock::new(values)),
        }
    }

    /// A field with no elements, left behind when an external datum is cleared
    pub(crate) fn detached() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Another handle to the same buffer
    pub(crate) fn alias(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }

    /// Whether two handles view the same buffer
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    pub fn len(&self) -> usize {
        self.cell.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock the buffer for reading
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.cell.read()
    }

    /// Lock the buffer for writing. Elements can change, the length cannot.
    pub fn write(&self) -> MappedRwLockWriteGuard<'_, [T]> {
        RwLockWriteGuard::map(self.cell.write(), |values| values.as_mut_slice())
    }

    /// Overwrite the first element
    pub fn set(&self, value: T) {
        self.set_at(0, value);
    }

    /// Overwrite one element, returning false if `index` is out of range
    pub fn set_at(&self, index: usize, value: T) -> bool {
        match self.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

impl<T: Clone> Field<T> {
    /// Read the first element.
    ///
    /// Panics if the field is empty, like indexing an empty slice.
    pub fn get(&self) -> T {
        self.read()[0].clone()
    }

    pub fn get_at(&self, index: usize) -> Option<T> {
        self.read().get(index).cloned()
    }

    /// Copy of every element
    pub fn to_vec(&self) -> Vec<T> {
        self.read().clone()
    }
}

impl<T: Clone> Clone for Field<T> {
    fn clone(&self) -> Self {
        Self::from_vec(self.to_vec())
    }
}

impl<T: Default> Default for Field<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: PartialEq> PartialEq for Field<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.read() == *other.read()
    }
}

impl<T: fmt::Debug> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.read();
        if values.len() == 1 {
            write!(f, "Field({:?})", values[0])
        } else {
            write!(f, "Field({:?})", &*values)
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_shares_buffer() {
        let field = Field::new(10);
        let alias = field.alias();

        alias.set(25);
        assert_eq!(field.get(), 25);
        assert!(field.ptr_eq(&alias));
    }

    #[test]
    fn test_clone_is_independent() {
        let field = Field::new(String::from("hero"));
        let copy = field.clone();

        copy.set("villain".into());
        assert_eq!(field.get(), "hero");
        assert!(!field.ptr_eq(&copy));
    }

    #[test]
    fn test_fixed_length() {
        let field = Field::from_vec(vec![1.0f32, 2.0, 3.0]);

        assert!(field.set_at(2, 9.0));
        assert!(!field.set_at(3, 9.0));
        assert_eq!(field.to_vec(), vec![1.0, 2.0, 9.0]);
        assert_eq!(field.len(), 3);
    }
}
