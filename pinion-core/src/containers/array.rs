//! Fixed-length array with bounds-checked access

use core::slice::{Iter, IterMut};

use super::IndexOutOfRange;

/// Array of exactly `L` elements
///
/// Unlike indexing a raw array, [`Array::at`] reports an out-of-range index
/// as an error instead of panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Array<T, const L: usize> {
    items: [T; L],
}

impl<T: Copy + Default, const L: usize> Default for Array<T, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const L: usize> Array<T, L> {
    /// Create an array filled with `T::default()`
    pub fn new() -> Self {
        Self::filled(T::default())
    }
}

impl<T: Copy, const L: usize> Array<T, L> {
    /// Create an array with every slot set to `value`
    pub fn filled(value: T) -> Self {
        Self { items: [value; L] }
    }

    /// Overwrite every slot with `value`
    pub fn fill(&mut self, value: T) {
        self.items.fill(value);
    }
}

impl<T, const L: usize> Array<T, L> {
    /// Wrap an existing array
    pub const fn from_array(items: [T; L]) -> Self {
        Self { items }
    }

    /// Element at `index`
    pub fn at(&self, index: usize) -> Result<&T, IndexOutOfRange> {
        self.items
            .get(index)
            .ok_or(IndexOutOfRange { index, length: L })
    }

    /// Mutable element at `index`
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, IndexOutOfRange> {
        self.items
            .get_mut(index)
            .ok_or(IndexOutOfRange { index, length: L })
    }

    /// Number of elements (always `L`)
    pub const fn len(&self) -> usize {
        L
    }

    /// `true` for a zero-length array
    pub const fn is_empty(&self) -> bool {
        L == 0
    }

    /// Storage size in bytes
    pub const fn size(&self) -> usize {
        core::mem::size_of::<T>() * L
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<T, const L: usize> From<[T; L]> for Array<T, L> {
    fn from(items: [T; L]) -> Self {
        Self::from_array(items)
    }
}

impl<'a, T, const L: usize> IntoIterator for &'a Array<T, L> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
