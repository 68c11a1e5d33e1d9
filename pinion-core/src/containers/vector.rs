//! Bounded vector backed by `heapless::Vec`

use core::slice::Iter;

use heapless::Vec;

use super::{CapacityExceeded, IndexOutOfRange};

/// Sequential container holding at most `L` elements
///
/// Pushing onto a full vector is rejected without mutation and hands the
/// element back; popping an empty vector is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedVector<T, const L: usize> {
    items: Vec<T, L>,
}

impl<T, const L: usize> Default for BoundedVector<T, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const L: usize> BoundedVector<T, L> {
    /// Create an empty vector
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append `value` if there is room
    pub fn push_back(&mut self, value: T) -> Result<(), CapacityExceeded<T>> {
        self.items.push(value).map_err(CapacityExceeded)
    }

    /// Remove and return the last element
    pub fn pop_back(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Element at `index`, which must be below [`len`](Self::len)
    pub fn at(&self, index: usize) -> Result<&T, IndexOutOfRange> {
        let length = self.items.len();
        self.items.get(index).ok_or(IndexOutOfRange { index, length })
    }

    /// Mutable element at `index`, which must be below [`len`](Self::len)
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, IndexOutOfRange> {
        let length = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(IndexOutOfRange { index, length })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    /// Capacity in elements
    pub const fn max_length(&self) -> usize {
        L
    }

    /// Remove every element
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.items.iter()
    }
}

impl<T: Clone, const L: usize> BoundedVector<T, L> {
    /// Append as many elements of `values` as fit
    ///
    /// Returns the number of elements stored.
    pub fn extend_from_slice(&mut self, values: &[T]) -> usize {
        let room = L - self.items.len();
        let count = room.min(values.len());
        for value in &values[..count] {
            // Cannot fail: `count` never exceeds the remaining room
            let _ = self.items.push(value.clone());
        }
        count
    }
}

#[cfg(feature = "defmt")]
impl<T: defmt::Format, const L: usize> defmt::Format for BoundedVector<T, L> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.as_slice())
    }
}

impl<'a, T, const L: usize> IntoIterator for &'a BoundedVector<T, L> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
