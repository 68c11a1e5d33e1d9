//! Fixed-capacity containers
//!
//! All containers size their storage at compile time and never allocate.
//! They are meant as I/O buffers between polling loops and peripheral
//! drivers.
//!
//! - [`Array`] - fixed-length array with checked access
//! - [`RingBuffer`] - overwriting circular buffer
//! - [`BoundedVector`] - push/pop vector with a hard capacity
//! - `Shared` - lock wrapper for use across interrupt contexts
//!   (requires the `sync` feature)

mod array;
mod ring_buffer;
#[cfg(feature = "sync")]
mod shared;
mod vector;

pub use array::Array;
pub use ring_buffer::RingBuffer;
#[cfg(feature = "sync")]
pub use shared::Shared;
pub use vector::BoundedVector;

use core::fmt;

/// Checked access outside the initialised range of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndexOutOfRange {
    /// Requested index
    pub index: usize,
    /// Number of accessible elements at the time of the request
    pub length: usize,
}

impl fmt::Display for IndexOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index {} out of range for length {}", self.index, self.length)
    }
}

/// Push rejected because the container is full
///
/// Carries the element that could not be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapacityExceeded<T>(pub T);

impl<T> CapacityExceeded<T> {
    /// Recover the rejected element
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Display for CapacityExceeded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("container capacity exceeded")
    }
}
