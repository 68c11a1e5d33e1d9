//! Lock wrapper for containers shared with interrupt handlers
//!
//! Every access, reading or writing, goes through the same
//! critical-section mutex. A `read` on a ring buffer moves the read cursor,
//! so it needs exclusive access just like `write`.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::{BoundedVector, CapacityExceeded, RingBuffer};

/// A container guarded by a critical-section mutex
///
/// `new` is `const`, so a `Shared` can live in a `static`:
///
/// ```
/// use pinion_core::containers::{RingBuffer, Shared};
///
/// static RX: Shared<RingBuffer<u8, 64>> = Shared::new(RingBuffer::filled(0));
/// ```
pub struct Shared<C> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<C>>,
}

impl<C> Shared<C> {
    /// Wrap `container`
    pub const fn new(container: C) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(container)),
        }
    }

    /// Run `f` with exclusive access to the container
    pub fn lock<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        self.inner.lock(|cell| f(&mut *cell.borrow_mut()))
    }

    /// Consume the wrapper and return the container
    pub fn into_inner(self) -> C {
        self.inner.into_inner().into_inner()
    }
}

impl<C: Default> Default for Shared<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<T: Copy, const L: usize> Shared<RingBuffer<T, L>> {
    pub fn write(&self, value: T) {
        self.lock(|ring| ring.write(value));
    }

    pub fn read(&self) -> Option<T> {
        self.lock(|ring| ring.read())
    }

    pub fn len(&self) -> usize {
        self.lock(|ring| ring.len())
    }

    pub fn is_empty(&self) -> bool {
        self.lock(|ring| ring.is_empty())
    }
}

impl<T, const L: usize> Shared<BoundedVector<T, L>> {
    pub fn push_back(&self, value: T) -> Result<(), CapacityExceeded<T>> {
        self.lock(|vec| vec.push_back(value))
    }

    pub fn pop_back(&self) -> Option<T> {
        self.lock(|vec| vec.pop_back())
    }

    pub fn len(&self) -> usize {
        self.lock(|vec| vec.len())
    }

    pub fn is_empty(&self) -> bool {
        self.lock(|vec| vec.is_empty())
    }
}
