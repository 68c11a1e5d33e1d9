//! Overwriting circular buffer
//!
//! The read and write cursors only ever increase (with wrapping arithmetic)
//! and are reduced modulo `L` when a slot is accessed, so the unread count is
//! simply `write - read`. Writing into a full buffer overwrites the oldest
//! unread slot and drags the read cursor forward with it: there is no
//! backpressure signal, which keeps `write` constant-time and infallible for
//! interrupt handlers.

/// Circular buffer of `L` slots (`L` must be non-zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RingBuffer<T, const L: usize> {
    slots: [T; L],
    read_pos: usize,
    write_pos: usize,
}

impl<T: Copy + Default, const L: usize> Default for RingBuffer<T, L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const L: usize> RingBuffer<T, L> {
    /// Create an empty buffer with default-initialised slots
    pub fn new() -> Self {
        let () = Self::NON_ZERO;
        Self {
            slots: [T::default(); L],
            read_pos: 0,
            write_pos: 0,
        }
    }

    /// Drop all unread data and reset every slot to `T::default()`
    pub fn clear(&mut self) {
        self.reset();
        self.slots.fill(T::default());
    }
}

impl<T: Copy, const L: usize> RingBuffer<T, L> {
    /// Create an empty buffer with every slot set to `value`
    pub const fn filled(value: T) -> Self {
        let () = Self::NON_ZERO;
        Self {
            slots: [value; L],
            read_pos: 0,
            write_pos: 0,
        }
    }

    /// Store `value`, overwriting the oldest unread value when full
    pub fn write(&mut self, value: T) {
        self.slots[self.write_pos % L] = value;
        self.write_pos = self.write_pos.wrapping_add(1);
        if self.len_raw() > L {
            self.read_pos = self.write_pos.wrapping_sub(L);
        }
    }

    /// Take the oldest unread value, or `None` when empty
    pub fn read(&mut self) -> Option<T> {
        let value = self.peek()?;
        self.read_pos = self.read_pos.wrapping_add(1);
        Some(value)
    }

    /// Look at the oldest unread value without consuming it
    pub fn peek(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        Some(self.slots[self.read_pos % L])
    }

    /// Iterate over unread values, oldest first, without consuming them
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len()).map(move |offset| self.slots[self.read_pos.wrapping_add(offset) % L])
    }
}

impl<T, const L: usize> RingBuffer<T, L> {
    // Evaluated per instantiation, so a zero-slot buffer fails to build
    const NON_ZERO: () = assert!(L > 0, "RingBuffer needs at least one slot");

    /// Number of unread values (never more than `L`)
    pub fn len(&self) -> usize {
        self.len_raw()
    }

    pub fn is_empty(&self) -> bool {
        self.len_raw() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len_raw() == L
    }

    /// Capacity in elements
    pub const fn max_length(&self) -> usize {
        L
    }

    /// Storage size in bytes
    pub const fn size(&self) -> usize {
        core::mem::size_of::<T>() * L
    }

    /// Drop all unread data without touching slot contents
    pub fn reset(&mut self) {
        self.read_pos = self.write_pos;
    }

    fn len_raw(&self) -> usize {
        self.write_pos.wrapping_sub(self.read_pos)
    }
}
