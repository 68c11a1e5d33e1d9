//! Raw value serializer
//!
//! [`ValueSerializer`] is a single scalar-sized storage cell used to move
//! register values and wire payloads between typed values and byte buffers
//! without allocation. The cell stores its bytes in little-endian order.
//!
//! Nothing here can fail: copies are always limited to
//! `min(cell size, requested size)` bytes, and bytes that are not copied
//! read back as zero.
//!
//! ```
//! use pinion_core::serializer::TypeSerializer;
//!
//! let mut cell = TypeSerializer::new();
//! cell.insert(0xAABB_CCDDu32);
//!
//! let mut low = [0u8; 2];
//! assert_eq!(cell.unpack(&mut low), 2);
//! assert_eq!(low, [0xDD, 0xCC]);
//! ```

use core::mem::size_of;
use core::ops::{ShlAssign, Shr};

/// Width of the widest supported scalar
pub const MAX_SCALAR_SIZE: usize = 8;

mod sealed {
    pub trait Sealed {}
}

/// Scalar types that can be stored in a [`ValueSerializer`]
pub trait Scalar: Copy + sealed::Sealed {
    /// Size of the value in bytes
    const SIZE: usize;

    /// Write the little-endian representation into `out[..SIZE]`
    fn write_le(self, out: &mut [u8]);

    /// Rebuild a value from the little-endian bytes in `bytes[..SIZE]`
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl Scalar for $t {
                const SIZE: usize = size_of::<$t>();

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$t>::from_le_bytes(raw)
                }
            }
        )*
    };
}

impl_scalar!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// A fixed-size cell holding one packed value at a time
///
/// `N` is the cell size in bytes. The default of 8 fits every [`Scalar`];
/// smaller cells silently truncate wider values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ValueSerializer<const N: usize = MAX_SCALAR_SIZE> {
    cell: [u8; N],
}

/// Serializer sized for the widest supported scalar
pub type TypeSerializer = ValueSerializer<MAX_SCALAR_SIZE>;

impl<const N: usize> Default for ValueSerializer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ValueSerializer<N> {
    /// Size of the internal cell in bytes
    pub const CELL_SIZE: usize = N;

    /// Create a zeroed serializer
    pub const fn new() -> Self {
        Self { cell: [0; N] }
    }

    /// Zero the cell
    pub fn clear(&mut self) {
        self.cell = [0; N];
    }

    /// Raw view of the cell
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.cell
    }

    /// Load the cell from `buffer`
    ///
    /// The cell is cleared first, then `min(N, buffer.len())` bytes are
    /// copied in. Returns the number of bytes copied.
    pub fn pack(&mut self, buffer: &[u8]) -> usize {
        self.clear();
        let count = N.min(buffer.len());
        self.cell[..count].copy_from_slice(&buffer[..count]);
        count
    }

    /// Copy the cell out into `buffer`
    ///
    /// The whole of `buffer` is zero-filled, then `min(N, buffer.len())`
    /// bytes are copied from the cell. Returns the number of bytes copied.
    pub fn unpack(&self, buffer: &mut [u8]) -> usize {
        buffer.fill(0);
        let count = N.min(buffer.len());
        buffer[..count].copy_from_slice(&self.cell[..count]);
        count
    }

    /// Store a typed value
    ///
    /// The full cell is cleared before the value is written so no stale
    /// high-order bytes survive from a wider previous value.
    pub fn insert<T: Scalar>(&mut self, value: T) -> &mut Self {
        self.clear();
        let mut raw = [0u8; MAX_SCALAR_SIZE];
        value.write_le(&mut raw);
        let count = N.min(T::SIZE);
        self.cell[..count].copy_from_slice(&raw[..count]);
        self
    }

    /// Read the cell as a typed value
    ///
    /// This is a reinterpretation of the stored bytes, not a numeric
    /// conversion: a `u32` inserted and extracted as `f32` yields the float
    /// with the same bit pattern.
    pub fn extract<T: Scalar>(&self) -> T {
        let mut raw = [0u8; MAX_SCALAR_SIZE];
        let count = N.min(T::SIZE);
        raw[..count].copy_from_slice(&self.cell[..count]);
        T::read_le(&raw)
    }
}

impl<T: Scalar, const N: usize> ShlAssign<T> for ValueSerializer<N> {
    fn shl_assign(&mut self, value: T) {
        self.insert(value);
    }
}

/// `&cell >> &mut value` extracts into `value`
impl<T: Scalar, const N: usize> Shr<&mut T> for &ValueSerializer<N> {
    type Output = ();

    fn shr(self, target: &mut T) {
        *target = self.extract();
    }
}

impl<T: Scalar> From<T> for TypeSerializer {
    fn from(value: T) -> Self {
        let mut serializer = Self::new();
        serializer.insert(value);
        serializer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_extract_roundtrip() {
        let mut s = TypeSerializer::new();

        s.insert(0xABu8);
        assert_eq!(s.extract::<u8>(), 0xAB);

        s.insert(0xBEEFu16);
        assert_eq!(s.extract::<u16>(), 0xBEEF);

        s.insert(u64::MAX);
        assert_eq!(s.extract::<u64>(), u64::MAX);

        s.insert(-1.5f64);
        assert_eq!(s.extract::<f64>().to_bits(), (-1.5f64).to_bits());
    }

    #[test]
    fn test_insert_clears_stale_bytes() {
        let mut s = TypeSerializer::new();
        s.insert(u64::MAX);
        s.insert(0x12u8);

        assert_eq!(s.extract::<u64>(), 0x12);
        assert_eq!(s.as_bytes(), &[0x12, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_extract_reinterprets_bits() {
        let mut s = TypeSerializer::new();
        s.insert(0x3F80_0000u32);
        assert_eq!(s.extract::<f32>(), 1.0);

        s.insert(1.0f32);
        assert_eq!(s.extract::<u32>(), 0x3F80_0000);
    }

    #[test]
    fn test_unpack_low_bytes() {
        let mut s = TypeSerializer::new();
        s <<= 0xAABB_CCDDu32;

        let mut buf = [0xFFu8; 2];
        assert_eq!(s.unpack(&mut buf), 2);
        assert_eq!(buf, [0xDD, 0xCC]);
    }

    #[test]
    fn test_shift_operators() {
        let mut s = TypeSerializer::new();
        s <<= -2i16;

        let mut narrow = 0i16;
        let mut wide = 0u32;
        let () = &s >> &mut narrow;
        let () = &s >> &mut wide;
        assert_eq!(narrow, -2);
        assert_eq!(wide, 0xFFFE);
    }

    #[test]
    fn test_unpack_zero_fills_past_cell() {
        let s = TypeSerializer::from(0x0102_0304_0506_0708u64);

        let mut buf = [0xFFu8; 12];
        assert_eq!(s.unpack(&mut buf), 8);
        assert_eq!(buf, [8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_pack_truncates_to_cell() {
        let mut s = ValueSerializer::<1>::new();
        let copied = s.pack(&[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);

        assert_eq!(copied, 1);
        assert_eq!(s.as_bytes(), &[0x11]);
        assert_eq!(s.extract::<u32>(), 0x11);
    }

    #[test]
    fn test_pack_short_buffer_clears_rest() {
        let mut s = TypeSerializer::from(u64::MAX);
        assert_eq!(s.pack(&[0x01, 0x02]), 2);
        assert_eq!(s.extract::<u64>(), 0x0201);
    }

    #[test]
    fn test_clear() {
        let mut s = TypeSerializer::from(-7i32);
        s.clear();
        assert_eq!(s.as_bytes(), &[0u8; 8]);
    }
}
