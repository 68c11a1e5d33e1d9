//! Bit manipulation helpers for register-sized unsigned integers
//!
//! Every function works in place on the `field` argument (or inspects it)
//! and never fails. Positions at or beyond the bit width of the register
//! produce an empty mask: setters leave the field untouched and
//! [`check_bit`] reports `false`.
//!
//! ```
//! use pinion_core::bits::{set_bit, check_bits, set_bits_pos};
//!
//! let mut reg: u8 = 0;
//! set_bit(&mut reg, 4);
//! assert_eq!(reg, 0b0001_0000);
//!
//! set_bits_pos(&mut reg, 0, 0b11u8);
//! assert!(check_bits(reg, 0b0001_0011));
//! ```

use core::ops::{BitAnd, BitOr, BitXor, Not};

/// Unsigned integer usable as a bit field
pub trait Register:
    Copy
    + Eq
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
{
    /// All bits cleared
    const ZERO: Self;
    /// Only bit 0 set
    const ONE: Self;
    /// Width of the register in bits
    const BITS: u32;

    /// `self << pos`, or zero when `pos` does not fit in the register
    fn shifted(self, pos: u32) -> Self;
}

macro_rules! impl_register {
    ($($t:ty),* $(,)?) => {
        $(
            impl Register for $t {
                const ZERO: Self = 0;
                const ONE: Self = 1;
                const BITS: u32 = <$t>::BITS;

                #[inline]
                fn shifted(self, pos: u32) -> Self {
                    self.checked_shl(pos).unwrap_or(0)
                }
            }
        )*
    };
}

impl_register!(u8, u16, u32, u64, u128, usize);

/// Set the bit at `pos`
#[inline]
pub fn set_bit<T: Register>(field: &mut T, pos: u32) {
    *field = *field | T::ONE.shifted(pos);
}

/// Clear the bit at `pos`
#[inline]
pub fn clear_bit<T: Register>(field: &mut T, pos: u32) {
    *field = *field & !T::ONE.shifted(pos);
}

/// Flip the bit at `pos`
#[inline]
pub fn toggle_bit<T: Register>(field: &mut T, pos: u32) {
    *field = *field ^ T::ONE.shifted(pos);
}

/// Check whether the bit at `pos` is set
#[inline]
pub fn check_bit<T: Register>(field: T, pos: u32) -> bool {
    let mask = T::ONE.shifted(pos);
    mask != T::ZERO && (field & mask) == mask
}

/// Write `mask` into `field` starting at bit `pos`
///
/// The bits covered by `mask << pos` are cleared and then set from the
/// mask, leaving every other bit unchanged.
#[inline]
pub fn set_bits_pos<T: Register>(field: &mut T, pos: u32, mask: T) {
    let shifted = mask.shifted(pos);
    *field = (*field & !shifted) | shifted;
}

/// Set every bit of `mask`
#[inline]
pub fn set_bits<T: Register>(field: &mut T, mask: T) {
    *field = (*field & !mask) | mask;
}

/// Clear every bit of `mask`
#[inline]
pub fn clear_bits<T: Register>(field: &mut T, mask: T) {
    *field = *field & !mask;
}

/// Flip every bit of `mask`
#[inline]
pub fn toggle_bits<T: Register>(field: &mut T, mask: T) {
    *field = *field ^ mask;
}

/// `true` only when all bits of `mask` are set in `field`
#[inline]
pub fn check_bits<T: Register>(field: T, mask: T) -> bool {
    (field & mask) == mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_bit() {
        let mut reg: u8 = 0xFF;
        set_bit(&mut reg, 1);
        assert_eq!(reg, 0b1111_1111);

        let mut reg: u8 = 0xF0;
        set_bit(&mut reg, 3);
        assert_eq!(reg, 0b1111_1000);

        // Out of range position is ignored
        let mut reg: u8 = 0x0F;
        set_bit(&mut reg, 12);
        assert_eq!(reg, 0b0000_1111);
    }

    #[test]
    fn test_clear_bit() {
        let mut reg: u8 = 0xFF;
        clear_bit(&mut reg, 1);
        assert_eq!(reg, 0b1111_1101);

        let mut reg: u8 = 0xF0;
        clear_bit(&mut reg, 3);
        assert_eq!(reg, 0b1111_0000);

        let mut reg: u8 = 0x0F;
        clear_bit(&mut reg, 12);
        assert_eq!(reg, 0b0000_1111);
    }

    #[test]
    fn test_toggle_bit() {
        let mut reg: u8 = 0xFF;
        toggle_bit(&mut reg, 1);
        assert_eq!(reg, 0b1111_1101);
        toggle_bit(&mut reg, 1);
        assert_eq!(reg, 0xFF);

        let mut reg: u32 = 0;
        toggle_bit(&mut reg, 31);
        assert_eq!(reg, 0x8000_0000);
    }

    #[test]
    fn test_check_bit() {
        assert!(check_bit(0b0001_0000u8, 4));
        assert!(!check_bit(0b0001_0000u8, 3));
        assert!(!check_bit(0xFFu8, 8));
        assert!(check_bit(u64::MAX, 63));
    }

    #[test]
    fn test_set_bits_pos() {
        let mut reg: u8 = 0;
        set_bits_pos(&mut reg, 4, 0b1111);
        assert_eq!(reg, 0b1111_0000);

        let mut reg: u16 = 0x00FF;
        set_bits_pos(&mut reg, 8, 0x0F);
        assert_eq!(reg, 0x0FFF);
    }

    #[test]
    fn test_mask_operations() {
        let mut reg: u8 = 0b1111_1111;
        clear_bits(&mut reg, 0b1100_0011);
        assert_eq!(reg, 0b0011_1100);

        let mut reg: u8 = 0b1111_1111;
        toggle_bits(&mut reg, 0b1100_0011);
        assert_eq!(reg, 0b0011_1100);

        let mut reg: u8 = 0;
        set_bits(&mut reg, 0b1010_0000);
        assert_eq!(reg, 0b1010_0000);
    }

    #[test]
    fn test_check_bits_requires_all_bits() {
        assert!(check_bits(0b1011u8, 0b0011));
        assert!(!check_bits(0b1001u8, 0b0011));
        assert!(check_bits(0u8, 0));
    }
}
