//! Value types shared across peripheral classes

use core::fmt;

/// A physical pin, identified by its GPIO number
///
/// This is a plain value: which numbers are valid is decided by the chip
/// crate when the pin is handed to a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u8);

impl Pin {
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    /// GPIO number
    pub const fn number(self) -> u8 {
        self.0
    }
}

impl From<u8> for Pin {
    fn from(number: u8) -> Self {
        Self(number)
    }
}

impl From<Pin> for u8 {
    fn from(pin: Pin) -> Self {
        pin.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Bus role of a peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Slave,
    #[default]
    Master,
}

/// Order in which the bits of a word are shifted out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    LsbFirst,
    #[default]
    MsbFirst,
}
