//! I2C bus contract
//!
//! Provides the blocking I2C master operations implemented by chip-specific
//! HALs, plus the address scan built on top of them.

use crate::common::{Mode, Pin};
use crate::error::Result;

/// Default bus clock in Hz
pub const DEFAULT_FREQUENCY: u32 = 400_000;

/// Highest 7-bit address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Whether `address` lies in one of the reserved ranges `0b0000xxx` or
/// `0b1111xxx`
///
/// Reserved addresses are used for general call, CBUS, high-speed mode and
/// 10-bit addressing, and must not be probed.
pub const fn is_reserved_address(address: u8) -> bool {
    (address & 0x78) == 0 || (address & 0x78) == 0x78
}

/// I2C bus master
///
/// All transfers block until the bus transaction completes or times out.
pub trait I2cInterface {
    /// Route `sda` and `scl` to this controller and start the bus at
    /// `frequency` Hz
    ///
    /// Calling `init` again reconfigures the hardware from scratch.
    fn init(&mut self, sda: Pin, scl: Pin, frequency: u32) -> Result<()>;

    /// Initialise from a [`I2cConfig`]
    fn init_with(&mut self, config: &I2cConfig) -> Result<()> {
        self.init(config.sda, config.scl, config.frequency)
    }

    /// Stop the controller and release both pins
    fn deinit(&mut self) -> Result<()>;

    fn is_initialised(&self) -> bool;

    /// Read `buffer.len()` bytes from the device at `address`
    ///
    /// With `nostop` the bus is held (no STOP condition) so a following
    /// transfer continues with a repeated start. Returns the byte count.
    fn read(&mut self, address: u8, buffer: &mut [u8], nostop: bool) -> Result<usize>;

    /// Write `buffer` to the device at `address`
    fn write(&mut self, address: u8, buffer: &[u8], nostop: bool) -> Result<usize>;

    /// Send a single register-select byte and keep the bus held
    fn select_register(&mut self, address: u8, register: u8) -> Result<()> {
        self.write(address, &[register], true).map(|_| ())
    }

    /// Select `register` then read into `buffer`
    fn read_from(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
        nostop: bool,
    ) -> Result<usize> {
        self.select_register(address, register)?;
        self.read(address, buffer, nostop)
    }

    /// Select `register` then write `buffer`
    fn write_to(&mut self, address: u8, register: u8, buffer: &[u8], nostop: bool) -> Result<usize> {
        self.select_register(address, register)?;
        self.write(address, buffer, nostop)
    }

    /// Move the bus to new pins
    fn set_pins(&mut self, sda: Pin, scl: Pin) -> Result<()>;

    /// Current `(sda, scl)` pins
    fn pins(&self) -> (Pin, Pin);

    /// Change the bus clock; returns the rate actually achieved
    fn set_frequency(&mut self, frequency: u32) -> Result<u32>;

    fn frequency(&self) -> u32;

    /// Bytes waiting in the receive FIFO
    fn readable(&self) -> usize;

    /// Free space in the transmit FIFO
    fn writable(&self) -> usize;

    /// Switch between master and slave; `address` is the slave address
    fn set_mode(&mut self, address: u8, mode: Mode) -> Result<()>;

    /// Probe every address in `start..=stop`
    ///
    /// The range is clamped to [`MAX_ADDRESS`] and to the last index of
    /// `buffer`. For each non-reserved address a one-byte read is attempted
    /// and `buffer[addr]` is set to `addr` when a device answers, `0`
    /// otherwise. Entries of reserved addresses are left untouched.
    ///
    /// Returns the number of devices that answered.
    fn scan(&mut self, buffer: &mut [u8], start: u8, stop: u8) -> usize {
        let Some(last_index) = buffer.len().checked_sub(1) else {
            return 0;
        };
        let last = usize::from(stop.min(MAX_ADDRESS)).min(last_index);

        let mut found = 0;
        let mut rx = [0u8; 1];
        for index in usize::from(start)..=last {
            // `last` is at most MAX_ADDRESS
            let addr = index as u8;
            if is_reserved_address(addr) {
                continue;
            }
            buffer[index] = match self.read(addr, &mut rx, false) {
                Ok(_) => {
                    found += 1;
                    addr
                }
                Err(_) => 0,
            };
        }
        found
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    pub sda: Pin,
    pub scl: Pin,
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::FAST
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz) on the default board pins
    pub const STANDARD: Self = Self::new(Pin::new(4), Pin::new(5), 100_000);

    /// Fast mode (400 kHz) on the default board pins
    pub const FAST: Self = Self::new(Pin::new(4), Pin::new(5), DEFAULT_FREQUENCY);

    /// Fast mode plus (1 MHz) on the default board pins
    pub const FAST_PLUS: Self = Self::new(Pin::new(4), Pin::new(5), 1_000_000);

    pub const fn new(sda: Pin, scl: Pin, frequency: u32) -> Self {
        Self {
            sda,
            scl,
            frequency,
        }
    }

    /// Same clock on different pins
    pub const fn with_pins(self, sda: Pin, scl: Pin) -> Self {
        Self::new(sda, scl, self.frequency)
    }
}
