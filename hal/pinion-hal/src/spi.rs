//! SPI bus contract
//!
//! Provides the blocking SPI master operations implemented by chip-specific
//! HALs. Chip select is driven in software through [`SpiInterface::select`]
//! and [`SpiInterface::deselect`].

use crate::common::{BitOrder, Mode, Pin};
use crate::error::Result;

/// Default SPI clock in Hz
pub const DEFAULT_FREQUENCY: u32 = 50_000_000;

/// Word clocked out by the plain `read` operations
pub const DEFAULT_FILLER: u8 = 0x00;

/// SPI bus master
pub trait SpiInterface {
    /// Route the bus pins to this controller and start the clock at
    /// `frequency` Hz
    fn init(&mut self, sck: Pin, mosi: Pin, miso: Pin, frequency: u32) -> Result<()>;

    /// Initialise from a [`SpiConfig`], including frame format
    fn init_with(&mut self, config: &SpiConfig) -> Result<()> {
        self.init(config.sck, config.mosi, config.miso, config.frequency)?;
        self.set_format(config.data_bits, config.polarity, config.phase, config.bit_order)
    }

    /// Stop the controller and release the bus pins
    fn deinit(&mut self) -> Result<()>;

    fn is_initialised(&self) -> bool;

    /// Frame format: word size, clock polarity and phase, bit order
    fn set_format(
        &mut self,
        data_bits: u8,
        polarity: ClockPolarity,
        phase: ClockPhase,
        order: BitOrder,
    ) -> Result<()>;

    fn set_mode(&mut self, mode: Mode) -> Result<()>;

    fn mode(&self) -> Mode;

    /// Change the bus clock; returns the rate actually achieved
    fn set_frequency(&mut self, frequency: u32) -> Result<u32>;

    fn frequency(&self) -> u32;

    /// Drive the chip-select line `cs` low
    fn select(&mut self, cs: Pin) -> Result<()>;

    /// Drive the chip-select line `cs` high
    fn deselect(&mut self, cs: Pin) -> Result<()>;

    fn is_readable(&self) -> bool;

    fn is_writable(&self) -> bool;

    /// A transfer is still in progress
    fn is_busy(&self) -> bool;

    /// Clock in `buffer.len()` bytes while sending [`DEFAULT_FILLER`]
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        self.repeated_read(DEFAULT_FILLER, buffer)
    }

    /// Clock in `buffer.len()` 16-bit words while sending zero
    fn read16(&mut self, buffer: &mut [u16]) -> Result<usize> {
        self.repeated_read16(u16::from(DEFAULT_FILLER), buffer)
    }

    /// Clock in `buffer.len()` bytes while repeatedly sending `filler`
    fn repeated_read(&mut self, filler: u8, buffer: &mut [u8]) -> Result<usize>;

    fn repeated_read16(&mut self, filler: u16, buffer: &mut [u16]) -> Result<usize>;

    /// Send `buffer`, discarding whatever is clocked in
    fn write(&mut self, buffer: &[u8]) -> Result<usize>;

    fn write16(&mut self, buffer: &[u16]) -> Result<usize>;

    /// Full-duplex transfer of `min(tx.len(), rx.len())` bytes
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<usize>;
}

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    pub sck: Pin,
    pub mosi: Pin,
    pub miso: Pin,
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Bits per word
    pub data_bits: u8,
    /// Clock polarity
    pub polarity: ClockPolarity,
    /// Clock phase
    pub phase: ClockPhase,
    pub bit_order: BitOrder,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            sck: Pin::new(18),
            mosi: Pin::new(19),
            miso: Pin::new(16),
            frequency: DEFAULT_FREQUENCY,
            data_bits: 8,
            polarity: ClockPolarity::IdleLow,
            phase: ClockPhase::CaptureOnFirstTransition,
            bit_order: BitOrder::MsbFirst,
        }
    }
}

impl SpiConfig {
    /// Apply polarity and phase from a numbered SPI mode
    pub fn with_mode(mut self, mode: SpiMode) -> Self {
        let (polarity, phase): (ClockPolarity, ClockPhase) = mode.into();
        self.polarity = polarity;
        self.phase = phase;
        self
    }
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockPolarity {
    /// Clock idles low (CPOL=0)
    #[default]
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockPhase {
    /// Data captured on first clock transition (CPHA=0)
    #[default]
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiMode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl From<SpiMode> for (ClockPolarity, ClockPhase) {
    fn from(mode: SpiMode) -> Self {
        match mode {
            SpiMode::Mode0 => (ClockPolarity::IdleLow, ClockPhase::CaptureOnFirstTransition),
            SpiMode::Mode1 => (ClockPolarity::IdleLow, ClockPhase::CaptureOnSecondTransition),
            SpiMode::Mode2 => (ClockPolarity::IdleHigh, ClockPhase::CaptureOnFirstTransition),
            SpiMode::Mode3 => (ClockPolarity::IdleHigh, ClockPhase::CaptureOnSecondTransition),
        }
    }
}
