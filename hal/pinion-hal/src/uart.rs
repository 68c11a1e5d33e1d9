//! UART serial communication contract
//!
//! Provides the blocking serial operations implemented by chip-specific
//! HALs. Exact baud rates are not always attainable; drivers pick the
//! closest rate their clock dividers allow and report it back.

use crate::common::Pin;
use crate::error::Result;

/// Default baud rate
pub const DEFAULT_BAUDRATE: u32 = 115_200;

/// UART transceiver
pub trait UartInterface {
    /// Route `rx` and `tx` to this UART and start it at `baudrate`
    fn init(&mut self, rx: Pin, tx: Pin, baudrate: u32) -> Result<()>;

    /// Initialise from a [`UartConfig`], including frame format
    fn init_with(&mut self, config: &UartConfig) -> Result<()> {
        self.init(config.rx, config.tx, config.baudrate)?;
        self.set_format(config.data_bits, config.stop_bits, config.parity)
    }

    /// Stop the UART and release both pins
    fn deinit(&mut self) -> Result<()>;

    fn is_initialised(&self) -> bool;

    /// Block until one byte is received
    fn read_byte(&mut self) -> Result<u8>;

    /// Block until `buffer` is full
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Block until there is room for `byte`, then queue it
    fn write_byte(&mut self, byte: u8) -> Result<()>;

    /// Block until every byte of `buffer` is queued
    fn write(&mut self, buffer: &[u8]) -> Result<usize>;

    /// Move the UART to new pins
    fn set_pins(&mut self, rx: Pin, tx: Pin) -> Result<()>;

    /// Current `(rx, tx)` pins
    fn pins(&self) -> (Pin, Pin);

    /// Change the baud rate; returns the rate actually achieved
    fn set_baudrate(&mut self, baudrate: u32) -> Result<u32>;

    fn baudrate(&self) -> u32;

    /// At least one byte is waiting in the receive FIFO
    fn is_readable(&self) -> bool;

    /// The transmit FIFO has room for at least one byte
    fn is_writable(&self) -> bool;

    fn set_format(&mut self, data_bits: DataBits, stop_bits: StopBits, parity: Parity) -> Result<()>;

    /// Enable or disable CTS and RTS hardware flow control
    fn set_hw_flow(&mut self, cts: bool, rts: bool) -> Result<()>;
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    pub rx: Pin,
    pub tx: Pin,
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Parity mode
    pub parity: Parity,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            rx: Pin::new(1),
            tx: Pin::new(0),
            baudrate: DEFAULT_BAUDRATE,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
    Nine,
}

impl DataBits {
    /// Bits per frame as a number
    pub const fn bits(self) -> u8 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl StopBits {
    pub const fn bits(self) -> u8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}
