//! Vendor SDK collaborator
//!
//! The drivers in this crate never touch registers themselves. Every
//! hardware effect goes through these traits, which firmware implements on
//! top of the silicon vendor's primitives (pin multiplexing, clock dividers,
//! blocking bus transfers). Host tests use [`crate::mock::MockSdk`].
//!
//! All methods take `&self`: implementations are thin handles onto
//! memory-mapped hardware, and the drivers' own `&mut self` receivers are
//! what serialise access to each peripheral block.
//!
//! Transfer primitives return a pico-style status: the number of bytes
//! moved when non-negative, otherwise one of the codes in [`status`].

use pinion_hal::{ClockPhase, ClockPolarity, Parity};

/// Status codes returned by transfer primitives
pub mod status {
    use pinion_hal::{Error, Result};

    pub const OK: i32 = 0;
    /// Transaction exceeded its time budget
    pub const TIMEOUT: i32 = -1;
    /// Unclassified failure; an address NACK on I2C
    pub const GENERIC: i32 = -2;
    /// Nothing available yet
    pub const NO_DATA: i32 = -3;
    pub const NOT_PERMITTED: i32 = -4;
    pub const INVALID_ARG: i32 = -5;
    pub const IO: i32 = -6;

    /// Translate a transfer status into a byte count or an [`Error`]
    ///
    /// `failure` is the kind reported for generic and I/O failures, i.e.
    /// [`Error::Read`] or [`Error::Write`] depending on the direction.
    pub fn check(code: i32, failure: Error) -> Result<usize> {
        match code {
            n if n >= OK => Ok(n as usize),
            TIMEOUT => Err(Error::Timeout),
            NO_DATA => Err(Error::Again),
            NOT_PERMITTED => Err(Error::NotAvailableOnPlatform),
            INVALID_ARG => Err(Error::TooBig),
            _ => Err(failure),
        }
    }
}

/// Interrupt event bits for [`GpioSdk::gpio_set_irq_enabled`]
pub mod irq_events {
    pub const LEVEL_LOW: u32 = 1 << 0;
    pub const LEVEL_HIGH: u32 = 1 << 1;
    pub const EDGE_FALL: u32 = 1 << 2;
    pub const EDGE_RISE: u32 = 1 << 3;
}

/// Pin multiplexing and single-pin I/O
pub trait GpioSdk {
    /// Reset the pin to a SIO input driving low
    fn gpio_init(&self, pin: u8);
    /// Return the pin to the NULL function
    fn gpio_deinit(&self, pin: u8);
    fn gpio_set_dir(&self, pin: u8, out: bool);
    fn gpio_put(&self, pin: u8, high: bool);
    /// Level sampled at the pad
    fn gpio_get(&self, pin: u8) -> bool;
    /// Level the pin is driving
    fn gpio_get_out_level(&self, pin: u8) -> bool;
    fn gpio_set_pulls(&self, pin: u8, up: bool, down: bool);
    /// Select the FUNCSEL value of the pin (see [`crate::pins::funcsel`])
    fn gpio_set_function(&self, pin: u8, funcsel: u8);
    fn gpio_set_slew_rate(&self, pin: u8, fast: bool);
    fn gpio_set_irq_enabled(&self, pin: u8, events: u32, enabled: bool);
}

/// I2C controller primitives, `block` being the controller index
pub trait I2cSdk {
    fn i2c_enable(&self, block: u8);
    fn i2c_disable(&self, block: u8);
    /// Program SCL high/low counts and the SDA hold time, in clk_sys cycles
    fn i2c_set_timing(&self, block: u8, hcnt: u32, lcnt: u32, sda_hold: u32);
    fn i2c_set_slave_mode(&self, block: u8, slave: bool, address: u8);
    fn i2c_read_blocking(&self, block: u8, address: u8, buffer: &mut [u8], nostop: bool) -> i32;
    fn i2c_write_blocking(&self, block: u8, address: u8, buffer: &[u8], nostop: bool) -> i32;
    /// Bytes waiting in the RX FIFO
    fn i2c_read_available(&self, block: u8) -> usize;
    /// Free slots in the TX FIFO
    fn i2c_write_available(&self, block: u8) -> usize;
}

/// UART primitives
pub trait UartSdk {
    fn uart_enable(&self, block: u8);
    fn uart_disable(&self, block: u8);
    /// Program the integer and fractional baud rate divisors
    fn uart_set_divisors(&self, block: u8, ibrd: u32, fbrd: u32);
    fn uart_set_format(&self, block: u8, data_bits: u8, stop_bits: u8, parity: Parity);
    fn uart_set_hw_flow(&self, block: u8, cts: bool, rts: bool);
    fn uart_is_readable(&self, block: u8) -> bool;
    fn uart_is_writable(&self, block: u8) -> bool;
    fn uart_read_blocking(&self, block: u8, buffer: &mut [u8]) -> i32;
    fn uart_write_blocking(&self, block: u8, buffer: &[u8]) -> i32;
}

/// SPI controller primitives
pub trait SpiSdk {
    fn spi_enable(&self, block: u8);
    fn spi_disable(&self, block: u8);
    /// Program the even prescaler (2..=254) and post-divider (1..=256)
    fn spi_set_clock(&self, block: u8, prescale: u32, postdiv: u32);
    fn spi_set_format(&self, block: u8, data_bits: u8, polarity: ClockPolarity, phase: ClockPhase);
    fn spi_set_slave(&self, block: u8, slave: bool);
    fn spi_is_readable(&self, block: u8) -> bool;
    fn spi_is_writable(&self, block: u8) -> bool;
    fn spi_is_busy(&self, block: u8) -> bool;
    fn spi_read_blocking(&self, block: u8, filler: u8, buffer: &mut [u8]) -> i32;
    fn spi_read16_blocking(&self, block: u8, filler: u16, buffer: &mut [u16]) -> i32;
    fn spi_write_blocking(&self, block: u8, buffer: &[u8]) -> i32;
    fn spi_write16_blocking(&self, block: u8, buffer: &[u16]) -> i32;
    fn spi_write_read_blocking(&self, block: u8, tx: &[u8], rx: &mut [u8]) -> i32;
}

/// PWM slice primitives
pub trait PwmSdk {
    /// Program the clock divider (8.4 fixed point) and wrap value of a slice
    fn pwm_configure(&self, slice: u8, div_int: u8, div_frac: u8, top: u16);
    /// Clock divider as `(integer, sixteenths)`
    fn pwm_get_clkdiv(&self, slice: u8) -> (u8, u8);
    fn pwm_get_wrap(&self, slice: u8) -> u16;
    fn pwm_set_chan_level(&self, slice: u8, channel: u8, level: u16);
    fn pwm_get_chan_level(&self, slice: u8, channel: u8) -> u16;
    fn pwm_set_enabled(&self, slice: u8, enabled: bool);
    fn pwm_is_enabled(&self, slice: u8) -> bool;
    fn pwm_get_counter(&self, slice: u8) -> u16;
    fn pwm_set_counter(&self, slice: u8, value: u16);
}

/// Clock tree and busy-wait timing
pub trait ClockSdk {
    /// clk_sys in Hz (feeds I2C and PWM)
    fn clock_sys_hz(&self) -> u32;
    /// clk_peri in Hz (feeds UART and SPI)
    fn clock_peri_hz(&self) -> u32;
    fn sleep_us(&self, us: u64);
}

/// Everything the RP2040 drivers need from the vendor SDK
pub trait Sdk: GpioSdk + I2cSdk + UartSdk + SpiSdk + PwmSdk + ClockSdk {}

impl<T: GpioSdk + I2cSdk + UartSdk + SpiSdk + PwmSdk + ClockSdk> Sdk for T {}

#[cfg(test)]
mod tests {
    use super::status::*;
    use pinion_hal::Error;

    #[test]
    fn test_status_translation() {
        assert_eq!(check(3, Error::Read), Ok(3));
        assert_eq!(check(OK, Error::Write), Ok(0));
        assert_eq!(check(TIMEOUT, Error::Read), Err(Error::Timeout));
        assert_eq!(check(NO_DATA, Error::Read), Err(Error::Again));
        assert_eq!(check(NOT_PERMITTED, Error::Write), Err(Error::NotAvailableOnPlatform));
        assert_eq!(check(INVALID_ARG, Error::Write), Err(Error::TooBig));
    }

    #[test]
    fn test_generic_failures_take_direction() {
        assert_eq!(check(GENERIC, Error::Read), Err(Error::Read));
        assert_eq!(check(GENERIC, Error::Write), Err(Error::Write));
        assert_eq!(check(IO, Error::Write), Err(Error::Write));
        assert_eq!(check(-42, Error::Read), Err(Error::Read));
    }
}
