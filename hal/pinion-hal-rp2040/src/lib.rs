//! RP2040 drivers for the Pinion HAL
//!
//! This crate implements the `pinion-hal` peripheral contracts for the
//! RP2040 on top of the vendor SDK primitives described in [`sdk`]:
//!
//! - GPIO pin validation, function multiplexing and routing tables
//! - I2C, UART, SPI and PWM drivers with clock divider math
//! - [`Rp2040`], the eager registry of every bus and PWM driver
//! - `embedded-hal` 1.0 and `embedded-io` implementations for each driver
//!
//! Host tests run the drivers against [`mock::MockSdk`] (test builds, or the
//! `mock` feature).

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "mock"))]
extern crate std;

// Must come first so the logging macros are visible to every module
mod fmt;

pub mod chip;
pub mod gpio;
pub mod i2c;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod pins;
pub mod pwm;
pub mod sdk;
pub mod spi;
pub mod uart;

pub use chip::Rp2040;
pub use gpio::DigitalInOut;
pub use i2c::{I2c, I2cInstance};
pub use pwm::{Pwm, PwmChannel, PwmOutput};
pub use sdk::Sdk;
pub use spi::{Spi, SpiInstance};
pub use uart::{Uart, UartInstance};

// Re-export the contracts for convenience
pub use pinion_hal::{
    DigitalGpio, Error, I2cInterface, PwmInterface, Result, SpiInterface, UartInterface,
};
