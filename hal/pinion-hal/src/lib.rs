//! Pinion Hardware Abstraction Layer
//!
//! This crate defines the peripheral contracts that chip-specific HALs
//! implement, the error taxonomy every driver reports, and the registry
//! that hands out exactly one driver per physical peripheral block.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application firmware                   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pinion-hal (this crate - contracts)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pinion-hal-rp2040 (drivers + registry) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!            vendor SDK primitives
//! ```
//!
//! # Traits
//!
//! - [`gpio::DigitalGpio`] - Digital I/O
//! - [`uart::UartInterface`] - Serial communication
//! - [`i2c::I2cInterface`] - I2C bus operations and address scan
//! - [`spi::SpiInterface`] - SPI bus operations
//! - [`pwm::PwmInterface`] - PWM outputs
//! - [`registry::InstanceId`] - Peripheral instance identifiers
//! - [`diagnostics::Diagnostics`] - Optional failure sink

#![no_std]
#![deny(unsafe_code)]

pub mod common;
pub mod diagnostics;
pub mod error;
pub mod gpio;
pub mod i2c;
pub mod pwm;
pub mod registry;
pub mod spi;
pub mod uart;

// Re-export key types at crate root for convenience
pub use common::{BitOrder, Mode, Pin};
pub use diagnostics::{Diagnostics, LastError, NoDiagnostics, Source};
pub use error::{Error, Result};
pub use gpio::{DigitalGpio, Direction, Function, Irq, Pull, SlewRate};
pub use i2c::{is_reserved_address, I2cConfig, I2cInterface};
pub use pwm::{PwmConfig, PwmInterface};
pub use registry::{InstanceId, Registry};
pub use spi::{ClockPhase, ClockPolarity, SpiConfig, SpiInterface, SpiMode};
pub use uart::{DataBits, Parity, StopBits, UartConfig, UartInterface};
