//! Digital GPIO contract
//!
//! A [`DigitalGpio`] driver owns one pin and tracks its direction, pull,
//! function and interrupt sensitivity. `Function::None` means the pin is
//! not claimed by anything; a driver is initialised exactly when its
//! function is something else.

use crate::common::Pin;
use crate::error::Result;

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    In,
    #[default]
    Out,
}

/// Pull resistor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    #[default]
    None,
    Up,
    Down,
    OpenDrain,
}

/// What a pin is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Function {
    /// Not claimed
    #[default]
    None,
    Gpio,
    Uart,
    Spi,
    I2c,
    Pwm,
    Usb,
    Pio0,
    Pio1,
    Clock,
}

/// Interrupt sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Irq {
    #[default]
    None,
    LevelLow,
    LevelHigh,
    EdgeFall,
    EdgeRise,
}

/// Output slew rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlewRate {
    #[default]
    Slow,
    Fast,
}

/// Digital input/output pin
pub trait DigitalGpio {
    /// Claim the pin as a GPIO and apply the stored direction and pull
    fn init(&mut self) -> Result<()>;

    /// Release the pin; safe to call when never initialised
    fn deinit(&mut self) -> Result<()>;

    /// Whether the pin is currently claimed
    fn is_initialised(&self) -> bool {
        self.function() != Function::None
    }

    /// Sample the pin level (0 or 1)
    fn read(&self) -> u8;

    /// Drive the pin; any non-zero value is high
    fn write(&mut self, value: u8);

    /// Invert the current level
    ///
    /// Drivers that also implement `embedded_hal::digital::StatefulOutputPin`
    /// have two `toggle`s; call this one as `DigitalGpio::toggle(&mut pin)`
    /// when both traits are in scope.
    fn toggle(&mut self) {
        let level = self.read();
        self.write(u8::from(level == 0));
    }

    fn pin(&self) -> Pin;

    fn set_direction(&mut self, direction: Direction) -> Result<()>;

    fn direction(&self) -> Direction;

    /// Set the pull mode
    ///
    /// Chips without a given mode report `NotAvailableOnPlatform`.
    fn set_pull(&mut self, pull: Pull) -> Result<()>;

    fn pull(&self) -> Pull;

    /// Route the pin to `function`
    ///
    /// Functions the pin cannot serve are rejected with
    /// `NotAvailableOnPlatform` and leave the current function unchanged.
    /// `Function::None` releases the pin like [`deinit`](Self::deinit).
    fn set_function(&mut self, function: Function) -> Result<()>;

    fn function(&self) -> Function;

    fn set_irq(&mut self, irq: Irq) -> Result<()>;

    fn irq(&self) -> Irq;
}
