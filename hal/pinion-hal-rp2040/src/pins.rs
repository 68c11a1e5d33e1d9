//! RP2040 pin map
//!
//! Which peripheral block and role each GPIO can serve is fixed by the
//! silicon. The tables here describe that wiring; drivers consult them to
//! validate the pins handed to `init`.

use pinion_hal::{Error, Function, Pin, Result};

use crate::i2c::I2cInstance;
use crate::pwm::{PwmChannel, PwmOutput};
use crate::spi::SpiInstance;
use crate::uart::UartInstance;

/// Number of user GPIOs on RP2040
pub const GPIO_COUNT: u8 = 30;

macro_rules! gpio_pins {
    ($($name:ident = $n:literal),* $(,)?) => {
        $(pub const $name: Pin = Pin::new($n);)*
    };
}

gpio_pins!(
    GPIO0 = 0, GPIO1 = 1, GPIO2 = 2, GPIO3 = 3, GPIO4 = 4, GPIO5 = 5,
    GPIO6 = 6, GPIO7 = 7, GPIO8 = 8, GPIO9 = 9, GPIO10 = 10, GPIO11 = 11,
    GPIO12 = 12, GPIO13 = 13, GPIO14 = 14, GPIO15 = 15, GPIO16 = 16, GPIO17 = 17,
    GPIO18 = 18, GPIO19 = 19, GPIO20 = 20, GPIO21 = 21, GPIO22 = 22, GPIO23 = 23,
    GPIO24 = 24, GPIO25 = 25, GPIO26 = 26, GPIO27 = 27, GPIO28 = 28, GPIO29 = 29,
);

/// Pico board defaults
pub mod board {
    use super::*;

    pub const LED: Pin = GPIO25;
    pub const UART_TX: Pin = GPIO0;
    pub const UART_RX: Pin = GPIO1;
    pub const I2C_SDA: Pin = GPIO4;
    pub const I2C_SCL: Pin = GPIO5;
    pub const SPI_MISO: Pin = GPIO16;
    pub const SPI_CS: Pin = GPIO17;
    pub const SPI_SCK: Pin = GPIO18;
    pub const SPI_MOSI: Pin = GPIO19;
}

/// FUNCSEL register values
pub mod funcsel {
    pub const SPI: u8 = 1;
    pub const UART: u8 = 2;
    pub const I2C: u8 = 3;
    pub const PWM: u8 = 4;
    pub const SIO: u8 = 5;
    pub const PIO0: u8 = 6;
    pub const PIO1: u8 = 7;
    pub const GPCK: u8 = 8;
    pub const USB: u8 = 9;
    pub const NULL: u8 = 0x1f;
}

/// FUNCSEL value of every [`Function`], in declaration order
///
/// Every function except `Clock` is wired to all 30 pins; see [`funcsel_for`].
pub const FUNCTION_TABLE: [(Function, u8); 10] = [
    (Function::None, funcsel::NULL),
    (Function::Gpio, funcsel::SIO),
    (Function::Uart, funcsel::UART),
    (Function::Spi, funcsel::SPI),
    (Function::I2c, funcsel::I2C),
    (Function::Pwm, funcsel::PWM),
    (Function::Usb, funcsel::USB),
    (Function::Pio0, funcsel::PIO0),
    (Function::Pio1, funcsel::PIO1),
    (Function::Clock, funcsel::GPCK),
];

/// Pins carrying a GPCK clock input or output
const CLOCK_PINS: core::ops::RangeInclusive<u8> = 20..=25;

/// Check that `pin` exists on the chip and return its number
pub fn validate(pin: Pin) -> Result<u8> {
    if pin.number() < GPIO_COUNT {
        Ok(pin.number())
    } else {
        Err(Error::NotAvailableOnPlatform)
    }
}

/// FUNCSEL value routing `pin` to `function`, if the pin has it
pub fn funcsel_for(pin: Pin, function: Function) -> Option<u8> {
    let n = validate(pin).ok()?;
    if function == Function::Clock && !CLOCK_PINS.contains(&n) {
        return None;
    }
    FUNCTION_TABLE
        .iter()
        .find(|(f, _)| *f == function)
        .map(|(_, sel)| *sel)
}

/// Role of a pin on an I2C controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cRole {
    Sda,
    Scl,
}

/// I2C controller and role served by `pin`
///
/// Pins alternate SDA/SCL and switch controller every two pins.
pub fn i2c_route(pin: Pin) -> Result<(I2cInstance, I2cRole)> {
    let n = validate(pin)?;
    let instance = I2cInstance::from_block((n / 2) % 2);
    let role = if n % 2 == 0 { I2cRole::Sda } else { I2cRole::Scl };
    Ok((instance, role))
}

/// Role of a pin on a UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartRole {
    Tx,
    Rx,
    Cts,
    Rts,
}

/// UART and role served by `pin`
///
/// UART0: GPIO 0-3, 12-15, 16-19, 28/29
/// UART1: GPIO 4-7, 8-11, 20-23, 24-27
pub fn uart_route(pin: Pin) -> Result<(UartInstance, UartRole)> {
    let n = validate(pin)?;
    let instance = UartInstance::from_block(((n + 4) / 8) % 2);
    let role = match n % 4 {
        0 => UartRole::Tx,
        1 => UartRole::Rx,
        2 => UartRole::Cts,
        _ => UartRole::Rts,
    };
    Ok((instance, role))
}

/// Role of a pin on an SPI controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiRole {
    /// MISO in master mode
    Rx,
    Cs,
    Sck,
    /// MOSI in master mode
    Tx,
}

/// SPI controller and role served by `pin`
///
/// SPI0: GPIO 0-7, 16-23
/// SPI1: GPIO 8-15, 24-29
pub fn spi_route(pin: Pin) -> Result<(SpiInstance, SpiRole)> {
    let n = validate(pin)?;
    let instance = SpiInstance::from_block((n / 8) % 2);
    let role = match n % 4 {
        0 => SpiRole::Rx,
        1 => SpiRole::Cs,
        2 => SpiRole::Sck,
        _ => SpiRole::Tx,
    };
    Ok((instance, role))
}

const fn route(slice: u8, output: PwmOutput) -> PwmChannel {
    PwmChannel::new(slice, output)
}

/// PWM slice and output wired to each GPIO, indexed by pin number
///
/// Pins 16 and up reuse slices 0-7, so e.g. GPIO0 and GPIO16 share one
/// output.
pub const PWM_PIN_MAP: [PwmChannel; GPIO_COUNT as usize] = {
    use PwmOutput::{A, B};
    [
        route(0, A), route(0, B), route(1, A), route(1, B), // GPIO 0-3
        route(2, A), route(2, B), route(3, A), route(3, B), // GPIO 4-7
        route(4, A), route(4, B), route(5, A), route(5, B), // GPIO 8-11
        route(6, A), route(6, B), route(7, A), route(7, B), // GPIO 12-15
        route(0, A), route(0, B), route(1, A), route(1, B), // GPIO 16-19
        route(2, A), route(2, B), route(3, A), route(3, B), // GPIO 20-23
        route(4, A), route(4, B), route(5, A), route(5, B), // GPIO 24-27
        route(6, A), route(6, B), // GPIO 28-29
    ]
};

/// PWM output wired to `pin`
pub fn pwm_route(pin: Pin) -> Result<PwmChannel> {
    let n = validate(pin)?;
    Ok(PWM_PIN_MAP[usize::from(n)])
}
