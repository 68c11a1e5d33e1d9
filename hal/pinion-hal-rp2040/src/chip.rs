//! Chip-level peripheral table
//!
//! [`Rp2040`] is built once at startup and owns one driver per peripheral
//! block. Firmware keeps it (usually in `main`) and borrows drivers from
//! its registries; nothing is created lazily.

use pinion_hal::diagnostics::{Diagnostics, NO_DIAGNOSTICS};
use pinion_hal::{Direction, InstanceId, Pin, Registry, Result};

use crate::gpio::DigitalInOut;
use crate::i2c::{I2c, I2cInstance};
use crate::pins;
use crate::pwm::{Pwm, PwmChannel};
use crate::sdk::Sdk;
use crate::spi::{Spi, SpiInstance};
use crate::uart::{Uart, UartInstance};

/// Every bus and PWM driver on the chip
///
/// `S` is cloned into each driver, so it is normally a reference or a
/// zero-sized handle onto the vendor SDK.
pub struct Rp2040<S: Sdk + Clone> {
    pub i2c: Registry<I2cInstance, I2c<S>, { I2cInstance::COUNT }>,
    pub uart: Registry<UartInstance, Uart<S>, { UartInstance::COUNT }>,
    pub spi: Registry<SpiInstance, Spi<S>, { SpiInstance::COUNT }>,
    pub pwm: Registry<PwmChannel, Pwm<S>, { PwmChannel::COUNT }>,
    sdk: S,
    diagnostics: &'static dyn Diagnostics,
}

impl<S: Sdk + Clone> Rp2040<S> {
    pub fn new(sdk: S) -> Self {
        Self::with_diagnostics(sdk, &NO_DIAGNOSTICS)
    }

    /// Build the table with every driver reporting to `diagnostics`
    pub fn with_diagnostics(sdk: S, diagnostics: &'static dyn Diagnostics) -> Self {
        let chip = Self {
            i2c: Registry::new(|id| I2c::new(sdk.clone(), id, diagnostics)),
            uart: Registry::new(|id| Uart::new(sdk.clone(), id, diagnostics)),
            spi: Registry::new(|id| Spi::new(sdk.clone(), id, diagnostics)),
            pwm: Registry::new(|id| Pwm::new(sdk.clone(), id, diagnostics)),
            sdk,
            diagnostics,
        };
        debug!(
            "RP2040: {} I2C, {} UART, {} SPI, {} PWM drivers",
            chip.i2c.len(),
            chip.uart.len(),
            chip.spi.len(),
            chip.pwm.len()
        );
        chip
    }

    /// PWM driver for the output wired to `pin`
    ///
    /// Pins without a PWM output resolve to slice 0 output A.
    pub fn pwm_for(&mut self, pin: Pin) -> &mut Pwm<S> {
        let channel = pins::pwm_route(pin).unwrap_or_else(|_| PwmChannel::from_index(0));
        self.pwm.get_mut(channel)
    }

    /// Claim `pin` as a GPIO
    ///
    /// GPIOs are not held in a registry: the returned handle owns the pin
    /// until it is dropped.
    pub fn gpio(&self, pin: Pin, direction: Direction) -> Result<DigitalInOut<S>> {
        DigitalInOut::with_diagnostics(self.sdk.clone(), pin, direction, self.diagnostics)
    }

    pub fn sleep_micros(&self, us: u64) {
        self.sdk.sleep_us(us);
    }

    pub fn sleep_millis(&self, ms: u32) {
        self.sdk.sleep_us(u64::from(ms) * 1_000);
    }

    /// The vendor SDK handle
    pub fn sdk(&self) -> &S {
        &self.sdk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSdk;
    use crate::pins::funcsel;
    use crate::pwm::PwmOutput;
    use pinion_hal::diagnostics::Source;
    use pinion_hal::{DigitalGpio, Error, I2cInterface, LastError, PwmInterface, UartInterface};

    #[test]
    fn test_registries_are_populated() {
        let sdk = MockSdk::new();
        let chip = Rp2040::new(&sdk);

        assert_eq!(chip.i2c.len(), 2);
        assert_eq!(chip.uart.len(), 2);
        assert_eq!(chip.spi.len(), 2);
        assert_eq!(chip.pwm.len(), 16);

        for (id, driver) in chip.i2c.iter() {
            assert_eq!(driver.instance(), id);
        }
        for (id, driver) in chip.pwm.iter() {
            assert_eq!(driver.channel(), id);
        }
        // Building the table touches no hardware
        assert!(sdk.calls().is_empty());
    }

    #[test]
    fn test_same_id_same_driver() {
        let sdk = MockSdk::new();
        let mut chip = Rp2040::new(&sdk);

        chip.uart
            .get_mut(UartInstance::Uart1)
            .init(pins::GPIO5, pins::GPIO4, 9_600)
            .unwrap();
        assert!(chip.uart.get(UartInstance::Uart1).is_initialised());
        assert!(chip.uart.get_raw(1).is_initialised());
        assert!(!chip.uart.get(UartInstance::Uart0).is_initialised());
    }

    #[test]
    fn test_unknown_raw_id_is_instance_zero() {
        let sdk = MockSdk::new();
        let chip = Rp2040::new(&sdk);

        assert_eq!(chip.i2c.get_raw(7).instance(), I2cInstance::I2c0);
        assert_eq!(chip.spi.get_raw(200).instance(), SpiInstance::Spi0);
    }

    #[test]
    fn test_pwm_for_pin() {
        let sdk = MockSdk::new();
        let mut chip = Rp2040::new(&sdk);

        let led = chip.pwm_for(pins::board::LED);
        assert_eq!(led.channel(), PwmChannel::new(4, PwmOutput::B));
        led.init(pins::board::LED, 2_000, 10, true).unwrap();

        // GPIO9 shares the LED's output
        assert!(chip.pwm_for(pins::GPIO9).is_initialised());
        assert_eq!(chip.pwm_for(Pin::new(40)).channel(), PwmChannel::new(0, PwmOutput::A));
    }

    #[test]
    fn test_diagnostics_reach_every_driver() {
        static LAST: LastError = LastError::new();
        let sdk = MockSdk::new();
        let mut chip = Rp2040::with_diagnostics(&sdk, &LAST);

        let mut buf = [0u8; 1];
        assert_eq!(
            chip.i2c.get_mut(I2cInstance::I2c1).read(0x10, &mut buf, false),
            Err(Error::Generic)
        );
        assert_eq!(LAST.take(), Some((Source::I2c(1), Error::Generic)));

        assert!(chip.gpio(Pin::new(31), Direction::In).is_err());
        assert_eq!(LAST.take(), Some((Source::Gpio(Pin::new(31)), Error::NotAvailableOnPlatform)));
    }

    #[test]
    fn test_gpio_and_sleep() {
        let sdk = MockSdk::new();
        let chip = Rp2040::new(&sdk);

        let mut led = chip.gpio(pins::board::LED, Direction::Out).unwrap();
        led.write(1);
        assert_eq!(sdk.funcsel(25), funcsel::SIO);
        assert!(sdk.output_level(25));

        chip.sleep_millis(3);
        chip.sleep_micros(250);
        assert_eq!(sdk.slept_us(), 3_250);
    }
}
