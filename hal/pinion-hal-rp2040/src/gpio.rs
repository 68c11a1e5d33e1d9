//! Digital GPIO driver
//!
//! Unlike the bus peripherals, GPIOs are not registry-owned: any number of
//! [`DigitalInOut`] handles can be created, one per pin. Dropping a handle
//! releases its pin.

use pinion_hal::diagnostics::{Diagnostics, Source, NO_DIAGNOSTICS};
use pinion_hal::{DigitalGpio, Direction, Error, Function, Irq, Pin, Pull, Result, SlewRate};

use crate::pins;
use crate::sdk::{irq_events, GpioSdk};

/// A single GPIO pin
pub struct DigitalInOut<S: GpioSdk> {
    sdk: S,
    pin: Pin,
    direction: Direction,
    pull: Pull,
    function: Function,
    irq: Irq,
    diagnostics: &'static dyn Diagnostics,
}

impl<S: GpioSdk> DigitalInOut<S> {
    /// Claim `pin` as a GPIO with the given direction
    pub fn new(sdk: S, pin: Pin, direction: Direction) -> Result<Self> {
        Self::with_diagnostics(sdk, pin, direction, &NO_DIAGNOSTICS)
    }

    /// Same as [`new`](Self::new), reporting failures to `diagnostics`
    pub fn with_diagnostics(
        sdk: S,
        pin: Pin,
        direction: Direction,
        diagnostics: &'static dyn Diagnostics,
    ) -> Result<Self> {
        if let Err(e) = pins::validate(pin) {
            diagnostics.record(Source::Gpio(pin), e);
            return Err(e);
        }
        let mut gpio = Self {
            sdk,
            pin,
            direction,
            pull: Pull::None,
            function: Function::None,
            irq: Irq::None,
            diagnostics,
        };
        gpio.init()?;
        Ok(gpio)
    }

    /// Set the output slew rate
    pub fn set_slew_rate(&mut self, rate: SlewRate) {
        self.sdk.gpio_set_slew_rate(self.pin.number(), rate == SlewRate::Fast);
    }

    fn fail<T>(&self, error: Error) -> Result<T> {
        warn!("GPIO{}: rejected configuration", self.pin.number());
        self.diagnostics.record(Source::Gpio(self.pin), error);
        Err(error)
    }

    fn apply_direction(&self) {
        self.sdk
            .gpio_set_dir(self.pin.number(), self.direction == Direction::Out);
    }

    fn apply_pull(&self) {
        let (up, down) = match self.pull {
            Pull::Up => (true, false),
            Pull::Down => (false, true),
            _ => (false, false),
        };
        self.sdk.gpio_set_pulls(self.pin.number(), up, down);
    }
}

fn irq_mask(irq: Irq) -> u32 {
    match irq {
        Irq::None => 0,
        Irq::LevelLow => irq_events::LEVEL_LOW,
        Irq::LevelHigh => irq_events::LEVEL_HIGH,
        Irq::EdgeFall => irq_events::EDGE_FALL,
        Irq::EdgeRise => irq_events::EDGE_RISE,
    }
}

impl<S: GpioSdk> DigitalGpio for DigitalInOut<S> {
    fn init(&mut self) -> Result<()> {
        let n = self.pin.number();
        self.sdk.gpio_init(n);
        self.function = Function::Gpio;
        self.apply_direction();
        self.apply_pull();
        debug!("GPIO{}: initialised", n);
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        if self.function == Function::None {
            return Ok(());
        }
        let n = self.pin.number();
        if self.irq != Irq::None {
            self.sdk.gpio_set_irq_enabled(n, irq_mask(self.irq), false);
            self.irq = Irq::None;
        }
        self.sdk.gpio_deinit(n);
        self.function = Function::None;
        debug!("GPIO{}: released", n);
        Ok(())
    }

    fn read(&self) -> u8 {
        u8::from(self.sdk.gpio_get(self.pin.number()))
    }

    fn write(&mut self, value: u8) {
        self.sdk.gpio_put(self.pin.number(), value != 0);
    }

    fn pin(&self) -> Pin {
        self.pin
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        self.direction = direction;
        if self.is_initialised() {
            self.apply_direction();
        }
        Ok(())
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn set_pull(&mut self, pull: Pull) -> Result<()> {
        // The pads have pull-up and pull-down resistors but no open-drain driver
        if pull == Pull::OpenDrain {
            return self.fail(Error::NotAvailableOnPlatform);
        }
        self.pull = pull;
        if self.is_initialised() {
            self.apply_pull();
        }
        Ok(())
    }

    fn pull(&self) -> Pull {
        self.pull
    }

    fn set_function(&mut self, function: Function) -> Result<()> {
        if function == Function::None {
            return self.deinit();
        }
        let Some(sel) = pins::funcsel_for(self.pin, function) else {
            return self.fail(Error::NotAvailableOnPlatform);
        };
        self.sdk.gpio_set_function(self.pin.number(), sel);
        self.function = function;
        Ok(())
    }

    fn function(&self) -> Function {
        self.function
    }

    fn set_irq(&mut self, irq: Irq) -> Result<()> {
        if !self.is_initialised() {
            return self.fail(Error::Generic);
        }
        let n = self.pin.number();
        if self.irq != Irq::None {
            self.sdk.gpio_set_irq_enabled(n, irq_mask(self.irq), false);
        }
        if irq != Irq::None {
            self.sdk.gpio_set_irq_enabled(n, irq_mask(irq), true);
        }
        self.irq = irq;
        Ok(())
    }

    fn irq(&self) -> Irq {
        self.irq
    }
}

impl<S: GpioSdk> Drop for DigitalInOut<S> {
    fn drop(&mut self) {
        let _ = self.deinit();
    }
}

impl<S: GpioSdk> embedded_hal::digital::ErrorType for DigitalInOut<S> {
    type Error = Error;
}

impl<S: GpioSdk> embedded_hal::digital::OutputPin for DigitalInOut<S> {
    fn set_low(&mut self) -> Result<()> {
        self.write(0);
        Ok(())
    }

    fn set_high(&mut self) -> Result<()> {
        self.write(1);
        Ok(())
    }
}

impl<S: GpioSdk> embedded_hal::digital::StatefulOutputPin for DigitalInOut<S> {
    fn is_set_high(&mut self) -> Result<bool> {
        Ok(self.sdk.gpio_get_out_level(self.pin.number()))
    }

    fn is_set_low(&mut self) -> Result<bool> {
        Ok(!self.sdk.gpio_get_out_level(self.pin.number()))
    }
}

impl<S: GpioSdk> embedded_hal::digital::InputPin for DigitalInOut<S> {
    fn is_high(&mut self) -> Result<bool> {
        Ok(self.read() != 0)
    }

    fn is_low(&mut self) -> Result<bool> {
        Ok(self.read() == 0)
    }
}
