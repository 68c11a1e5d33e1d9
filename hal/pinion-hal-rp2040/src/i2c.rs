//! I2C controller driver

use embedded_hal::i2c::{ErrorType, Operation, SevenBitAddress};
use pinion_hal::diagnostics::{Diagnostics, Source};
use pinion_hal::i2c::MAX_ADDRESS;
use pinion_hal::{Error, I2cInterface, InstanceId, Mode, Pin, Result};

use crate::pins::{self, funcsel, I2cRole};
use crate::sdk::{status, Sdk};

/// I2C controller on RP2040
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cInstance {
    I2c0,
    I2c1,
}

impl I2cInstance {
    pub(crate) const fn from_block(block: u8) -> Self {
        match block {
            1 => I2cInstance::I2c1,
            _ => I2cInstance::I2c0,
        }
    }

    /// Hardware block index
    pub const fn block(self) -> u8 {
        self as u8
    }
}

impl InstanceId for I2cInstance {
    const COUNT: usize = 2;

    fn index(self) -> usize {
        self as usize
    }

    fn from_index(index: usize) -> Self {
        match index {
            1 => I2cInstance::I2c1,
            _ => I2cInstance::I2c0,
        }
    }
}

/// Shortest SCL high or low phase the controller supports, in clk_sys cycles
const MIN_PHASE_COUNT: u32 = 8;

/// Longest SCL high or low phase (16-bit counters)
const MAX_PHASE_COUNT: u32 = 0xFFFF;

/// SCL timing for one bus rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cTiming {
    /// SCL high count
    pub hcnt: u32,
    /// SCL low count
    pub lcnt: u32,
    /// SDA hold count
    pub sda_hold: u32,
    /// Rate produced by these counts, in Hz
    pub actual: u32,
}

/// Compute SCL counts for `baudrate` from a `clk_sys` of `clock_hz`
///
/// The period is split 40/60 between high and low phases. Rates too low
/// for the 16-bit counters give `TooSmall`; rates needing fewer than 8
/// cycles per phase give `TooBig`.
pub fn timing(clock_hz: u32, baudrate: u32) -> Result<I2cTiming> {
    if baudrate == 0 {
        return Err(Error::TooSmall);
    }
    let clock = u64::from(clock_hz);
    let baud = u64::from(baudrate);

    let period = (clock + baud / 2) / baud;
    let lcnt = period * 3 / 5;
    let hcnt = period - lcnt;

    if hcnt > u64::from(MAX_PHASE_COUNT) || lcnt > u64::from(MAX_PHASE_COUNT) {
        return Err(Error::TooSmall);
    }
    if hcnt < u64::from(MIN_PHASE_COUNT) || lcnt < u64::from(MIN_PHASE_COUNT) {
        return Err(Error::TooBig);
    }

    // 300 ns hold below 1 MHz, 120 ns in fast mode plus
    let sda_hold = if baudrate < 1_000_000 {
        clock * 3 / 10_000_000 + 1
    } else {
        clock * 3 / 25_000_000 + 1
    };

    Ok(I2cTiming {
        hcnt: hcnt as u32,
        lcnt: lcnt as u32,
        sda_hold: sda_hold as u32,
        actual: (clock / period) as u32,
    })
}

/// Blocking I2C master (or slave) on one controller
pub struct I2c<S: Sdk> {
    sdk: S,
    instance: I2cInstance,
    sda: Pin,
    scl: Pin,
    frequency: u32,
    mode: Mode,
    initialised: bool,
    diagnostics: &'static dyn Diagnostics,
}

impl<S: Sdk> I2c<S> {
    pub(crate) fn new(sdk: S, instance: I2cInstance, diagnostics: &'static dyn Diagnostics) -> Self {
        let (sda, scl) = match instance {
            I2cInstance::I2c0 => (pins::GPIO4, pins::GPIO5),
            I2cInstance::I2c1 => (pins::GPIO2, pins::GPIO3),
        };
        Self {
            sdk,
            instance,
            sda,
            scl,
            frequency: 0,
            mode: Mode::Master,
            initialised: false,
            diagnostics,
        }
    }

    /// Driver without a diagnostics sink, for use outside a chip registry
    #[cfg(test)]
    pub(crate) fn detached(sdk: S, instance: I2cInstance) -> Self {
        Self::new(sdk, instance, &pinion_hal::diagnostics::NO_DIAGNOSTICS)
    }

    pub fn instance(&self) -> I2cInstance {
        self.instance
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn block(&self) -> u8 {
        self.instance.block()
    }

    fn report<T>(&self, error: Error) -> Result<T> {
        self.diagnostics
            .record(Source::I2c(self.instance.block()), error);
        Err(error)
    }

    fn ensure_initialised(&self) -> Result<()> {
        if self.initialised {
            Ok(())
        } else {
            self.report(Error::Generic)
        }
    }

    /// Both pins must belong to this controller, in the right roles
    fn check_pins(&self, sda: Pin, scl: Pin) -> Result<()> {
        let sda_ok = pins::i2c_route(sda)? == (self.instance, I2cRole::Sda);
        let scl_ok = pins::i2c_route(scl)? == (self.instance, I2cRole::Scl);
        if sda_ok && scl_ok {
            Ok(())
        } else {
            Err(Error::NotAvailableOnPlatform)
        }
    }

    fn claim_pins(&self) {
        for pin in [self.sda, self.scl] {
            self.sdk.gpio_set_function(pin.number(), funcsel::I2C);
            self.sdk.gpio_set_pulls(pin.number(), true, false);
        }
    }

    fn release_pins(&self) {
        for pin in [self.sda, self.scl] {
            self.sdk.gpio_set_pulls(pin.number(), false, false);
            self.sdk.gpio_set_function(pin.number(), funcsel::NULL);
        }
    }

    fn apply_timing(&self, timing: &I2cTiming) {
        let block = self.block();
        self.sdk.i2c_disable(block);
        self.sdk
            .i2c_set_timing(block, timing.hcnt, timing.lcnt, timing.sda_hold);
        self.sdk.i2c_enable(block);
    }

    fn check_address(&self, address: u8) -> Result<()> {
        if address > MAX_ADDRESS {
            self.report(Error::TooBig)
        } else {
            Ok(())
        }
    }
}

impl<S: Sdk> I2cInterface for I2c<S> {
    fn init(&mut self, sda: Pin, scl: Pin, frequency: u32) -> Result<()> {
        let prepared = self
            .check_pins(sda, scl)
            .and_then(|()| timing(self.sdk.clock_sys_hz(), frequency));
        let timing = match prepared {
            Ok(timing) => timing,
            Err(e) => {
                warn!("I2C{}: init rejected", self.block());
                self.deinit()?;
                return self.report(e);
            }
        };

        if self.initialised {
            self.release_pins();
        }
        self.sda = sda;
        self.scl = scl;
        self.apply_timing(&timing);
        self.sdk.i2c_set_slave_mode(self.block(), false, 0);
        self.claim_pins();

        self.frequency = timing.actual;
        self.mode = Mode::Master;
        self.initialised = true;
        debug!("I2C{}: running at {} Hz", self.block(), timing.actual);
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        if !self.initialised {
            return Ok(());
        }
        self.sdk.i2c_disable(self.block());
        self.release_pins();
        self.initialised = false;
        debug!("I2C{}: released", self.block());
        Ok(())
    }

    fn is_initialised(&self) -> bool {
        self.initialised
    }

    fn read(&mut self, address: u8, buffer: &mut [u8], nostop: bool) -> Result<usize> {
        self.ensure_initialised()?;
        self.check_address(address)?;
        if buffer.is_empty() {
            return self.report(Error::TooSmall);
        }
        let code = self
            .sdk
            .i2c_read_blocking(self.block(), address, buffer, nostop);
        status::check(code, Error::Read).or_else(|e| {
            trace!("I2C{}: read from {} failed", self.block(), address);
            self.report(e)
        })
    }

    fn write(&mut self, address: u8, buffer: &[u8], nostop: bool) -> Result<usize> {
        self.ensure_initialised()?;
        self.check_address(address)?;
        if buffer.is_empty() {
            return self.report(Error::TooSmall);
        }
        let code = self
            .sdk
            .i2c_write_blocking(self.block(), address, buffer, nostop);
        status::check(code, Error::Write).or_else(|e| {
            trace!("I2C{}: write to {} failed", self.block(), address);
            self.report(e)
        })
    }

    fn set_pins(&mut self, sda: Pin, scl: Pin) -> Result<()> {
        if let Err(e) = self.check_pins(sda, scl) {
            return self.report(e);
        }
        if self.initialised {
            self.release_pins();
        }
        self.sda = sda;
        self.scl = scl;
        if self.initialised {
            self.claim_pins();
        }
        Ok(())
    }

    fn pins(&self) -> (Pin, Pin) {
        (self.sda, self.scl)
    }

    fn set_frequency(&mut self, frequency: u32) -> Result<u32> {
        self.ensure_initialised()?;
        let timing = match timing(self.sdk.clock_sys_hz(), frequency) {
            Ok(timing) => timing,
            Err(e) => return self.report(e),
        };
        self.apply_timing(&timing);
        self.frequency = timing.actual;
        Ok(timing.actual)
    }

    fn frequency(&self) -> u32 {
        self.frequency
    }

    fn readable(&self) -> usize {
        if self.initialised {
            self.sdk.i2c_read_available(self.block())
        } else {
            0
        }
    }

    fn writable(&self) -> usize {
        if self.initialised {
            self.sdk.i2c_write_available(self.block())
        } else {
            0
        }
    }

    fn set_mode(&mut self, address: u8, mode: Mode) -> Result<()> {
        self.ensure_initialised()?;
        self.check_address(address)?;
        self.sdk
            .i2c_set_slave_mode(self.block(), mode == Mode::Slave, address);
        self.mode = mode;
        Ok(())
    }
}

impl<S: Sdk> ErrorType for I2c<S> {
    type Error = Error;
}

impl<S: Sdk> embedded_hal::i2c::I2c<SevenBitAddress> for I2c<S> {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<()> {
        let last = operations.len().saturating_sub(1);
        for (i, operation) in operations.iter_mut().enumerate() {
            let nostop = i != last;
            match operation {
                Operation::Read(buffer) => {
                    I2cInterface::read(self, address, buffer, nostop)?;
                }
                Operation::Write(buffer) => {
                    I2cInterface::write(self, address, buffer, nostop)?;
                }
            }
        }
        Ok(())
    }
}
