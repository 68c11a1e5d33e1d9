//! SPI controller driver
//!
//! Chip select is driven in software through [`SpiInterface::select`] and
//! [`SpiInterface::deselect`]; the controller's own CS function is not
//! routed.

use embedded_hal::spi::ErrorType;
use pinion_hal::diagnostics::{Diagnostics, Source};
use pinion_hal::spi::DEFAULT_FILLER;
use pinion_hal::{
    BitOrder, ClockPhase, ClockPolarity, Error, InstanceId, Mode, Pin, Result, SpiInterface,
};

use crate::pins::{self, funcsel, SpiRole};
use crate::sdk::{status, Sdk};

/// SPI controller on RP2040
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiInstance {
    Spi0,
    Spi1,
}

impl SpiInstance {
    pub(crate) const fn from_block(block: u8) -> Self {
        match block {
            1 => SpiInstance::Spi1,
            _ => SpiInstance::Spi0,
        }
    }

    /// Hardware block index
    pub const fn block(self) -> u8 {
        self as u8
    }
}

impl InstanceId for SpiInstance {
    const COUNT: usize = 2;

    fn index(self) -> usize {
        self as usize
    }

    fn from_index(index: usize) -> Self {
        match index {
            1 => SpiInstance::Spi1,
            _ => SpiInstance::Spi0,
        }
    }
}

const MAX_PRESCALE: u32 = 254;
const MAX_POSTDIV: u32 = 256;

/// Word widths the controller can shift
const MIN_DATA_BITS: u8 = 4;
const MAX_DATA_BITS: u8 = 16;

/// Clock prescaler settings for one bus rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiClock {
    /// Even prescaler, 2 to 254
    pub prescale: u32,
    /// Post divider, 1 to 256
    pub postdiv: u32,
    /// Rate produced by these dividers, in Hz
    pub actual: u32,
}

/// Compute clock dividers for `baudrate` from a `clk_peri` of `clock_hz`
///
/// Picks the smallest prescaler that leaves the post divider in range, then
/// the largest post divider whose rate does not exceed `baudrate`.
pub fn clock_dividers(clock_hz: u32, baudrate: u32) -> Result<SpiClock> {
    if baudrate == 0 {
        return Err(Error::TooSmall);
    }
    let clock = u64::from(clock_hz);
    let baud = u64::from(baudrate);

    let prescale = (2..=MAX_PRESCALE)
        .step_by(2)
        .find(|&p| clock < u64::from(p + 2) * u64::from(MAX_POSTDIV) * baud)
        .ok_or(Error::TooSmall)?;

    let postdiv = (2..=MAX_POSTDIV)
        .rev()
        .find(|&d| clock / u64::from(prescale * (d - 1)) > baud)
        .unwrap_or(1);

    Ok(SpiClock {
        prescale,
        postdiv,
        actual: (clock / u64::from(prescale * postdiv)) as u32,
    })
}

/// Blocking SPI master (or slave) on one controller
pub struct Spi<S: Sdk> {
    sdk: S,
    instance: SpiInstance,
    sck: Pin,
    mosi: Pin,
    miso: Pin,
    frequency: u32,
    mode: Mode,
    initialised: bool,
    diagnostics: &'static dyn Diagnostics,
}

impl<S: Sdk> Spi<S> {
    pub(crate) fn new(sdk: S, instance: SpiInstance, diagnostics: &'static dyn Diagnostics) -> Self {
        let (sck, mosi, miso) = match instance {
            SpiInstance::Spi0 => (pins::GPIO18, pins::GPIO19, pins::GPIO16),
            SpiInstance::Spi1 => (pins::GPIO10, pins::GPIO11, pins::GPIO8),
        };
        Self {
            sdk,
            instance,
            sck,
            mosi,
            miso,
            frequency: 0,
            mode: Mode::Master,
            initialised: false,
            diagnostics,
        }
    }

    #[cfg(test)]
    pub(crate) fn detached(sdk: S, instance: SpiInstance) -> Self {
        Self::new(sdk, instance, &pinion_hal::diagnostics::NO_DIAGNOSTICS)
    }

    pub fn instance(&self) -> SpiInstance {
        self.instance
    }

    /// Currently routed `(sck, mosi, miso)`
    pub fn pins(&self) -> (Pin, Pin, Pin) {
        (self.sck, self.mosi, self.miso)
    }

    fn block(&self) -> u8 {
        self.instance.block()
    }

    fn report<T>(&self, error: Error) -> Result<T> {
        self.diagnostics
            .record(Source::Spi(self.instance.block()), error);
        Err(error)
    }

    fn ensure_initialised(&self) -> Result<()> {
        if self.initialised {
            Ok(())
        } else {
            self.report(Error::Generic)
        }
    }

    fn check_pins(&self, sck: Pin, mosi: Pin, miso: Pin) -> Result<()> {
        let wanted = [(sck, SpiRole::Sck), (mosi, SpiRole::Tx), (miso, SpiRole::Rx)];
        for (pin, role) in wanted {
            if pins::spi_route(pin)? != (self.instance, role) {
                return Err(Error::NotAvailableOnPlatform);
            }
        }
        Ok(())
    }

    fn route_pins(&self, sel: u8) {
        for pin in [self.sck, self.mosi, self.miso] {
            self.sdk.gpio_set_function(pin.number(), sel);
        }
    }

    fn finish(&self, code: i32, failure: Error) -> Result<usize> {
        status::check(code, failure).or_else(|e| {
            trace!("SPI{}: transfer failed", self.block());
            self.report(e)
        })
    }
}

impl<S: Sdk> SpiInterface for Spi<S> {
    fn init(&mut self, sck: Pin, mosi: Pin, miso: Pin, frequency: u32) -> Result<()> {
        let prepared = self
            .check_pins(sck, mosi, miso)
            .and_then(|()| clock_dividers(self.sdk.clock_peri_hz(), frequency));
        let clock = match prepared {
            Ok(clock) => clock,
            Err(e) => {
                warn!("SPI{}: init rejected", self.block());
                self.deinit()?;
                return self.report(e);
            }
        };

        let block = self.block();
        if self.initialised {
            self.sdk.spi_disable(block);
            self.route_pins(funcsel::NULL);
        }
        self.sck = sck;
        self.mosi = mosi;
        self.miso = miso;
        self.sdk.spi_set_clock(block, clock.prescale, clock.postdiv);
        self.sdk.spi_set_format(
            block,
            8,
            ClockPolarity::IdleLow,
            ClockPhase::CaptureOnFirstTransition,
        );
        self.sdk.spi_set_slave(block, false);
        self.sdk.spi_enable(block);
        self.route_pins(funcsel::SPI);

        self.frequency = clock.actual;
        self.mode = Mode::Master;
        self.initialised = true;
        debug!("SPI{}: running at {} Hz", block, clock.actual);
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        if !self.initialised {
            return Ok(());
        }
        self.sdk.spi_disable(self.block());
        self.route_pins(funcsel::NULL);
        self.initialised = false;
        debug!("SPI{}: released", self.block());
        Ok(())
    }

    fn is_initialised(&self) -> bool {
        self.initialised
    }

    fn set_format(
        &mut self,
        data_bits: u8,
        polarity: ClockPolarity,
        phase: ClockPhase,
        bit_order: BitOrder,
    ) -> Result<()> {
        self.ensure_initialised()?;
        if data_bits < MIN_DATA_BITS {
            return self.report(Error::TooSmall);
        }
        if data_bits > MAX_DATA_BITS {
            return self.report(Error::TooBig);
        }
        // The controller only shifts MSB first
        if bit_order == BitOrder::LsbFirst {
            return self.report(Error::NotAvailableOnPlatform);
        }
        self.sdk
            .spi_set_format(self.block(), data_bits, polarity, phase);
        Ok(())
    }

    fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.ensure_initialised()?;
        self.sdk.spi_set_slave(self.block(), mode == Mode::Slave);
        self.mode = mode;
        Ok(())
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_frequency(&mut self, frequency: u32) -> Result<u32> {
        self.ensure_initialised()?;
        let clock = match clock_dividers(self.sdk.clock_peri_hz(), frequency) {
            Ok(clock) => clock,
            Err(e) => return self.report(e),
        };
        self.sdk
            .spi_set_clock(self.block(), clock.prescale, clock.postdiv);
        self.frequency = clock.actual;
        Ok(clock.actual)
    }

    fn frequency(&self) -> u32 {
        self.frequency
    }

    fn select(&mut self, cs: Pin) -> Result<()> {
        self.ensure_initialised()?;
        let n = pins::validate(cs).or_else(|e| self.report(e))?;
        self.sdk.gpio_put(n, false);
        Ok(())
    }

    fn deselect(&mut self, cs: Pin) -> Result<()> {
        self.ensure_initialised()?;
        let n = pins::validate(cs).or_else(|e| self.report(e))?;
        self.sdk.gpio_put(n, true);
        Ok(())
    }

    fn is_readable(&self) -> bool {
        self.initialised && self.sdk.spi_is_readable(self.block())
    }

    fn is_writable(&self) -> bool {
        self.initialised && self.sdk.spi_is_writable(self.block())
    }

    fn is_busy(&self) -> bool {
        self.initialised && self.sdk.spi_is_busy(self.block())
    }

    fn repeated_read(&mut self, filler: u8, buffer: &mut [u8]) -> Result<usize> {
        self.ensure_initialised()?;
        let code = self.sdk.spi_read_blocking(self.block(), filler, buffer);
        self.finish(code, Error::Read)
    }

    fn repeated_read16(&mut self, filler: u16, buffer: &mut [u16]) -> Result<usize> {
        self.ensure_initialised()?;
        let code = self.sdk.spi_read16_blocking(self.block(), filler, buffer);
        self.finish(code, Error::Read)
    }

    fn write(&mut self, buffer: &[u8]) -> Result<usize> {
        self.ensure_initialised()?;
        let code = self.sdk.spi_write_blocking(self.block(), buffer);
        self.finish(code, Error::Write)
    }

    fn write16(&mut self, buffer: &[u16]) -> Result<usize> {
        self.ensure_initialised()?;
        let code = self.sdk.spi_write16_blocking(self.block(), buffer);
        self.finish(code, Error::Write)
    }

    /// Full-duplex exchange of `min(tx.len(), rx.len())` bytes
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<usize> {
        self.ensure_initialised()?;
        let len = tx.len().min(rx.len());
        let code = self
            .sdk
            .spi_write_read_blocking(self.block(), &tx[..len], &mut rx[..len]);
        self.finish(code, Error::Read)
    }
}

impl<S: Sdk> ErrorType for Spi<S> {
    type Error = Error;
}

impl<S: Sdk> embedded_hal::spi::SpiBus<u8> for Spi<S> {
    fn read(&mut self, words: &mut [u8]) -> Result<()> {
        self.repeated_read(DEFAULT_FILLER, words).map(|_| ())
    }

    fn write(&mut self, words: &[u8]) -> Result<()> {
        SpiInterface::write(self, words).map(|_| ())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<()> {
        let common = SpiInterface::transfer(self, write, read)?;
        if write.len() > common {
            SpiInterface::write(self, &write[common..])?;
        }
        if read.len() > common {
            self.repeated_read(DEFAULT_FILLER, &mut read[common..])?;
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<()> {
        let mut scratch = [0u8; 32];
        for chunk in words.chunks_mut(scratch.len()) {
            let tx = &mut scratch[..chunk.len()];
            tx.copy_from_slice(chunk);
            SpiInterface::transfer(self, tx, chunk)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_initialised()?;
        while self.is_busy() {}
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockSdk};
    use pinion_hal::{LastError, SpiConfig, SpiMode};

    const CLK: u32 = 125_000_000;

    fn ready(sdk: &MockSdk) -> Spi<&MockSdk> {
        let mut spi = Spi::detached(sdk, SpiInstance::Spi0);
        spi.init(pins::GPIO18, pins::GPIO19, pins::GPIO16, 1_000_000)
            .unwrap();
        spi
    }

    #[test]
    fn test_clock_dividers() {
        let c = clock_dividers(CLK, 1_000_000).unwrap();
        assert_eq!((c.prescale, c.postdiv), (2, 63));
        assert_eq!(c.actual, 992_063);

        assert_eq!(clock_dividers(CLK, 50_000_000).unwrap().actual, 31_250_000);
        // Faster than clk_peri / 2 settles on the fastest setting
        assert_eq!(clock_dividers(CLK, 100_000_000).unwrap().actual, 62_500_000);
    }

    #[test]
    fn test_clock_dividers_too_slow() {
        assert_eq!(clock_dividers(CLK, 0), Err(Error::TooSmall));
        assert_eq!(clock_dividers(CLK, 1_000), Err(Error::TooSmall));
        assert!(clock_dividers(CLK, 2_000).is_ok());
    }

    #[test]
    fn test_init_configures_hardware() {
        let sdk = MockSdk::new();
        let spi = ready(&sdk);

        assert!(spi.is_initialised());
        assert_eq!(spi.frequency(), 992_063);
        assert_eq!(spi.mode(), Mode::Master);
        for pin in [16, 18, 19] {
            assert_eq!(sdk.funcsel(pin), funcsel::SPI);
        }
        assert!(sdk
            .calls()
            .contains(&Call::SpiClock { block: 0, prescale: 2, postdiv: 63 }));
    }

    #[test]
    fn test_init_rejects_foreign_pins() {
        static LAST: LastError = LastError::new();
        let sdk = MockSdk::new();
        let mut spi = Spi::new(&sdk, SpiInstance::Spi0, &LAST);

        // GPIO10/11/8 belong to SPI1
        assert_eq!(
            spi.init(pins::GPIO10, pins::GPIO11, pins::GPIO8, 1_000_000),
            Err(Error::NotAvailableOnPlatform)
        );
        assert_eq!(LAST.take(), Some((Source::Spi(0), Error::NotAvailableOnPlatform)));
        // MOSI and MISO swapped
        assert_eq!(
            spi.init(pins::GPIO18, pins::GPIO16, pins::GPIO19, 1_000_000),
            Err(Error::NotAvailableOnPlatform)
        );
        assert!(!spi.is_initialised());
    }

    #[test]
    fn test_set_format_limits() {
        let sdk = MockSdk::new();
        let mut spi = ready(&sdk);
        let (pol, pha) = (ClockPolarity::IdleHigh, ClockPhase::CaptureOnSecondTransition);

        assert_eq!(spi.set_format(3, pol, pha, BitOrder::MsbFirst), Err(Error::TooSmall));
        assert_eq!(spi.set_format(17, pol, pha, BitOrder::MsbFirst), Err(Error::TooBig));
        assert_eq!(
            spi.set_format(8, pol, pha, BitOrder::LsbFirst),
            Err(Error::NotAvailableOnPlatform)
        );
        spi.set_format(16, pol, pha, BitOrder::MsbFirst).unwrap();
        assert!(sdk.calls().contains(&Call::SpiFormat {
            block: 0,
            data_bits: 16,
            polarity: pol,
            phase: pha
        }));
    }

    #[test]
    fn test_select_drives_cs() {
        let sdk = MockSdk::new();
        let mut spi = ready(&sdk);

        spi.select(pins::GPIO17).unwrap();
        assert!(!sdk.output_level(17));
        spi.write(&[0x9F]).unwrap();
        spi.deselect(pins::GPIO17).unwrap();
        assert!(sdk.output_level(17));

        assert_eq!(sdk.spi_tx(0), [0x9F]);
    }

    #[test]
    fn test_reads_use_filler() {
        let sdk = MockSdk::new();
        let mut spi = ready(&sdk);
        sdk.push_spi_rx(0, &[0xEF, 0x40]);

        let mut id = [0u8; 2];
        assert_eq!(spi.read(&mut id), Ok(2));
        assert_eq!(id, [0xEF, 0x40]);
        assert!(sdk.calls().contains(&Call::SpiRead { block: 0, filler: 0, len: 2 }));

        let mut words = [0u16; 1];
        sdk.push_spi_rx16(0, &[0xBEEF]);
        assert_eq!(spi.read16(&mut words), Ok(1));
        assert_eq!(words, [0xBEEF]);
    }

    #[test]
    fn test_transfer_full_duplex() {
        let sdk = MockSdk::new();
        let mut spi = ready(&sdk);
        sdk.push_spi_rx(0, &[1, 2, 3]);

        let mut rx = [0u8; 3];
        assert_eq!(spi.transfer(&[0xA0, 0xA1, 0xA2], &mut rx), Ok(3));
        assert_eq!(rx, [1, 2, 3]);
        assert_eq!(sdk.spi_tx(0), [0xA0, 0xA1, 0xA2]);
    }

    #[test]
    fn test_transfer_error_kinds() {
        let sdk = MockSdk::new();
        let mut spi = ready(&sdk);

        sdk.fail_next_transfer(status::TIMEOUT);
        assert_eq!(spi.write(&[0]), Err(Error::Timeout));
        sdk.fail_next_transfer(status::IO);
        assert_eq!(spi.write(&[0]), Err(Error::Write));
        sdk.fail_next_transfer(status::IO);
        assert_eq!(spi.read(&mut [0]), Err(Error::Read));
    }

    #[test]
    fn test_uninitialised_spi() {
        let sdk = MockSdk::new();
        let mut spi = Spi::detached(&sdk, SpiInstance::Spi1);

        assert_eq!(spi.write(&[1]), Err(Error::Generic));
        assert_eq!(spi.select(pins::GPIO9), Err(Error::Generic));
        assert_eq!(spi.set_mode(Mode::Slave), Err(Error::Generic));
        assert!(!spi.is_busy());
        assert_eq!(spi.deinit(), Ok(()));
    }

    #[test]
    fn test_init_with_mode3() {
        let sdk = MockSdk::new();
        let mut spi = Spi::detached(&sdk, SpiInstance::Spi1);
        let config = SpiConfig {
            sck: pins::GPIO10,
            mosi: pins::GPIO11,
            miso: pins::GPIO8,
            ..SpiConfig::default()
        }
        .with_mode(SpiMode::Mode3);

        spi.init_with(&config).unwrap();
        assert_eq!(spi.frequency(), 31_250_000);
        assert!(sdk.calls().contains(&Call::SpiFormat {
            block: 1,
            data_bits: 8,
            polarity: ClockPolarity::IdleHigh,
            phase: ClockPhase::CaptureOnSecondTransition
        }));
    }

    #[test]
    fn test_embedded_hal_uneven_transfer() {
        use embedded_hal::spi::SpiBus;

        let sdk = MockSdk::new();
        let mut spi = ready(&sdk);
        sdk.push_spi_rx(0, &[7, 8, 9, 10]);

        let mut read = [0u8; 4];
        SpiBus::transfer(&mut spi, &mut read, &[0x03, 0x00]).unwrap();
        assert_eq!(read, [7, 8, 9, 10]);
        assert_eq!(sdk.spi_tx(0), [0x03, 0x00]);

        sdk.push_spi_rx(0, &[0x55, 0x66]);
        let mut buf = [0x11, 0x22];
        SpiBus::transfer_in_place(&mut spi, &mut buf).unwrap();
        assert_eq!(buf, [0x55, 0x66]);
        SpiBus::flush(&mut spi).unwrap();
    }

    #[test]
    fn test_deinit_releases_pins() {
        let sdk = MockSdk::new();
        let mut spi = ready(&sdk);

        spi.deinit().unwrap();
        assert!(!spi.is_initialised());
        for pin in [16, 18, 19] {
            assert_eq!(sdk.funcsel(pin), funcsel::NULL);
        }
    }
}
