//! UART driver
//!
//! RP2040 has two UART peripherals (UART0 and UART1), each with its own
//! set of pin options; see [`crate::pins::uart_route`].

use pinion_hal::diagnostics::{Diagnostics, Source};
use pinion_hal::{DataBits, Error, InstanceId, Parity, Pin, Result, StopBits, UartInterface};

use crate::pins::{self, funcsel, UartRole};
use crate::sdk::{status, Sdk};

/// UART peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartInstance {
    Uart0,
    Uart1,
}

impl UartInstance {
    pub(crate) const fn from_block(block: u8) -> Self {
        match block {
            1 => UartInstance::Uart1,
            _ => UartInstance::Uart0,
        }
    }

    pub const fn block(self) -> u8 {
        self as u8
    }
}

impl InstanceId for UartInstance {
    const COUNT: usize = 2;

    fn index(self) -> usize {
        self as usize
    }

    fn from_index(index: usize) -> Self {
        match index {
            1 => UartInstance::Uart1,
            _ => UartInstance::Uart0,
        }
    }
}

/// Baud rate divisors for one rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartDivisors {
    /// Integer part
    pub ibrd: u32,
    /// Fractional part in 64ths
    pub fbrd: u32,
    /// Baud rate produced by these divisors
    pub actual: u32,
}

/// Compute baud rate divisors for `baudrate` from a `clk_peri` of
/// `clock_hz`
///
/// Rates outside the divisor range are clamped to the nearest achievable
/// rate rather than rejected, matching the vendor SDK.
pub fn divisors(clock_hz: u32, baudrate: u32) -> Result<UartDivisors> {
    if baudrate == 0 {
        return Err(Error::TooSmall);
    }
    let clock = u64::from(clock_hz);
    let div = 8 * clock / u64::from(baudrate) + 1;
    let ibrd = div >> 7;

    let (ibrd, fbrd) = match ibrd {
        0 => (1, 0),
        i if i >= 65_535 => (65_535, 0),
        i => (i, (div & 0x7F) >> 1),
    };

    Ok(UartDivisors {
        ibrd: ibrd as u32,
        fbrd: fbrd as u32,
        actual: (4 * clock / (64 * ibrd + fbrd)) as u32,
    })
}

/// Blocking UART on one peripheral
pub struct Uart<S: Sdk> {
    sdk: S,
    instance: UartInstance,
    rx: Pin,
    tx: Pin,
    baudrate: u32,
    initialised: bool,
    diagnostics: &'static dyn Diagnostics,
}

impl<S: Sdk> Uart<S> {
    pub(crate) fn new(sdk: S, instance: UartInstance, diagnostics: &'static dyn Diagnostics) -> Self {
        let (rx, tx) = match instance {
            UartInstance::Uart0 => (pins::GPIO1, pins::GPIO0),
            UartInstance::Uart1 => (pins::GPIO5, pins::GPIO4),
        };
        Self {
            sdk,
            instance,
            rx,
            tx,
            baudrate: 0,
            initialised: false,
            diagnostics,
        }
    }

    #[cfg(test)]
    pub(crate) fn detached(sdk: S, instance: UartInstance) -> Self {
        Self::new(sdk, instance, &pinion_hal::diagnostics::NO_DIAGNOSTICS)
    }

    pub fn instance(&self) -> UartInstance {
        self.instance
    }

    fn block(&self) -> u8 {
        self.instance.block()
    }

    fn report<T>(&self, error: Error) -> Result<T> {
        self.diagnostics
            .record(Source::Uart(self.instance.block()), error);
        Err(error)
    }

    fn ensure_initialised(&self) -> Result<()> {
        if self.initialised {
            Ok(())
        } else {
            self.report(Error::Generic)
        }
    }

    fn check_pins(&self, rx: Pin, tx: Pin) -> Result<()> {
        let rx_ok = pins::uart_route(rx)? == (self.instance, UartRole::Rx);
        let tx_ok = pins::uart_route(tx)? == (self.instance, UartRole::Tx);
        if rx_ok && tx_ok {
            Ok(())
        } else {
            Err(Error::NotAvailableOnPlatform)
        }
    }

    fn route_pins(&self, sel: u8) {
        self.sdk.gpio_set_function(self.tx.number(), sel);
        self.sdk.gpio_set_function(self.rx.number(), sel);
    }
}

impl<S: Sdk> UartInterface for Uart<S> {
    fn init(&mut self, rx: Pin, tx: Pin, baudrate: u32) -> Result<()> {
        let prepared = self
            .check_pins(rx, tx)
            .and_then(|()| divisors(self.sdk.clock_peri_hz(), baudrate));
        let div = match prepared {
            Ok(div) => div,
            Err(e) => {
                warn!("UART{}: init rejected", self.block());
                self.deinit()?;
                return self.report(e);
            }
        };

        let block = self.block();
        if self.initialised {
            self.sdk.uart_disable(block);
            self.route_pins(funcsel::NULL);
        }
        self.rx = rx;
        self.tx = tx;
        self.sdk.uart_set_divisors(block, div.ibrd, div.fbrd);
        self.sdk.uart_set_format(block, 8, 1, Parity::None);
        self.sdk.uart_enable(block);
        self.route_pins(funcsel::UART);

        self.baudrate = div.actual;
        self.initialised = true;
        debug!("UART{}: running at {} baud", block, div.actual);
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        if !self.initialised {
            return Ok(());
        }
        self.sdk.uart_disable(self.block());
        self.route_pins(funcsel::NULL);
        self.initialised = false;
        debug!("UART{}: released", self.block());
        Ok(())
    }

    fn is_initialised(&self) -> bool {
        self.initialised
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        UartInterface::read(self, &mut byte)?;
        Ok(byte[0])
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        self.ensure_initialised()?;
        if buffer.is_empty() {
            return Ok(0);
        }
        let code = self.sdk.uart_read_blocking(self.block(), buffer);
        status::check(code, Error::Read).or_else(|e| {
            trace!("UART{}: read failed", self.block());
            self.report(e)
        })
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        UartInterface::write(self, &[byte]).map(|_| ())
    }

    fn write(&mut self, buffer: &[u8]) -> Result<usize> {
        self.ensure_initialised()?;
        if buffer.is_empty() {
            return Ok(0);
        }
        let code = self.sdk.uart_write_blocking(self.block(), buffer);
        status::check(code, Error::Write).or_else(|e| {
            trace!("UART{}: write failed", self.block());
            self.report(e)
        })
    }

    fn set_pins(&mut self, rx: Pin, tx: Pin) -> Result<()> {
        if let Err(e) = self.check_pins(rx, tx) {
            return self.report(e);
        }
        if self.initialised {
            self.route_pins(funcsel::NULL);
        }
        self.rx = rx;
        self.tx = tx;
        if self.initialised {
            self.route_pins(funcsel::UART);
        }
        Ok(())
    }

    fn pins(&self) -> (Pin, Pin) {
        (self.rx, self.tx)
    }

    fn set_baudrate(&mut self, baudrate: u32) -> Result<u32> {
        self.ensure_initialised()?;
        let div = match divisors(self.sdk.clock_peri_hz(), baudrate) {
            Ok(div) => div,
            Err(e) => return self.report(e),
        };
        self.sdk.uart_set_divisors(self.block(), div.ibrd, div.fbrd);
        self.baudrate = div.actual;
        Ok(div.actual)
    }

    fn baudrate(&self) -> u32 {
        self.baudrate
    }

    fn is_readable(&self) -> bool {
        self.initialised && self.sdk.uart_is_readable(self.block())
    }

    fn is_writable(&self) -> bool {
        self.initialised && self.sdk.uart_is_writable(self.block())
    }

    fn set_format(&mut self, data_bits: DataBits, stop_bits: StopBits, parity: Parity) -> Result<()> {
        self.ensure_initialised()?;
        // Frames are 5 to 8 bits wide
        if data_bits == DataBits::Nine {
            return self.report(Error::NotAvailableOnPlatform);
        }
        self.sdk
            .uart_set_format(self.block(), data_bits.bits(), stop_bits.bits(), parity);
        Ok(())
    }

    fn set_hw_flow(&mut self, cts: bool, rts: bool) -> Result<()> {
        self.ensure_initialised()?;
        self.sdk.uart_set_hw_flow(self.block(), cts, rts);
        Ok(())
    }
}

impl<S: Sdk> embedded_io::ErrorType for Uart<S> {
    type Error = Error;
}

impl<S: Sdk> embedded_io::Read for Uart<S> {
    /// Block for the first byte, then take whatever else is already waiting
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(0);
        };
        *first = self.read_byte()?;
        let mut count = 1;
        for slot in rest {
            if !self.is_readable() {
                break;
            }
            *slot = self.read_byte()?;
            count += 1;
        }
        Ok(count)
    }
}

impl<S: Sdk> embedded_io::Write for Uart<S> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        UartInterface::write(self, buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_initialised()
    }
}

impl<S: Sdk> embedded_io::ReadReady for Uart<S> {
    fn read_ready(&mut self) -> Result<bool> {
        self.ensure_initialised()?;
        Ok(self.is_readable())
    }
}

impl<S: Sdk> embedded_io::WriteReady for Uart<S> {
    fn write_ready(&mut self) -> Result<bool> {
        self.ensure_initialised()?;
        Ok(self.is_writable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockSdk};
    use pinion_hal::UartConfig;

    const CLK: u32 = 125_000_000;

    fn ready(sdk: &MockSdk) -> Uart<&MockSdk> {
        let mut uart = Uart::detached(sdk, UartInstance::Uart0);
        uart.init(pins::GPIO1, pins::GPIO0, 115_200).unwrap();
        uart
    }

    #[test]
    fn test_divisors_115200() {
        let d = divisors(CLK, 115_200).unwrap();
        assert_eq!((d.ibrd, d.fbrd), (67, 52));
        assert_eq!(d.actual, 115_207);
    }

    #[test]
    fn test_divisors_clamp() {
        assert_eq!(divisors(CLK, 0), Err(Error::TooSmall));

        let fast = divisors(CLK, 100_000_000).unwrap();
        assert_eq!((fast.ibrd, fast.fbrd), (1, 0));

        let slow = divisors(CLK, 100).unwrap();
        assert_eq!((slow.ibrd, slow.fbrd), (65_535, 0));
    }

    #[test]
    fn test_init_configures_hardware() {
        let sdk = MockSdk::new();
        let uart = ready(&sdk);

        assert!(uart.is_initialised());
        assert_eq!(uart.baudrate(), 115_207);
        assert_eq!(uart.pins(), (pins::GPIO1, pins::GPIO0));
        assert_eq!(sdk.funcsel(0), funcsel::UART);
        assert_eq!(sdk.funcsel(1), funcsel::UART);
        assert!(sdk.calls().contains(&Call::UartDivisors { block: 0, ibrd: 67, fbrd: 52 }));
    }

    #[test]
    fn test_init_rejects_wrong_pins() {
        let sdk = MockSdk::new();
        let mut uart = Uart::detached(&sdk, UartInstance::Uart0);

        // GPIO4/5 belong to UART1
        assert_eq!(uart.init(pins::GPIO5, pins::GPIO4, 9_600), Err(Error::NotAvailableOnPlatform));
        // TX and RX swapped
        assert_eq!(uart.init(pins::GPIO0, pins::GPIO1, 9_600), Err(Error::NotAvailableOnPlatform));
        assert!(!uart.is_initialised());
    }

    #[test]
    fn test_read_write() {
        let sdk = MockSdk::new();
        let mut uart = ready(&sdk);

        uart.write(b"AT\r\n").unwrap();
        uart.write_byte(b'!').unwrap();
        assert_eq!(sdk.uart_tx(0), b"AT\r\n!");

        sdk.push_uart_rx(0, b"OK");
        assert!(uart.is_readable());
        let mut reply = [0u8; 2];
        assert_eq!(uart.read(&mut reply), Ok(2));
        assert_eq!(&reply, b"OK");
        assert!(!uart.is_readable());
    }

    #[test]
    fn test_read_without_data() {
        let sdk = MockSdk::new();
        let mut uart = ready(&sdk);

        assert_eq!(uart.read_byte(), Err(Error::Again));
    }

    #[test]
    fn test_uninitialised_uart() {
        let sdk = MockSdk::new();
        let mut uart = Uart::detached(&sdk, UartInstance::Uart1);

        assert_eq!(uart.write(b"x"), Err(Error::Generic));
        assert_eq!(uart.set_baudrate(9_600), Err(Error::Generic));
        assert!(!uart.is_writable());
        assert_eq!(uart.deinit(), Ok(()));
    }

    #[test]
    fn test_set_format() {
        let sdk = MockSdk::new();
        let mut uart = ready(&sdk);

        uart.set_format(DataBits::Seven, StopBits::Two, Parity::Even).unwrap();
        assert!(sdk.calls().contains(&Call::UartFormat {
            block: 0,
            data_bits: 7,
            stop_bits: 2,
            parity: Parity::Even
        }));
        assert_eq!(
            uart.set_format(DataBits::Nine, StopBits::One, Parity::None),
            Err(Error::NotAvailableOnPlatform)
        );
    }

    #[test]
    fn test_init_with_config() {
        let sdk = MockSdk::new();
        let mut uart = Uart::detached(&sdk, UartInstance::Uart1);
        let config = UartConfig {
            rx: pins::GPIO9,
            tx: pins::GPIO8,
            baudrate: 9_600,
            parity: Parity::Odd,
            ..UartConfig::default()
        };

        uart.init_with(&config).unwrap();
        assert_eq!(uart.pins(), (pins::GPIO9, pins::GPIO8));
        assert!(sdk.calls().contains(&Call::UartFormat {
            block: 1,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::Odd
        }));
    }

    #[test]
    fn test_embedded_io_read_drains_available() {
        use embedded_io::{Read, ReadReady};

        let sdk = MockSdk::new();
        let mut uart = ready(&sdk);
        sdk.push_uart_rx(0, b"abc");

        let mut buf = [0u8; 8];
        assert_eq!(Read::read(&mut uart, &mut buf), Ok(3));
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(uart.read_ready(), Ok(false));
    }

    #[test]
    fn test_hw_flow_and_release() {
        let sdk = MockSdk::new();
        let mut uart = ready(&sdk);

        uart.set_hw_flow(true, true).unwrap();
        assert!(sdk.calls().contains(&Call::UartHwFlow { block: 0, cts: true, rts: true }));

        uart.deinit().unwrap();
        assert_eq!(sdk.funcsel(0), funcsel::NULL);
        assert!(!uart.is_readable());
    }
}
