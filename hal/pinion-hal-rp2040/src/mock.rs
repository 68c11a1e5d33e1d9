//! Scripted vendor SDK for host tests
//!
//! [`MockSdk`] keeps a model of pin multiplexing, FIFOs and PWM slices in
//! plain memory and logs every hardware-changing call. The SDK traits are
//! implemented for `&MockSdk`, so one mock can back any number of drivers
//! and the test keeps a handle to inspect it afterwards.
//!
//! Available in test builds and with the `mock` feature.

use core::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::vec::Vec;

use pinion_hal::{ClockPhase, ClockPolarity, Parity};

use crate::pins::{funcsel, GPIO_COUNT};
use crate::pwm::SLICE_COUNT;
use crate::sdk::{status, ClockSdk, GpioSdk, I2cSdk, PwmSdk, SpiSdk, UartSdk};

/// Default clk_sys and clk_peri
pub const DEFAULT_CLOCK_HZ: u32 = 125_000_000;

/// Hardware-changing SDK call, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GpioInit { pin: u8 },
    GpioDeinit { pin: u8 },
    GpioDir { pin: u8, out: bool },
    GpioPut { pin: u8, high: bool },
    GpioPulls { pin: u8, up: bool, down: bool },
    GpioFunction { pin: u8, funcsel: u8 },
    GpioSlew { pin: u8, fast: bool },
    GpioIrq { pin: u8, events: u32, enabled: bool },
    I2cEnable { block: u8, enabled: bool },
    I2cTiming { block: u8, hcnt: u32, lcnt: u32, sda_hold: u32 },
    I2cSlaveMode { block: u8, slave: bool, address: u8 },
    I2cRead { block: u8, address: u8, len: usize, nostop: bool },
    I2cWrite { block: u8, address: u8, data: Vec<u8>, nostop: bool },
    UartEnable { block: u8, enabled: bool },
    UartDivisors { block: u8, ibrd: u32, fbrd: u32 },
    UartFormat { block: u8, data_bits: u8, stop_bits: u8, parity: Parity },
    UartHwFlow { block: u8, cts: bool, rts: bool },
    UartWrite { block: u8, data: Vec<u8> },
    SpiEnable { block: u8, enabled: bool },
    SpiClock { block: u8, prescale: u32, postdiv: u32 },
    SpiFormat { block: u8, data_bits: u8, polarity: ClockPolarity, phase: ClockPhase },
    SpiSlave { block: u8, slave: bool },
    SpiRead { block: u8, filler: u16, len: usize },
    SpiWrite { block: u8, data: Vec<u8> },
    PwmConfigure { slice: u8, div_int: u8, div_frac: u8, top: u16 },
    PwmLevel { slice: u8, channel: u8, level: u16 },
    PwmEnable { slice: u8, enabled: bool },
    PwmCounter { slice: u8, value: u16 },
}

#[derive(Debug, Clone, Copy)]
struct PinState {
    funcsel: u8,
    output: bool,
    out_level: bool,
    in_level: bool,
    pull_up: bool,
    pull_down: bool,
}

impl Default for PinState {
    fn default() -> Self {
        Self {
            funcsel: funcsel::NULL,
            output: false,
            out_level: false,
            in_level: false,
            pull_up: false,
            pull_down: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SliceState {
    enabled: bool,
    div_int: u8,
    div_frac: u8,
    top: u16,
    counter: u16,
    levels: [u16; 2],
}

impl Default for SliceState {
    // Reset values: divider 1.0, full 16-bit wrap
    fn default() -> Self {
        Self {
            enabled: false,
            div_int: 1,
            div_frac: 0,
            top: u16::MAX,
            counter: 0,
            levels: [0; 2],
        }
    }
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    pins: [PinState; GPIO_COUNT as usize],
    i2c_devices: BTreeSet<u8>,
    i2c_timeouts: BTreeSet<u8>,
    i2c_probed: BTreeSet<u8>,
    i2c_rx: VecDeque<u8>,
    uart_rx: [VecDeque<u8>; 2],
    uart_tx: [Vec<u8>; 2],
    spi_rx: [VecDeque<u16>; 2],
    spi_tx: [Vec<u8>; 2],
    slices: [SliceState; SLICE_COUNT as usize],
    fail_next: Option<i32>,
    clock_sys_hz: u32,
    clock_peri_hz: u32,
    slept_us: u64,
}

/// In-memory stand-in for the vendor SDK
#[derive(Debug)]
pub struct MockSdk {
    state: RefCell<State>,
}

impl Default for MockSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSdk {
    /// Fresh chip: every pin on the NULL function, clocks at 125 MHz
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                clock_sys_hz: DEFAULT_CLOCK_HZ,
                clock_peri_hz: DEFAULT_CLOCK_HZ,
                ..State::default()
            }),
        }
    }

    /// Override clk_sys and clk_peri
    pub fn set_clocks(&self, sys_hz: u32, peri_hz: u32) {
        let mut state = self.state.borrow_mut();
        state.clock_sys_hz = sys_hz;
        state.clock_peri_hz = peri_hz;
    }

    /// Call log so far
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Make the next transfer on any bus return `code`
    pub fn fail_next_transfer(&self, code: i32) {
        self.state.borrow_mut().fail_next = Some(code);
    }

    pub fn funcsel(&self, pin: u8) -> u8 {
        self.pin(pin).funcsel
    }

    pub fn is_output(&self, pin: u8) -> bool {
        self.pin(pin).output
    }

    /// Level the pin is driving
    pub fn output_level(&self, pin: u8) -> bool {
        self.pin(pin).out_level
    }

    /// `(pull_up, pull_down)`
    pub fn pulls(&self, pin: u8) -> (bool, bool) {
        let state = self.pin(pin);
        (state.pull_up, state.pull_down)
    }

    /// Drive the pad of an input pin from outside
    pub fn set_input(&self, pin: u8, high: bool) {
        self.with_pin(pin, |p| p.in_level = high);
    }

    /// Attach a device that acknowledges `address`
    pub fn add_i2c_device(&self, address: u8) {
        self.state.borrow_mut().i2c_devices.insert(address);
    }

    /// Make transfers to `address` time out, present or not
    pub fn set_i2c_timeout(&self, address: u8) {
        self.state.borrow_mut().i2c_timeouts.insert(address);
    }

    /// Queue bytes returned by I2C reads
    pub fn push_i2c_rx(&self, data: &[u8]) {
        self.state.borrow_mut().i2c_rx.extend(data.iter().copied());
    }

    /// Whether any transfer addressed `address`
    pub fn i2c_probed(&self, address: u8) -> bool {
        self.state.borrow().i2c_probed.contains(&address)
    }

    /// Queue bytes arriving on a UART
    pub fn push_uart_rx(&self, block: u8, data: &[u8]) {
        self.state.borrow_mut().uart_rx[block_index(block)].extend(data.iter().copied());
    }

    /// Everything written to a UART
    pub fn uart_tx(&self, block: u8) -> Vec<u8> {
        self.state.borrow().uart_tx[block_index(block)].clone()
    }

    /// Queue bytes shifted in on an SPI bus
    pub fn push_spi_rx(&self, block: u8, data: &[u8]) {
        self.state.borrow_mut().spi_rx[block_index(block)].extend(data.iter().map(|&b| u16::from(b)));
    }

    /// Queue 16-bit words shifted in on an SPI bus
    pub fn push_spi_rx16(&self, block: u8, data: &[u16]) {
        self.state.borrow_mut().spi_rx[block_index(block)].extend(data.iter().copied());
    }

    /// Everything shifted out on an SPI bus, 16-bit words high byte first
    pub fn spi_tx(&self, block: u8) -> Vec<u8> {
        self.state.borrow().spi_tx[block_index(block)].clone()
    }

    pub fn pwm_enabled(&self, slice: u8) -> bool {
        self.slice(slice).enabled
    }

    pub fn pwm_level(&self, slice: u8, channel: u8) -> u16 {
        self.slice(slice).levels[usize::from(channel & 1)]
    }

    /// Total time passed to `sleep_us`
    pub fn slept_us(&self) -> u64 {
        self.state.borrow().slept_us
    }

    fn log(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn pin(&self, pin: u8) -> PinState {
        self.state
            .borrow()
            .pins
            .get(usize::from(pin))
            .copied()
            .unwrap_or_default()
    }

    fn with_pin(&self, pin: u8, f: impl FnOnce(&mut PinState)) {
        if let Some(state) = self.state.borrow_mut().pins.get_mut(usize::from(pin)) {
            f(state);
        }
    }

    fn slice(&self, slice: u8) -> SliceState {
        self.state.borrow().slices[slice_index(slice)]
    }

    fn with_slice(&self, slice: u8, f: impl FnOnce(&mut SliceState)) {
        f(&mut self.state.borrow_mut().slices[slice_index(slice)]);
    }

    fn take_failure(&self) -> Option<i32> {
        self.state.borrow_mut().fail_next.take()
    }

    /// Pop `len` queued words, padding with zero when the queue runs dry
    fn shift_in(&self, block: u8, len: usize) -> Vec<u16> {
        let mut state = self.state.borrow_mut();
        let queue = &mut state.spi_rx[block_index(block)];
        (0..len).map(|_| queue.pop_front().unwrap_or(0)).collect()
    }

    fn shift_out(&self, block: u8, data: &[u8]) {
        self.state.borrow_mut().spi_tx[block_index(block)].extend_from_slice(data);
        self.log(Call::SpiWrite {
            block,
            data: data.to_vec(),
        });
    }

    fn i2c_transfer(&self, address: u8) -> Option<i32> {
        let mut state = self.state.borrow_mut();
        state.i2c_probed.insert(address);
        if state.i2c_timeouts.contains(&address) {
            Some(status::TIMEOUT)
        } else if !state.i2c_devices.contains(&address) {
            Some(status::GENERIC)
        } else {
            None
        }
    }
}

fn block_index(block: u8) -> usize {
    usize::from(block & 1)
}

fn slice_index(slice: u8) -> usize {
    usize::from(slice % SLICE_COUNT)
}

fn byte_count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

impl GpioSdk for &MockSdk {
    fn gpio_init(&self, pin: u8) {
        self.with_pin(pin, |p| {
            p.funcsel = funcsel::SIO;
            p.output = false;
            p.out_level = false;
        });
        self.log(Call::GpioInit { pin });
    }

    fn gpio_deinit(&self, pin: u8) {
        self.with_pin(pin, |p| p.funcsel = funcsel::NULL);
        self.log(Call::GpioDeinit { pin });
    }

    fn gpio_set_dir(&self, pin: u8, out: bool) {
        self.with_pin(pin, |p| p.output = out);
        self.log(Call::GpioDir { pin, out });
    }

    fn gpio_put(&self, pin: u8, high: bool) {
        self.with_pin(pin, |p| p.out_level = high);
        self.log(Call::GpioPut { pin, high });
    }

    fn gpio_get(&self, pin: u8) -> bool {
        let state = self.pin(pin);
        if state.output {
            state.out_level
        } else {
            state.in_level
        }
    }

    fn gpio_get_out_level(&self, pin: u8) -> bool {
        self.pin(pin).out_level
    }

    fn gpio_set_pulls(&self, pin: u8, up: bool, down: bool) {
        self.with_pin(pin, |p| {
            p.pull_up = up;
            p.pull_down = down;
        });
        self.log(Call::GpioPulls { pin, up, down });
    }

    fn gpio_set_function(&self, pin: u8, funcsel: u8) {
        self.with_pin(pin, |p| p.funcsel = funcsel);
        self.log(Call::GpioFunction { pin, funcsel });
    }

    fn gpio_set_slew_rate(&self, pin: u8, fast: bool) {
        self.log(Call::GpioSlew { pin, fast });
    }

    fn gpio_set_irq_enabled(&self, pin: u8, events: u32, enabled: bool) {
        self.log(Call::GpioIrq { pin, events, enabled });
    }
}

impl I2cSdk for &MockSdk {
    fn i2c_enable(&self, block: u8) {
        self.log(Call::I2cEnable { block, enabled: true });
    }

    fn i2c_disable(&self, block: u8) {
        self.log(Call::I2cEnable { block, enabled: false });
    }

    fn i2c_set_timing(&self, block: u8, hcnt: u32, lcnt: u32, sda_hold: u32) {
        self.log(Call::I2cTiming { block, hcnt, lcnt, sda_hold });
    }

    fn i2c_set_slave_mode(&self, block: u8, slave: bool, address: u8) {
        self.log(Call::I2cSlaveMode { block, slave, address });
    }

    fn i2c_read_blocking(&self, block: u8, address: u8, buffer: &mut [u8], nostop: bool) -> i32 {
        self.log(Call::I2cRead {
            block,
            address,
            len: buffer.len(),
            nostop,
        });
        if let Some(code) = self.take_failure().or_else(|| self.i2c_transfer(address)) {
            return code;
        }
        let mut state = self.state.borrow_mut();
        for byte in buffer.iter_mut() {
            *byte = state.i2c_rx.pop_front().unwrap_or(0);
        }
        byte_count(buffer.len())
    }

    fn i2c_write_blocking(&self, block: u8, address: u8, buffer: &[u8], nostop: bool) -> i32 {
        self.log(Call::I2cWrite {
            block,
            address,
            data: buffer.to_vec(),
            nostop,
        });
        if let Some(code) = self.take_failure().or_else(|| self.i2c_transfer(address)) {
            return code;
        }
        byte_count(buffer.len())
    }

    fn i2c_read_available(&self, _block: u8) -> usize {
        self.state.borrow().i2c_rx.len()
    }

    fn i2c_write_available(&self, _block: u8) -> usize {
        // TX FIFO depth
        16
    }
}

impl UartSdk for &MockSdk {
    fn uart_enable(&self, block: u8) {
        self.log(Call::UartEnable { block, enabled: true });
    }

    fn uart_disable(&self, block: u8) {
        self.log(Call::UartEnable { block, enabled: false });
    }

    fn uart_set_divisors(&self, block: u8, ibrd: u32, fbrd: u32) {
        self.log(Call::UartDivisors { block, ibrd, fbrd });
    }

    fn uart_set_format(&self, block: u8, data_bits: u8, stop_bits: u8, parity: Parity) {
        self.log(Call::UartFormat {
            block,
            data_bits,
            stop_bits,
            parity,
        });
    }

    fn uart_set_hw_flow(&self, block: u8, cts: bool, rts: bool) {
        self.log(Call::UartHwFlow { block, cts, rts });
    }

    fn uart_is_readable(&self, block: u8) -> bool {
        !self.state.borrow().uart_rx[block_index(block)].is_empty()
    }

    fn uart_is_writable(&self, _block: u8) -> bool {
        true
    }

    fn uart_read_blocking(&self, block: u8, buffer: &mut [u8]) -> i32 {
        if let Some(code) = self.take_failure() {
            return code;
        }
        let mut state = self.state.borrow_mut();
        let queue = &mut state.uart_rx[block_index(block)];
        // Never blocks: a short queue reports no data and keeps its bytes
        if queue.len() < buffer.len() {
            return status::NO_DATA;
        }
        for byte in buffer.iter_mut() {
            *byte = queue.pop_front().unwrap_or(0);
        }
        byte_count(buffer.len())
    }

    fn uart_write_blocking(&self, block: u8, buffer: &[u8]) -> i32 {
        if let Some(code) = self.take_failure() {
            return code;
        }
        self.state.borrow_mut().uart_tx[block_index(block)].extend_from_slice(buffer);
        self.log(Call::UartWrite {
            block,
            data: buffer.to_vec(),
        });
        byte_count(buffer.len())
    }
}

impl SpiSdk for &MockSdk {
    fn spi_enable(&self, block: u8) {
        self.log(Call::SpiEnable { block, enabled: true });
    }

    fn spi_disable(&self, block: u8) {
        self.log(Call::SpiEnable { block, enabled: false });
    }

    fn spi_set_clock(&self, block: u8, prescale: u32, postdiv: u32) {
        self.log(Call::SpiClock { block, prescale, postdiv });
    }

    fn spi_set_format(&self, block: u8, data_bits: u8, polarity: ClockPolarity, phase: ClockPhase) {
        self.log(Call::SpiFormat {
            block,
            data_bits,
            polarity,
            phase,
        });
    }

    fn spi_set_slave(&self, block: u8, slave: bool) {
        self.log(Call::SpiSlave { block, slave });
    }

    fn spi_is_readable(&self, block: u8) -> bool {
        !self.state.borrow().spi_rx[block_index(block)].is_empty()
    }

    fn spi_is_writable(&self, _block: u8) -> bool {
        true
    }

    fn spi_is_busy(&self, _block: u8) -> bool {
        false
    }

    fn spi_read_blocking(&self, block: u8, filler: u8, buffer: &mut [u8]) -> i32 {
        self.log(Call::SpiRead {
            block,
            filler: u16::from(filler),
            len: buffer.len(),
        });
        if let Some(code) = self.take_failure() {
            return code;
        }
        let len = buffer.len();
        for (byte, word) in buffer.iter_mut().zip(self.shift_in(block, len)) {
            *byte = word as u8;
        }
        byte_count(buffer.len())
    }

    fn spi_read16_blocking(&self, block: u8, filler: u16, buffer: &mut [u16]) -> i32 {
        self.log(Call::SpiRead {
            block,
            filler,
            len: buffer.len(),
        });
        if let Some(code) = self.take_failure() {
            return code;
        }
        let len = buffer.len();
        for (slot, word) in buffer.iter_mut().zip(self.shift_in(block, len)) {
            *slot = word;
        }
        byte_count(buffer.len())
    }

    fn spi_write_blocking(&self, block: u8, buffer: &[u8]) -> i32 {
        if let Some(code) = self.take_failure() {
            return code;
        }
        self.shift_out(block, buffer);
        byte_count(buffer.len())
    }

    fn spi_write16_blocking(&self, block: u8, buffer: &[u16]) -> i32 {
        if let Some(code) = self.take_failure() {
            return code;
        }
        let bytes: Vec<u8> = buffer.iter().flat_map(|w| w.to_be_bytes()).collect();
        self.shift_out(block, &bytes);
        byte_count(buffer.len())
    }

    fn spi_write_read_blocking(&self, block: u8, tx: &[u8], rx: &mut [u8]) -> i32 {
        if let Some(code) = self.take_failure() {
            return code;
        }
        self.shift_out(block, tx);
        let len = rx.len();
        for (byte, word) in rx.iter_mut().zip(self.shift_in(block, len)) {
            *byte = word as u8;
        }
        byte_count(rx.len())
    }
}

impl PwmSdk for &MockSdk {
    fn pwm_configure(&self, slice: u8, div_int: u8, div_frac: u8, top: u16) {
        self.with_slice(slice, |s| {
            s.div_int = div_int;
            s.div_frac = div_frac;
            s.top = top;
        });
        self.log(Call::PwmConfigure {
            slice,
            div_int,
            div_frac,
            top,
        });
    }

    fn pwm_set_chan_level(&self, slice: u8, channel: u8, level: u16) {
        self.with_slice(slice, |s| s.levels[usize::from(channel & 1)] = level);
        self.log(Call::PwmLevel { slice, channel, level });
    }

    fn pwm_get_chan_level(&self, slice: u8, channel: u8) -> u16 {
        self.slice(slice).levels[usize::from(channel & 1)]
    }

    fn pwm_get_clkdiv(&self, slice: u8) -> (u8, u8) {
        let s = self.slice(slice);
        (s.div_int, s.div_frac)
    }

    fn pwm_get_wrap(&self, slice: u8) -> u16 {
        self.slice(slice).top
    }

    fn pwm_set_enabled(&self, slice: u8, enabled: bool) {
        self.with_slice(slice, |s| s.enabled = enabled);
        self.log(Call::PwmEnable { slice, enabled });
    }

    fn pwm_is_enabled(&self, slice: u8) -> bool {
        self.slice(slice).enabled
    }

    fn pwm_get_counter(&self, slice: u8) -> u16 {
        self.slice(slice).counter
    }

    fn pwm_set_counter(&self, slice: u8, value: u16) {
        self.with_slice(slice, |s| s.counter = value);
        self.log(Call::PwmCounter { slice, value });
    }
}

impl ClockSdk for &MockSdk {
    fn clock_sys_hz(&self) -> u32 {
        self.state.borrow().clock_sys_hz
    }

    fn clock_peri_hz(&self) -> u32 {
        self.state.borrow().clock_peri_hz
    }

    fn sleep_us(&self, us: u64) {
        self.state.borrow_mut().slept_us += us;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_chip() {
        let sdk = MockSdk::new();
        assert_eq!(sdk.funcsel(0), funcsel::NULL);
        assert_eq!((&sdk).clock_sys_hz(), DEFAULT_CLOCK_HZ);
        assert!(sdk.calls().is_empty());
    }

    #[test]
    fn test_scripted_failure_is_one_shot() {
        let sdk = MockSdk::new();
        let handle = &sdk;
        handle.fail_next_transfer(status::IO);

        assert_eq!(handle.uart_write_blocking(0, b"x"), status::IO);
        assert_eq!(handle.uart_write_blocking(0, b"x"), 1);
        assert_eq!(sdk.uart_tx(0), b"x");
    }

    #[test]
    fn test_set_clocks() {
        let sdk = MockSdk::new();
        sdk.set_clocks(48_000_000, 12_000_000);
        assert_eq!((&sdk).clock_sys_hz(), 48_000_000);
        assert_eq!((&sdk).clock_peri_hz(), 12_000_000);
    }
}
