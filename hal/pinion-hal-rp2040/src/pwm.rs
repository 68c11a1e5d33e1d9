//! PWM output driver
//!
//! RP2040 has 8 slices with two outputs (A and B) each. Both outputs of a
//! slice share one counter, so frequency, enable and the raw counter are
//! per slice: changing them on one channel affects its sibling too. Only
//! the compare level is per output.

use embedded_hal::pwm::ErrorType;
use pinion_hal::diagnostics::{Diagnostics, Source};
use pinion_hal::pwm::MAX_DUTY_CYCLE;
use pinion_hal::{Error, InstanceId, Pin, PwmInterface, Result};

use crate::pins::{self, funcsel};
use crate::sdk::Sdk;

/// Number of PWM slices
pub const SLICE_COUNT: u8 = 8;

/// Output of a PWM slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmOutput {
    A,
    B,
}

/// One slice output, the unit a [`Pwm`] driver owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmChannel {
    slice: u8,
    output: PwmOutput,
}

impl PwmChannel {
    pub const fn new(slice: u8, output: PwmOutput) -> Self {
        Self {
            slice: slice % SLICE_COUNT,
            output,
        }
    }

    pub const fn slice(self) -> u8 {
        self.slice
    }

    pub const fn output(self) -> PwmOutput {
        self.output
    }

    /// Output number as the SDK expects it (A = 0, B = 1)
    const fn sdk_channel(self) -> u8 {
        self.output as u8
    }

    /// Lowest GPIO wired to this output
    pub const fn first_pin(self) -> Pin {
        Pin::new(self.slice * 2 + self.output as u8)
    }
}

impl InstanceId for PwmChannel {
    const COUNT: usize = SLICE_COUNT as usize * 2;

    fn index(self) -> usize {
        usize::from(self.slice) * 2 + self.output as usize
    }

    fn from_index(index: usize) -> Self {
        let output = if index % 2 == 0 { PwmOutput::A } else { PwmOutput::B };
        PwmChannel::new(((index / 2) % SLICE_COUNT as usize) as u8, output)
    }
}

/// Clock divider range in 16ths: 1.0 to 255 + 15/16
const MIN_DIV16: u64 = 16;
const MAX_DIV16: u64 = 0xFFF;

/// Largest wrap value; one below the counter limit so 100% duty is reachable
const MAX_TOP: u64 = 0xFFFE;

/// Slice settings for one frequency and duty cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmTiming {
    pub div_int: u8,
    /// Fractional divider in 16ths
    pub div_frac: u8,
    /// Counter wrap value
    pub top: u16,
    /// Compare level for the requested duty cycle
    pub level: u16,
    /// Frequency produced by these settings, in Hz
    pub actual: u32,
}

/// Compute slice settings for `frequency` Hz at `duty_cycle` percent from a
/// `clk_sys` of `clock_hz`
///
/// The divider is kept as small as possible so the counter has the most
/// resolution.
pub fn timing(clock_hz: u32, frequency: u32, duty_cycle: u8) -> Result<PwmTiming> {
    if frequency == 0 {
        return Err(Error::TooSmall);
    }
    if duty_cycle > MAX_DUTY_CYCLE {
        return Err(Error::TooBig);
    }
    let clock16 = u64::from(clock_hz) * 16;
    let freq = u64::from(frequency);

    let div16 = clock16.div_ceil(freq * 0x1_0000).max(MIN_DIV16);
    if div16 > MAX_DIV16 {
        return Err(Error::TooSmall);
    }

    let wrap = clock16 / (div16 * freq);
    if wrap < 2 {
        return Err(Error::TooBig);
    }
    let top = (wrap - 1).min(MAX_TOP);
    let level = (top + 1) * u64::from(duty_cycle) / u64::from(MAX_DUTY_CYCLE);

    Ok(PwmTiming {
        div_int: (div16 >> 4) as u8,
        div_frac: (div16 & 0xF) as u8,
        top: top as u16,
        level: level as u16,
        actual: (clock16 / (div16 * (top + 1))) as u32,
    })
}

/// PWM output on one slice channel
///
/// Slice-wide settings (divider, wrap, enable) are read back from the slice
/// registers rather than cached, so both outputs of a slice always agree on
/// them. Only the pin and the requested duty cycle are held per output.
pub struct Pwm<S: Sdk> {
    sdk: S,
    channel: PwmChannel,
    pin: Pin,
    duty_cycle: u8,
    initialised: bool,
    diagnostics: &'static dyn Diagnostics,
}

impl<S: Sdk> Pwm<S> {
    pub(crate) fn new(sdk: S, channel: PwmChannel, diagnostics: &'static dyn Diagnostics) -> Self {
        Self {
            sdk,
            channel,
            pin: channel.first_pin(),
            duty_cycle: 0,
            initialised: false,
            diagnostics,
        }
    }

    #[cfg(test)]
    pub(crate) fn detached(sdk: S, channel: PwmChannel) -> Self {
        Self::new(sdk, channel, &pinion_hal::diagnostics::NO_DIAGNOSTICS)
    }

    pub fn channel(&self) -> PwmChannel {
        self.channel
    }

    /// GPIO the output is routed to
    pub fn pin(&self) -> Pin {
        self.pin
    }

    fn slice(&self) -> u8 {
        self.channel.slice()
    }

    fn top(&self) -> u16 {
        self.sdk.pwm_get_wrap(self.slice())
    }

    fn report<T>(&self, error: Error) -> Result<T> {
        self.diagnostics.record(Source::Pwm(self.pin), error);
        Err(error)
    }

    fn ensure_initialised(&self) -> Result<()> {
        if self.initialised {
            Ok(())
        } else {
            self.report(Error::Generic)
        }
    }

    fn check_pin(&self, pin: Pin) -> Result<()> {
        if pins::pwm_route(pin)? == self.channel {
            Ok(())
        } else {
            Err(Error::NotAvailableOnPlatform)
        }
    }

    /// Retune the slice and move the other output's level onto the new wrap
    /// so it keeps its duty cycle
    fn apply(&mut self, timing: &PwmTiming) {
        let slice = self.slice();
        let sibling = self.channel.sdk_channel() ^ 1;
        let old_top = self.top();
        let sibling_level = self.sdk.pwm_get_chan_level(slice, sibling);

        self.sdk
            .pwm_configure(slice, timing.div_int, timing.div_frac, timing.top);
        self.sdk
            .pwm_set_chan_level(slice, self.channel.sdk_channel(), timing.level);
        if sibling_level != 0 && old_top != timing.top {
            let duty = duty_of(sibling_level, old_top);
            self.sdk
                .pwm_set_chan_level(slice, sibling, level_for(timing.top, duty));
        }
    }
}

fn level_for(top: u16, duty_cycle: u8) -> u16 {
    let level = (u32::from(top) + 1) * u32::from(duty_cycle) / u32::from(MAX_DUTY_CYCLE);
    // At most top + 1, which still fits when top is capped at 0xFFFE
    level as u16
}

/// Duty cycle a compare level gives on a wrap of `top`, rounded to the
/// nearest percent
fn duty_of(level: u16, top: u16) -> u8 {
    let period = u32::from(top) + 1;
    let percent = (u32::from(level) * u32::from(MAX_DUTY_CYCLE) + period / 2) / period;
    percent.min(u32::from(MAX_DUTY_CYCLE)) as u8
}

impl<S: Sdk> PwmInterface for Pwm<S> {
    fn init(&mut self, pin: Pin, frequency: u32, duty_cycle: u8, start: bool) -> Result<()> {
        let prepared = self
            .check_pin(pin)
            .and_then(|()| timing(self.sdk.clock_sys_hz(), frequency, duty_cycle));
        let timing = match prepared {
            Ok(timing) => timing,
            Err(e) => {
                warn!("PWM{}: init rejected", self.slice());
                self.deinit()?;
                return self.report(e);
            }
        };

        if self.initialised && self.pin != pin {
            self.sdk
                .gpio_set_function(self.pin.number(), funcsel::NULL);
        }
        self.pin = pin;
        self.duty_cycle = duty_cycle;
        self.apply(&timing);
        self.sdk.gpio_set_function(pin.number(), funcsel::PWM);
        self.sdk.pwm_set_enabled(self.slice(), start);

        self.initialised = true;
        debug!("PWM{}: {} Hz at {}%", self.slice(), timing.actual, duty_cycle);
        Ok(())
    }

    fn deinit(&mut self) -> Result<()> {
        if !self.initialised {
            return Ok(());
        }
        self.sdk
            .pwm_set_chan_level(self.slice(), self.channel.sdk_channel(), 0);
        self.sdk.pwm_set_enabled(self.slice(), false);
        self.sdk
            .gpio_set_function(self.pin.number(), funcsel::NULL);
        self.initialised = false;
        debug!("PWM{}: released", self.slice());
        Ok(())
    }

    fn is_initialised(&self) -> bool {
        self.initialised
    }

    fn set_frequency(&mut self, frequency: u32) -> Result<u32> {
        self.ensure_initialised()?;
        let timing = match timing(self.sdk.clock_sys_hz(), frequency, self.duty_cycle) {
            Ok(timing) => timing,
            Err(e) => return self.report(e),
        };
        self.apply(&timing);
        Ok(timing.actual)
    }

    fn frequency(&self) -> u32 {
        if !self.initialised {
            return 0;
        }
        let (div_int, div_frac) = self.sdk.pwm_get_clkdiv(self.slice());
        let div16 = u64::from(div_int) * 16 + u64::from(div_frac);
        if div16 == 0 {
            return 0;
        }
        let clock16 = u64::from(self.sdk.clock_sys_hz()) * 16;
        (clock16 / (div16 * (u64::from(self.top()) + 1))) as u32
    }

    fn set_duty_cycle(&mut self, duty_cycle: u8) -> Result<()> {
        self.ensure_initialised()?;
        if duty_cycle > MAX_DUTY_CYCLE {
            return self.report(Error::TooBig);
        }
        let level = level_for(self.top(), duty_cycle);
        self.sdk
            .pwm_set_chan_level(self.slice(), self.channel.sdk_channel(), level);
        self.duty_cycle = duty_cycle;
        Ok(())
    }

    fn duty_cycle(&self) -> u8 {
        self.duty_cycle
    }

    fn enable(&mut self) -> Result<()> {
        self.ensure_initialised()?;
        self.sdk.pwm_set_enabled(self.slice(), true);
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        self.ensure_initialised()?;
        self.sdk.pwm_set_enabled(self.slice(), false);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.initialised && self.sdk.pwm_is_enabled(self.slice())
    }

    fn read(&self) -> Result<u32> {
        self.ensure_initialised()?;
        Ok(u32::from(self.sdk.pwm_get_counter(self.slice())))
    }

    fn write(&mut self, value: u32) -> Result<()> {
        self.ensure_initialised()?;
        if value > u32::from(self.top()) {
            return self.report(Error::TooBig);
        }
        self.sdk.pwm_set_counter(self.slice(), value as u16);
        Ok(())
    }
}

impl<S: Sdk> ErrorType for Pwm<S> {
    type Error = Error;
}

impl<S: Sdk> embedded_hal::pwm::SetDutyCycle for Pwm<S> {
    fn max_duty_cycle(&self) -> u16 {
        u16::from(MAX_DUTY_CYCLE)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<()> {
        let duty = u8::try_from(duty).unwrap_or(u8::MAX);
        PwmInterface::set_duty_cycle(self, duty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockSdk};
    use pinion_hal::PwmConfig;

    const CLK: u32 = 125_000_000;

    fn led(sdk: &MockSdk) -> Pwm<&MockSdk> {
        let channel = pins::pwm_route(pins::GPIO25).unwrap();
        let mut pwm = Pwm::detached(sdk, channel);
        pwm.init(pins::GPIO25, 1_000, 50, true).unwrap();
        pwm
    }

    #[test]
    fn test_timing_1khz() {
        let t = timing(CLK, 1_000, 50).unwrap();
        assert_eq!((t.div_int, t.div_frac), (1, 15));
        assert_eq!(t.top, 64_515);
        assert_eq!(t.level, 32_258);
        assert_eq!(t.actual, 1_000);
    }

    #[test]
    fn test_timing_limits() {
        assert_eq!(timing(CLK, 0, 50), Err(Error::TooSmall));
        assert_eq!(timing(CLK, 1, 50), Err(Error::TooSmall));
        assert_eq!(timing(CLK, 100_000_000, 50), Err(Error::TooBig));
        assert_eq!(timing(CLK, 1_000, 101), Err(Error::TooBig));

        let fast = timing(CLK, 62_500_000, 100).unwrap();
        assert_eq!((fast.div_int, fast.div_frac, fast.top), (1, 0, 1));
        assert_eq!(fast.level, 2);
    }

    #[test]
    fn test_channel_ids() {
        let channel = PwmChannel::new(4, PwmOutput::B);
        assert_eq!(channel.sdk_channel(), 1);
        assert_eq!(InstanceId::index(channel), 9);
        assert_eq!(PwmChannel::from_index(9), channel);
        assert_eq!(channel.first_pin(), pins::GPIO9);
        assert_eq!(PwmChannel::new(9, PwmOutput::A).slice(), 1);
    }

    #[test]
    fn test_init_configures_slice() {
        let sdk = MockSdk::new();
        let pwm = led(&sdk);

        assert!(pwm.is_initialised());
        assert!(pwm.is_enabled());
        assert_eq!(pwm.frequency(), 1_000);
        assert_eq!(pwm.duty_cycle(), 50);
        assert_eq!(pwm.pulse_width(), 500_000);
        assert_eq!(sdk.funcsel(25), funcsel::PWM);
        assert!(sdk.pwm_enabled(4));
        assert_eq!(sdk.pwm_level(4, 1), 32_258);
        assert!(sdk.calls().contains(&Call::PwmConfigure {
            slice: 4,
            div_int: 1,
            div_frac: 15,
            top: 64_515
        }));
    }

    #[test]
    fn test_init_rejects_foreign_pin() {
        let sdk = MockSdk::new();
        let mut pwm = Pwm::detached(&sdk, PwmChannel::new(4, PwmOutput::B));

        // GPIO8 is slice 4 output A
        assert_eq!(pwm.init(pins::GPIO8, 1_000, 50, true), Err(Error::NotAvailableOnPlatform));
        assert_eq!(pwm.init(Pin::new(30), 1_000, 50, true), Err(Error::NotAvailableOnPlatform));
        // GPIO9 and GPIO25 share the output
        assert!(pwm.init(pins::GPIO9, 1_000, 50, false).is_ok());
        assert!(!pwm.is_enabled());
    }

    #[test]
    fn test_duty_cycle() {
        let sdk = MockSdk::new();
        let mut pwm = led(&sdk);

        pwm.set_duty_cycle(100).unwrap();
        assert_eq!(sdk.pwm_level(4, 1), 64_516);
        pwm.set_duty_cycle(0).unwrap();
        assert_eq!(sdk.pwm_level(4, 1), 0);

        assert_eq!(pwm.set_duty_cycle(101), Err(Error::TooBig));
        assert_eq!(pwm.duty_cycle(), 0);
    }

    #[test]
    fn test_set_frequency_keeps_duty() {
        let sdk = MockSdk::new();
        let mut pwm = led(&sdk);

        assert_eq!(pwm.set_frequency(62_500_000), Ok(62_500_000));
        assert_eq!(sdk.pwm_level(4, 1), 1);
        assert_eq!(pwm.set_frequency(0), Err(Error::TooSmall));
        assert_eq!(pwm.frequency(), 62_500_000);
    }

    #[test]
    fn test_outputs_share_slice_timing() {
        let sdk = MockSdk::new();
        let mut a = Pwm::detached(&sdk, PwmChannel::new(4, PwmOutput::A));
        let mut b = Pwm::detached(&sdk, PwmChannel::new(4, PwmOutput::B));
        a.init(pins::GPIO8, 1_000, 50, true).unwrap();
        b.init(pins::GPIO9, 1_000, 50, true).unwrap();
        assert_eq!(sdk.pwm_level(4, 0), 32_258);

        assert_eq!(a.set_frequency(100_000), Ok(100_000));
        // B keeps 50% on the new wrap of 1249
        assert_eq!(sdk.pwm_level(4, 1), 625);
        assert_eq!(b.frequency(), 100_000);
        assert_eq!(b.pulse_width(), 5_000);

        b.set_duty_cycle(20).unwrap();
        assert_eq!(sdk.pwm_level(4, 1), 250);
        assert_eq!(sdk.pwm_level(4, 0), 625);

        a.disable().unwrap();
        assert!(!b.is_enabled());
    }

    #[test]
    fn test_duty_of_level() {
        assert_eq!(duty_of(32_258, 64_515), 50);
        assert_eq!(duty_of(64_516, 64_515), 100);
        assert_eq!(duty_of(1, 1), 50);
        assert_eq!(level_for(1_249, 50), 625);
    }

    #[test]
    fn test_counter_access() {
        let sdk = MockSdk::new();
        let mut pwm = led(&sdk);

        pwm.write(1_234).unwrap();
        assert_eq!(pwm.read(), Ok(1_234));
        assert_eq!(pwm.write(70_000), Err(Error::TooBig));
    }

    #[test]
    fn test_enable_disable_and_release() {
        let sdk = MockSdk::new();
        let mut pwm = led(&sdk);

        pwm.disable().unwrap();
        assert!(!sdk.pwm_enabled(4));
        pwm.enable().unwrap();
        assert!(sdk.pwm_enabled(4));

        pwm.deinit().unwrap();
        assert!(!pwm.is_initialised());
        assert!(!sdk.pwm_enabled(4));
        assert_eq!(sdk.pwm_level(4, 1), 0);
        assert_eq!(sdk.funcsel(25), funcsel::NULL);
        assert_eq!(pwm.enable(), Err(Error::Generic));
    }

    #[test]
    fn test_init_with_and_set_duty_cycle_trait() {
        use embedded_hal::pwm::SetDutyCycle;

        let sdk = MockSdk::new();
        let mut pwm = Pwm::detached(&sdk, PwmChannel::new(0, PwmOutput::A));

        pwm.init_with(&PwmConfig::default()).unwrap();
        assert!(!pwm.is_enabled());

        SetDutyCycle::set_duty_cycle_percent(&mut pwm, 25).unwrap();
        assert_eq!(pwm.duty_cycle(), 25);
        assert_eq!(SetDutyCycle::set_duty_cycle(&mut pwm, 300), Err(Error::TooBig));
    }
}
