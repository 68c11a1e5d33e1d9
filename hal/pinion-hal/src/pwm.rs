//! PWM output contract
//!
//! PWM drivers are selected by pin rather than by instance id: the chip
//! crate maps each pin onto the hardware slice and channel that can drive
//! it.

use crate::common::Pin;
use crate::error::Result;

/// Highest accepted duty cycle, in percent
pub const MAX_DUTY_CYCLE: u8 = 100;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Single PWM output channel
pub trait PwmInterface {
    /// Claim `pin` and configure the output at `frequency` Hz and
    /// `duty_cycle` percent; the output starts running only when `start`
    fn init(&mut self, pin: Pin, frequency: u32, duty_cycle: u8, start: bool) -> Result<()>;

    /// Initialise from a [`PwmConfig`]
    fn init_with(&mut self, config: &PwmConfig) -> Result<()> {
        self.init(config.pin, config.frequency, config.duty_cycle, config.start)
    }

    /// Stop the output and release the pin
    fn deinit(&mut self) -> Result<()>;

    fn is_initialised(&self) -> bool;

    /// Change the output frequency; returns the frequency actually achieved
    ///
    /// The duty cycle is preserved.
    fn set_frequency(&mut self, frequency: u32) -> Result<u32>;

    fn frequency(&self) -> u32;

    /// Set the duty cycle in percent (`0..=100`, `TooBig` above)
    fn set_duty_cycle(&mut self, duty_cycle: u8) -> Result<()>;

    fn duty_cycle(&self) -> u8;

    /// High time of one period in nanoseconds
    fn pulse_width(&self) -> u32 {
        pulse_width_ns(self.frequency(), self.duty_cycle())
    }

    fn enable(&mut self) -> Result<()>;

    fn disable(&mut self) -> Result<()>;

    fn is_enabled(&self) -> bool;

    /// Raw value of the slice counter
    fn read(&self) -> Result<u32>;

    /// Overwrite the slice counter
    fn write(&mut self, value: u32) -> Result<()>;
}

/// High time in nanoseconds of a `duty_cycle` percent signal at `frequency` Hz
///
/// Returns 0 for a zero frequency.
pub const fn pulse_width_ns(frequency: u32, duty_cycle: u8) -> u32 {
    if frequency == 0 {
        return 0;
    }
    // At most 2.55e9 for a 255 % duty at 1 Hz, so the cast cannot truncate
    (NANOS_PER_SECOND * duty_cycle as u64 / (100 * frequency as u64)) as u32
}

/// PWM configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmConfig {
    pub pin: Pin,
    /// Output frequency in Hz
    pub frequency: u32,
    /// Duty cycle in percent
    pub duty_cycle: u8,
    /// Start the output as part of `init`
    pub start: bool,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            pin: Pin::new(0),
            frequency: 1_000,
            duty_cycle: 50,
            start: false,
        }
    }
}
