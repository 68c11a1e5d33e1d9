//! Optional diagnostics channel
//!
//! Every driver failure is returned to the caller as an `Err`. In addition,
//! drivers report each failure to a [`Diagnostics`] sink, which firmware
//! can use to keep a trail of bus faults. Nothing depends on a sink being
//! present.

use core::cell::Cell;

use critical_section::Mutex;

use crate::common::Pin;
use crate::error::Error;

/// Which driver reported a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    Gpio(Pin),
    I2c(u8),
    Uart(u8),
    Spi(u8),
    Pwm(Pin),
}

/// Sink for driver failures
pub trait Diagnostics {
    fn record(&self, source: Source, error: Error);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {
    fn record(&self, _source: Source, _error: Error) {}
}

/// Shared discarding sink, the default for every driver
pub static NO_DIAGNOSTICS: NoDiagnostics = NoDiagnostics;

/// Sink keeping only the most recent failure
///
/// ```
/// use pinion_hal::diagnostics::{Diagnostics, LastError, Source};
/// use pinion_hal::Error;
///
/// static LAST: LastError = LastError::new();
///
/// LAST.record(Source::I2c(0), Error::Timeout);
/// assert_eq!(LAST.take(), Some((Source::I2c(0), Error::Timeout)));
/// assert_eq!(LAST.last(), None);
/// ```
pub struct LastError {
    slot: Mutex<Cell<Option<(Source, Error)>>>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Most recent failure, left in place
    pub fn last(&self) -> Option<(Source, Error)> {
        critical_section::with(|cs| self.slot.borrow(cs).get())
    }

    /// Most recent failure, clearing the slot
    pub fn take(&self) -> Option<(Source, Error)> {
        critical_section::with(|cs| self.slot.borrow(cs).take())
    }
}

impl Default for LastError {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics for LastError {
    fn record(&self, source: Source, error: Error) {
        critical_section::with(|cs| self.slot.borrow(cs).set(Some((source, error))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_error_keeps_latest() {
        let sink = LastError::new();
        assert_eq!(sink.last(), None);

        sink.record(Source::Uart(1), Error::Read);
        sink.record(Source::Spi(0), Error::TooSmall);
        assert_eq!(sink.last(), Some((Source::Spi(0), Error::TooSmall)));
        assert_eq!(sink.take(), Some((Source::Spi(0), Error::TooSmall)));
        assert_eq!(sink.take(), None);
    }

    #[test]
    fn test_no_diagnostics_is_silent() {
        let sink: &dyn Diagnostics = &NO_DIAGNOSTICS;
        sink.record(Source::Pwm(Pin::new(3)), Error::Generic);
    }
}
