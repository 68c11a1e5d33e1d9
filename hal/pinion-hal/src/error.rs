//! Error taxonomy shared by every peripheral driver

use core::fmt;

/// Failure kinds reported by peripheral drivers
///
/// Success is `Ok(_)`; there is no "no error" variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Unclassified failure, also returned when a bus driver is used before `init`
    Generic,
    /// Requested function or feature is not supported by this chip
    NotAvailableOnPlatform,
    /// Read transaction failed
    Read,
    /// Write transaction failed
    Write,
    /// Value, buffer or rate below what the hardware can handle
    TooSmall,
    /// Value, buffer or rate above what the hardware can handle
    TooBig,
    /// Hardware transaction exceeded its time budget
    Timeout,
    /// Transient failure, retrying may succeed
    Again,
}

/// Result alias used by all driver operations
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Whether retrying the same operation can succeed
    pub const fn is_transient(self) -> bool {
        matches!(self, Error::Again | Error::Timeout)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::Generic => "peripheral error",
            Error::NotAvailableOnPlatform => "not available on this platform",
            Error::Read => "read failed",
            Error::Write => "write failed",
            Error::TooSmall => "value too small",
            Error::TooBig => "value too big",
            Error::Timeout => "timed out",
            Error::Again => "resource temporarily unavailable",
        };
        f.write_str(msg)
    }
}

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
        match self {
            Error::Read | Error::Write => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            _ => ErrorKind::Other,
        }
    }
}

impl embedded_hal::spi::Error for Error {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        match self {
            Error::TooBig => embedded_hal::spi::ErrorKind::Overrun,
            _ => embedded_hal::spi::ErrorKind::Other,
        }
    }
}

impl embedded_hal::pwm::Error for Error {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;
        match self {
            Error::NotAvailableOnPlatform => ErrorKind::Unsupported,
            Error::TooSmall | Error::TooBig => ErrorKind::InvalidInput,
            Error::Timeout => ErrorKind::TimedOut,
            Error::Again => ErrorKind::Interrupted,
            Error::Generic | Error::Read | Error::Write => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_kinds() {
        assert!(Error::Again.is_transient());
        assert!(Error::Timeout.is_transient());
        assert!(!Error::Read.is_transient());
        assert!(!Error::NotAvailableOnPlatform.is_transient());
    }

    #[test]
    fn test_i2c_nack_mapping() {
        use embedded_hal::i2c::{Error as _, ErrorKind, NoAcknowledgeSource};
        assert_eq!(
            Error::Read.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
        );
        assert_eq!(Error::Timeout.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_io_mapping() {
        use embedded_io::{Error as _, ErrorKind};
        assert_eq!(Error::Timeout.kind(), ErrorKind::TimedOut);
        assert_eq!(Error::TooBig.kind(), ErrorKind::InvalidInput);
    }
}
