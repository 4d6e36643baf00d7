//! Error handling primitives for the ADNS-5020 driver.

use embedded_hal::digital;

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    Interface(E),
    /// Driving the reset line failed.
    ResetPin(digital::ErrorKind),
    /// The provided configuration parameters are invalid.
    InvalidConfig,
    /// The session has not completed its reset sequence.
    NotReady,
    /// The sensor did not answer the presence check with the expected value.
    NoResponse,
    /// No presence-check register was configured.
    PresenceCheckUnavailable,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}
