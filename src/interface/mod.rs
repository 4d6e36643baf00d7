//! Bus interface abstraction for the ADNS-5020 driver.
//!
//! The sensor multiplexes MOSI and MISO onto a single SDIO pin. Both SPI data pins are
//! wired to SDIO, and the host must release (tri-state) its MOSI driver while the sensor
//! answers a read, or the two outputs fight each other.

pub mod spi;

use embedded_hal::digital;
use embedded_hal::spi::{ErrorKind, Mode};

/// Abstraction over the low-level bus access required by the driver.
pub trait Adns5020Interface {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Deselects the sensor, drives SDIO and configures the bus clock mode.
    fn init_bus(&mut self) -> core::result::Result<(), Self::Error>;

    /// Writes a single register.
    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error>;

    /// Reads a single register.
    fn read_register(&mut self, register: u8) -> core::result::Result<u8, Self::Error>;
}

/// Direction control for the host side of the shared SDIO line.
///
/// Implementations usually flip the MOSI pad between its SPI function and a floating
/// input. `set_output` must leave MOSI under control of the SPI peripheral again.
pub trait SdioDirection {
    /// Error type returned by the pad controller.
    type Error: digital::Error;

    /// Releases SDIO so the sensor can drive it.
    fn set_input(&mut self) -> core::result::Result<(), Self::Error>;

    /// Returns SDIO to the host.
    fn set_output(&mut self) -> core::result::Result<(), Self::Error>;
}

/// Clock polarity/phase configuration of the byte-transfer peripheral.
pub trait ClockMode {
    /// Switches the peripheral to `mode`.
    fn set_clock_mode(&mut self, mode: Mode) -> core::result::Result<(), UnsupportedMode>;
}

/// The peripheral cannot run in the requested clock mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnsupportedMode;

/// Errors raised by the half-duplex SPI interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The SPI peripheral reported an error.
    Spi(ErrorKind),
    /// Chip-select or SDIO direction control failed.
    Pin(digital::ErrorKind),
    /// The peripheral refused the sensor's clock mode.
    UnsupportedMode,
}

impl From<UnsupportedMode> for BusError {
    fn from(_: UnsupportedMode) -> Self {
        Self::UnsupportedMode
    }
}
