//! Half-duplex SPI interface built on top of `embedded-hal` `SpiBus`.

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, ErrorType, Mode, SpiBus, MODE_3};

use super::{Adns5020Interface, BusError, ClockMode, SdioDirection, UnsupportedMode};
use crate::registers::{ADDRESS_MASK, READ_FILLER, WRITE_FLAG};

/// Clock polarity 1, phase 1.
pub const SENSOR_MODE: Mode = MODE_3;

/// SPI-based interface implementation for the ADNS-5020 driver.
///
/// Owns the bus, the chip-select line and the SDIO direction control, so no other code
/// can start a transaction while one is in flight.
pub struct SpiInterface<SPI, CS, SDIO> {
    spi: SPI,
    cs: CS,
    sdio: SDIO,
}

impl<SPI, CS, SDIO> SpiInterface<SPI, CS, SDIO> {
    /// Creates a new interface from the bus, chip-select pin and SDIO direction control.
    pub const fn new(spi: SPI, cs: CS, sdio: SDIO) -> Self {
        Self { spi, cs, sdio }
    }

    /// Builds the address byte used to start a transaction.
    fn command_byte(register: u8, is_read: bool) -> u8 {
        if is_read {
            register & ADDRESS_MASK
        } else {
            register | WRITE_FLAG
        }
    }

    /// Consumes the interface and returns the owned bus and pins.
    pub fn release(self) -> (SPI, CS, SDIO) {
        (self.spi, self.cs, self.sdio)
    }
}

impl<SPI, CS, SDIO> SpiInterface<SPI, CS, SDIO>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    SDIO: SdioDirection,
{
    /// Runs `body` with the sensor selected. Chip-select is released on every exit path.
    fn selected<T, F>(&mut self, body: F) -> core::result::Result<T, BusError>
    where
        F: FnOnce(&mut SPI, &mut SDIO) -> core::result::Result<T, BusError>,
    {
        self.cs.set_low().map_err(pin_error)?;

        let result = body(&mut self.spi, &mut self.sdio);
        let result = match result {
            Ok(value) => self.spi.flush().map(|()| value).map_err(spi_error),
            Err(err) => Err(err),
        };

        let released = self.cs.set_high().map_err(pin_error);
        let value = result?;
        released?;
        Ok(value)
    }
}

impl<SPI, CS, SDIO> Adns5020Interface for SpiInterface<SPI, CS, SDIO>
where
    SPI: SpiBus<u8> + ClockMode,
    CS: OutputPin,
    SDIO: SdioDirection,
{
    type Error = BusError;

    fn init_bus(&mut self) -> core::result::Result<(), Self::Error> {
        self.cs.set_high().map_err(pin_error)?;
        self.sdio.set_output().map_err(pin_error)?;
        self.spi.set_clock_mode(SENSOR_MODE)?;
        Ok(())
    }

    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error> {
        let command = Self::command_byte(register, false);
        trace!("write {=u8:#x} <- {=u8:#x}", register, value);

        self.selected(|spi, _| {
            exchange(spi, command)?;
            exchange(spi, value)?;
            Ok(())
        })
    }

    fn read_register(&mut self, register: u8) -> core::result::Result<u8, Self::Error> {
        let command = Self::command_byte(register, true);

        let value = self.selected(|spi, sdio| {
            exchange(spi, command)?;
            receive(spi, sdio)
        })?;

        trace!("read {=u8:#x} -> {=u8:#x}", register, value);
        Ok(value)
    }
}

/// Clocks one byte out and returns the byte clocked in.
fn exchange<SPI>(spi: &mut SPI, byte: u8) -> core::result::Result<u8, BusError>
where
    SPI: SpiBus<u8>,
{
    let mut word = [byte];
    spi.transfer_in_place(&mut word).map_err(spi_error)?;
    Ok(word[0])
}

/// Receives one byte with SDIO released. SDIO is driven again on every exit path.
fn receive<SPI, SDIO>(spi: &mut SPI, sdio: &mut SDIO) -> core::result::Result<u8, BusError>
where
    SPI: SpiBus<u8>,
    SDIO: SdioDirection,
{
    let result = sdio
        .set_input()
        .map_err(pin_error)
        .and_then(|()| exchange(spi, READ_FILLER));

    let restored = sdio.set_output().map_err(pin_error);
    let value = result?;
    restored?;
    Ok(value)
}

fn pin_error<E: digital::Error>(err: E) -> BusError {
    BusError::Pin(err.kind())
}

fn spi_error<E: spi::Error>(err: E) -> BusError {
    BusError::Spi(err.kind())
}

/// Adapts a bus whose clock mode was fixed when the HAL created it.
///
/// `set_clock_mode` succeeds only for the mode the bus already runs in.
pub struct PresetMode<SPI> {
    spi: SPI,
    mode: Mode,
}

impl<SPI> PresetMode<SPI> {
    /// Wraps `spi`, which the HAL has already configured for `mode`.
    pub const fn new(spi: SPI, mode: Mode) -> Self {
        Self { spi, mode }
    }

    /// Returns the wrapped bus.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: ErrorType> ErrorType for PresetMode<SPI> {
    type Error = SPI::Error;
}

impl<SPI: SpiBus<u8>> SpiBus<u8> for PresetMode<SPI> {
    fn read(&mut self, words: &mut [u8]) -> core::result::Result<(), Self::Error> {
        self.spi.read(words)
    }

    fn write(&mut self, words: &[u8]) -> core::result::Result<(), Self::Error> {
        self.spi.write(words)
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> core::result::Result<(), Self::Error> {
        self.spi.transfer(read, write)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> core::result::Result<(), Self::Error> {
        self.spi.transfer_in_place(words)
    }

    fn flush(&mut self) -> core::result::Result<(), Self::Error> {
        self.spi.flush()
    }
}

impl<SPI> ClockMode for PresetMode<SPI> {
    fn set_clock_mode(&mut self, mode: Mode) -> core::result::Result<(), UnsupportedMode> {
        if mode == self.mode {
            Ok(())
        } else {
            Err(UnsupportedMode)
        }
    }
}
