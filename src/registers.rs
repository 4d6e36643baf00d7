//! Register map definitions for the ADNS-5020 optical sensor.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

/// Bit set in the address byte of a write transaction.
pub const WRITE_FLAG: u8 = 0x80;
/// Mask applied to the address byte of a read transaction.
pub const ADDRESS_MASK: u8 = 0x7F;
/// Byte clocked out while the sensor drives SDIO.
pub const READ_FILLER: u8 = 0x00;
/// Value written to `PIXEL_GRAB` to rewind the pixel cursor.
pub const PIXEL_GRAB_RESET: u8 = 0x00;

/// Registers exposed by the driver.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// `Motion`; reading it clears the motion latch.
    Motion = 0x02,
    /// `Delta_X`, counts since the last read.
    DeltaX = 0x03,
    /// `Delta_Y`, counts since the last read.
    DeltaY = 0x04,
    /// `SQUAL` surface quality.
    Squal = 0x05,
    /// `Pixel_Grab` streaming register.
    PixelGrab = 0x0B,
    /// `Mouse_Control` resolution selection.
    MouseControl = 0x0D,
}

impl Register {
    /// Every register known to the driver, in address order.
    pub const ALL: [Register; 6] = [
        Register::Motion,
        Register::DeltaX,
        Register::DeltaY,
        Register::Squal,
        Register::PixelGrab,
        Register::MouseControl,
    ];

    /// Returns the raw register address.
    #[inline]
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// Bitfield representation of the `Motion` register (address `0x02`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    #[skip]
    __: B7,
    // Motion occurred since the last read (bit 7).
    pub motion: bool,
}

impl From<u8> for Motion {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<Motion> for u8 {
    fn from(value: Motion) -> Self {
        value.into_bytes()[0]
    }
}
