//! Strongly typed values reported by the ADNS-5020.
//!
//! # Examples
//!
//! ```rust
//! use adns5020::params::{Resolution, PIXEL_COUNT};
//!
//! assert_eq!(Resolution::from_mouse_control(0).cpi(), 500);
//! let frame = [0u8; PIXEL_COUNT];
//! let _ = frame;
//! ```

/// Width and height of the square pixel array.
pub const FRAME_WIDTH: usize = 15;
/// Number of pixels streamed by a frame capture.
pub const PIXEL_COUNT: usize = FRAME_WIDTH * FRAME_WIDTH;

/// Caller-owned buffer filled by a pixel frame capture, row-major.
pub type PixelFrame = [u8; PIXEL_COUNT];

/// Motion resolution reported by `Mouse_Control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// 500 counts per inch.
    Cpi500,
    /// 1000 counts per inch.
    Cpi1000,
}

impl Resolution {
    /// Decodes the raw `Mouse_Control` value; any nonzero value selects 1000 CPI.
    pub const fn from_mouse_control(raw: u8) -> Self {
        if raw == 0 { Self::Cpi500 } else { Self::Cpi1000 }
    }

    /// Returns the resolution in counts per inch.
    pub const fn cpi(self) -> u16 {
        match self {
            Self::Cpi500 => 500,
            Self::Cpi1000 => 1_000,
        }
    }
}

/// Motion registers sampled back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionReport {
    /// Motion occurred since the previous `Motion` read.
    pub moved: bool,
    /// X displacement in counts.
    pub delta_x: i8,
    /// Y displacement in counts.
    pub delta_y: i8,
    /// Surface quality at the time of the sample.
    pub squal: u8,
}
