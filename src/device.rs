//! High-level ADNS-5020 device driver implementation.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::interface::spi::SpiInterface;
use crate::interface::{Adns5020Interface, ClockMode, SdioDirection};
use crate::params::{MotionReport, PixelFrame, Resolution};
use crate::registers::{Motion, Register, PIXEL_GRAB_RESET};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, OutputPin};
use embedded_hal::spi::SpiBus;

/// Lifecycle of a sensor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// Constructed; the reset line has not been touched yet.
    Uninitialized,
    /// The reset line is low, or a reset sequence did not complete.
    InReset,
    /// Reset pulse and stabilization delay completed; registers may be accessed.
    Ready,
}

/// High-level synchronous driver for the ADNS-5020 optical sensor.
pub struct Adns5020<IFACE, RST> {
    interface: IFACE,
    reset: RST,
    config: Config,
    state: SessionState,
    bus_configured: bool,
}

impl<IFACE, RST> Adns5020<IFACE, RST> {
    // ==================================================================
    // == Driver Construction & Ownership ===============================
    // ==================================================================
    /// Creates a new driver instance. No pin or bus activity happens until [`Self::init`].
    pub fn new(interface: IFACE, reset: RST, config: Config) -> Self {
        Self {
            interface,
            reset,
            config,
            state: SessionState::Uninitialized,
            bus_configured: false,
        }
    }

    /// Consumes the driver and returns the owned interface, reset pin and configuration.
    pub fn release(self) -> (IFACE, RST, Config) {
        (self.interface, self.reset, self.config)
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.interface
    }

    /// Returns a shared reference to the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the configuration. Timing changes apply to the next
    /// [`Self::init`] or [`Self::reset`].
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` once the session may access registers.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }
}

impl<SPI, CS, SDIO, RST> Adns5020<SpiInterface<SPI, CS, SDIO>, RST>
where
    SPI: SpiBus<u8> + ClockMode,
    CS: OutputPin,
    SDIO: SdioDirection,
{
    // ==================================================================
    // == SPI Convenience Constructors ==================================
    // ==================================================================
    /// Convenience constructor for the half-duplex SPI transport.
    pub fn new_spi(spi: SPI, cs: CS, sdio: SDIO, reset: RST, config: Config) -> Self {
        Self::new(SpiInterface::new(spi, cs, sdio), reset, config)
    }

    /// Releases the driver, returning the bus, chip-select, SDIO control, reset pin and
    /// configuration.
    pub fn release_spi(self) -> (SPI, CS, SDIO, RST, Config) {
        let (iface, reset, config) = self.release();
        let (spi, cs, sdio) = iface.release();
        (spi, cs, sdio, reset, config)
    }
}

impl<IFACE, RST, CommE> Adns5020<IFACE, RST>
where
    IFACE: Adns5020Interface<Error = CommE>,
    RST: OutputPin,
{
    // ==================================================================
    // == Session Lifecycle =============================================
    // ==================================================================
    /// Brings the sensor from power-up to [`SessionState::Ready`].
    ///
    /// Holds the sensor in reset while the bus is configured, waits
    /// `startup_delay_ms`, then runs the same reset pulse as [`Self::reset`]. With the
    /// default configuration this blocks for 2.5 seconds.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), CommE> {
        self.config.validate().map_err(|_| Error::InvalidConfig)?;

        self.enter_reset()?;
        self.interface.init_bus().map_err(Error::from)?;
        self.bus_configured = true;
        delay.delay_ms(self.config.startup_delay_ms);
        self.release_reset(delay)
    }

    /// Pulses the reset line and waits for the sensor to settle.
    ///
    /// Blocks for twice `reset_hold_ms`. On error the session stays in
    /// [`SessionState::InReset`]. Returns [`Error::NotReady`] without touching the reset
    /// line until [`Self::init`] has configured the bus.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), CommE> {
        if !self.bus_configured {
            warn!("reset rejected, bus not configured");
            return Err(Error::NotReady);
        }

        self.enter_reset()?;
        self.release_reset(delay)
    }

    fn enter_reset(&mut self) -> Result<(), CommE> {
        self.state = SessionState::InReset;
        self.reset
            .set_low()
            .map_err(|err| Error::ResetPin(err.kind()))?;
        debug!("sensor held in reset");
        Ok(())
    }

    fn release_reset(&mut self, delay: &mut impl DelayNs) -> Result<(), CommE> {
        delay.delay_ms(self.config.reset_hold_ms);
        self.reset
            .set_high()
            .map_err(|err| Error::ResetPin(err.kind()))?;
        delay.delay_ms(self.config.reset_hold_ms);

        self.state = SessionState::Ready;
        debug!("sensor ready");
        Ok(())
    }

    // ==================================================================
    // == Identification ================================================
    // ==================================================================
    /// Compares the configured presence register against its expected value.
    ///
    /// Returns [`Error::PresenceCheckUnavailable`] when the configuration carries no
    /// [`PresenceCheck`](crate::config::PresenceCheck).
    pub fn is_attached(&mut self) -> Result<bool, CommE> {
        let check = self.config.presence.ok_or(Error::PresenceCheckUnavailable)?;
        self.config.validate().map_err(|_| Error::InvalidConfig)?;
        self.ensure_ready()?;

        let value = self
            .interface
            .read_register(check.register)
            .map_err(Error::from)?;
        Ok(value == check.expected)
    }

    /// Like [`Self::is_attached`], but reports a mismatch as [`Error::NoResponse`].
    pub fn verify_attached(&mut self) -> Result<(), CommE> {
        if self.is_attached()? {
            Ok(())
        } else {
            warn!("presence check failed");
            Err(Error::NoResponse)
        }
    }

    // ==================================================================
    // == Motion & Surface ==============================================
    // ==================================================================
    /// Returns `true` if motion occurred since the last call. Reading clears the latch.
    pub fn motion_detected(&mut self) -> Result<bool, CommE> {
        let raw = self.read(Register::Motion)?;
        Ok(Motion::from(raw).motion())
    }

    /// X displacement in counts since the last read of this axis.
    pub fn delta_x(&mut self) -> Result<i8, CommE> {
        Ok(self.read(Register::DeltaX)? as i8)
    }

    /// Y displacement in counts since the last read of this axis.
    pub fn delta_y(&mut self) -> Result<i8, CommE> {
        Ok(self.read(Register::DeltaY)? as i8)
    }

    /// Surface quality, 0 (no surface) to 144.
    pub fn surface_quality(&mut self) -> Result<u8, CommE> {
        self.read(Register::Squal)
    }

    /// Reads the configured resolution.
    pub fn resolution(&mut self) -> Result<Resolution, CommE> {
        let raw = self.read(Register::MouseControl)?;
        Ok(Resolution::from_mouse_control(raw))
    }

    /// Samples motion, both deltas and surface quality in one call.
    pub fn read_motion(&mut self) -> Result<MotionReport, CommE> {
        let moved = self.motion_detected()?;
        let delta_x = self.delta_x()?;
        let delta_y = self.delta_y()?;
        let squal = self.surface_quality()?;

        Ok(MotionReport {
            moved,
            delta_x,
            delta_y,
            squal,
        })
    }

    // ==================================================================
    // == Pixel Capture =================================================
    // ==================================================================
    /// Streams the 15x15 pixel array into `frame`.
    ///
    /// Rewinds the sensor's pixel cursor, then reads `Pixel_Grab` once per pixel. A bus
    /// error aborts the capture and leaves the remaining entries untouched.
    pub fn capture_pixel_frame(&mut self, frame: &mut PixelFrame) -> Result<(), CommE> {
        self.ensure_ready()?;
        self.interface
            .write_register(Register::PixelGrab.addr(), PIXEL_GRAB_RESET)
            .map_err(Error::from)?;

        for pixel in frame.iter_mut() {
            *pixel = self
                .interface
                .read_register(Register::PixelGrab.addr())
                .map_err(Error::from)?;
        }

        trace!("pixel frame captured");
        Ok(())
    }

    // ==================================================================
    // == Internal Helpers ==============================================
    // ==================================================================
    fn ensure_ready(&self) -> Result<(), CommE> {
        if self.state == SessionState::Ready {
            Ok(())
        } else {
            warn!("register access rejected, session not ready");
            Err(Error::NotReady)
        }
    }

    fn read(&mut self, register: Register) -> Result<u8, CommE> {
        self.ensure_ready()?;
        self.interface
            .read_register(register.addr())
            .map_err(Error::from)
    }
}
