//! Configuration primitives for the ADNS-5020 driver.

use crate::registers::WRITE_FLAG;

/// Default wait after configuring the SPI peripheral (milliseconds).
pub const DEFAULT_STARTUP_DELAY_MS: u32 = 1_000;
/// Default time the reset line is held on each edge of a reset pulse (milliseconds).
pub const DEFAULT_RESET_HOLD_MS: u32 = 750;

/// Register/value pair used to confirm the sensor is on the bus.
///
/// The driver ships no default: take both values from the datasheet of the part in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PresenceCheck {
    /// Register address to read.
    pub register: u8,
    /// Value the sensor must return.
    pub expected: u8,
}

impl PresenceCheck {
    /// Creates a presence check.
    pub const fn new(register: u8, expected: u8) -> Self {
        Self { register, expected }
    }
}

/// User-facing configuration for the ADNS-5020 sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Wait after the bus is configured, before the reset pulse.
    pub startup_delay_ms: u32,
    /// Duration of each half of the reset pulse.
    pub reset_hold_ms: u32,
    /// Optional identity check backing `is_attached`.
    pub presence: Option<PresenceCheck>,
}

impl Config {
    /// Begins building a [`Config`] using the builder pattern.
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Checks whether this configuration can be applied.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if let Some(check) = self.presence {
            if check.register & WRITE_FLAG != 0 {
                return Err(ConfigError::InvalidPresenceRegister);
            }
        }

        Ok(())
    }
}

/// Builder for [`Config`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder seeded with [`Config::default()`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Overrides the peripheral startup wait.
    pub fn startup_delay_ms(mut self, ms: u32) -> Self {
        self.config.startup_delay_ms = ms;
        self
    }

    /// Overrides the reset hold time.
    pub fn reset_hold_ms(mut self, ms: u32) -> Self {
        self.config.reset_hold_ms = ms;
        self
    }

    /// Enables the presence check.
    pub fn presence_check(mut self, check: PresenceCheck) -> Self {
        self.config.presence = Some(check);
        self
    }

    /// Finalizes the builder and returns the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            startup_delay_ms: DEFAULT_STARTUP_DELAY_MS,
            reset_hold_ms: DEFAULT_RESET_HOLD_MS,
            presence: None,
        }
    }
}

/// Validation errors generated while verifying a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The presence register address has the write flag set.
    InvalidPresenceRegister,
}
