//! System configuration parameters
//!
//! All tunable parameters for gardenctl.  Loaded from a JSON file; every
//! field has a default, so a partial file only overrides what it names.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::drivers::gpio::DEFAULT_SYSFS_ROOT;
use crate::gpioex::bank::BUS;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Hardware ---
    /// I2C bus index of the expander bank
    pub i2c_bus: u8,
    /// sysfs GPIO root
    pub gpio_root: PathBuf,
    /// GPIO line of the tap push-button
    pub tap_button_gpio: u32,
    /// IIO device directory of the DHT sensor
    pub iio_device: PathBuf,

    // --- Timing ---
    /// Weather station poll interval (seconds)
    pub weather_interval_secs: u64,
    /// Barrel level poll interval (seconds)
    pub barrel_interval_secs: u64,
    /// Unchanged sensor readings are republished every N polls
    pub publish_every: u32,
    /// Tap button edge wait before re-checking the stop signal (ms)
    pub tap_poll_timeout_ms: u64,

    // --- Logging ---
    /// Maximum log level (error, warn, info, debug, trace)
    pub log_level: String,

    pub modules: ModulesConfig,
}

/// Which built-in feature modules to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    pub watering: bool,
    pub light: bool,
    pub weather_station: bool,
    pub barrel: bool,
    pub tap_button: bool,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            watering: true,
            light: true,
            weather_station: true,
            barrel: true,
            tap_button: true,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Hardware
            i2c_bus: BUS,
            gpio_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            tap_button_gpio: 17,
            iio_device: PathBuf::from("/sys/bus/iio/devices/iio:device0"),

            // Timing
            weather_interval_secs: 30,
            barrel_interval_secs: 60,
            publish_every: 10,
            tap_poll_timeout_ms: 1000,

            log_level: "info".into(),

            modules: ModulesConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The file is not valid JSON for this schema.
    Parse(serde_json::Error),
    /// A field failed range validation.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "read failed: {e}"),
            Self::Parse(e) => write!(f, "parse failed: {e}"),
            Self::Invalid(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl SystemConfig {
    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or spin the workers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weather_interval_secs == 0 {
            return Err(ConfigError::Invalid("weather_interval_secs must be > 0"));
        }
        if self.barrel_interval_secs == 0 {
            return Err(ConfigError::Invalid("barrel_interval_secs must be > 0"));
        }
        if self.publish_every == 0 {
            return Err(ConfigError::Invalid("publish_every must be > 0"));
        }
        if self.tap_poll_timeout_ms == 0 {
            return Err(ConfigError::Invalid("tap_poll_timeout_ms must be > 0"));
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid("log_level is not a log level"));
        }
        Ok(())
    }

    pub fn weather_interval(&self) -> Duration {
        Duration::from_secs(self.weather_interval_secs)
    }

    pub fn barrel_interval(&self) -> Duration {
        Duration::from_secs(self.barrel_interval_secs)
    }

    pub fn tap_poll_timeout(&self) -> Duration {
        Duration::from_millis(self.tap_poll_timeout_ms)
    }
}
