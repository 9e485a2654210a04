//! DHT22 temperature / humidity through the kernel IIO driver.
//!
//! The `dht11` IIO driver exposes both channels as milli-unit integers in
//! sysfs (`in_temp_input` in m°C, `in_humidityrelative_input` in m%RH).
//! Reads occasionally fail with `EIO` when the sensor misses its timing
//! window; callers treat that as a skipped sample.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{SensorError, errno_of};

pub const TEMPERATURE_FILE: &str = "in_temp_input";
pub const HUMIDITY_FILE: &str = "in_humidityrelative_input";

pub struct DhtSensor {
    dir: PathBuf,
}

impl DhtSensor {
    /// `dir` is the IIO device directory, e.g. `/sys/bus/iio/devices/iio:device0`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Temperature in °C.
    pub fn temperature(&self) -> Result<f64, SensorError> {
        let t = read_milli(&self.dir.join(TEMPERATURE_FILE))?;
        debug!("dht temp: {t:.1}");
        Ok(t)
    }

    /// Relative humidity in %.
    pub fn humidity(&self) -> Result<f64, SensorError> {
        let h = read_milli(&self.dir.join(HUMIDITY_FILE))?;
        debug!("dht hum: {h:.1}");
        Ok(h)
    }
}

fn read_milli(path: &Path) -> Result<f64, SensorError> {
    let text = fs::read_to_string(path).map_err(|e| SensorError::Read(errno_of(&e)))?;
    parse_milli(&text)
}

/// Parse a sysfs milli-unit integer into base units.
pub fn parse_milli(text: &str) -> Result<f64, SensorError> {
    let milli: i64 = text.trim().parse().map_err(|_| SensorError::Parse)?;
    Ok(milli as f64 / 1000.0)
}
