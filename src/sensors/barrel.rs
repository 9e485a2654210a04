//! Rain barrel level decoding.
//!
//! Eight float switches are stacked up the barrel and wired to the
//! barrel-level expander register, lowest switch on bit 0.  A submerged
//! switch pulls its line low, so a barrel filled to level `n` reads as `n`
//! zero bits packed from the least-significant end.  Anything else (a gap
//! in the zeros) is a stuck or bouncing switch and is reported as a sensor
//! fault rather than guessed at.

use crate::error::SensorError;

/// Number of level switches.
pub const LEVELS: u8 = 8;

/// Percentage represented by one switch.
pub const PERCENT_PER_LEVEL: f64 = 100.0 / LEVELS as f64;

/// Decode the raw register byte into a level `0..=8`.
pub fn barrel_level(raw: u8) -> Result<u8, SensorError> {
    let triggered = raw.count_zeros();
    let monotonic = (0xFFu16 << triggered) as u8;
    if raw == monotonic {
        Ok(triggered as u8)
    } else {
        Err(SensorError::InvalidPattern(raw))
    }
}

/// Decode the raw register byte into a fill percentage `0.0..=100.0`.
pub fn barrel_level_percent(raw: u8) -> Result<f64, SensorError> {
    barrel_level(raw).map(|level| f64::from(level) * PERCENT_PER_LEVEL)
}
