//! Sensor decoding: barrel level, tap button, weather.
//!
//! Nothing in here touches the actuator lock.  The barrel module reads the
//! raw byte through [`crate::app::ports::ActuatorPort`] and decodes it here.

pub mod barrel;
pub mod button;
pub mod weather;
