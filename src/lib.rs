//! gardenctl library.
//!
//! Relay bank control over I2C GPIO expanders, sensor decoding, and the
//! feature modules that map broker topics onto actuators.  Everything
//! hardware-facing sits behind a trait so the logic runs on the host
//! against mocks.

pub mod adapters;
pub mod app;
pub mod config;
pub mod daemon;
pub mod drivers;
pub mod error;
pub mod gpioex;
pub mod logger;
pub mod modules;
pub mod sensors;
pub mod worker;
