//! Built-in feature modules.
//!
//! | Module          | Inbound topics                         | Worker          |
//! |-----------------|----------------------------------------|-----------------|
//! | watering        | tap, water, droppipepump, barrel       | -               |
//! | light           | light/tree, light/house, light/tap     | -               |
//! | weather_station | -                                      | 30 s DHT poll   |
//! | barrel          | -                                      | level poll      |
//! | tap_button      | -                                      | GPIO edge wait  |

pub mod barrel;
pub mod light;
pub mod tap_button;
pub mod watering;
pub mod weather_station;

use core::fmt::Write;

use crate::app::ports::{QoS, Transport};
use crate::error::{Error, Result, TransportError};

/// Publish-on-change with a periodic refresh, so late subscribers and
/// dashboards still see a value when nothing moves.
#[derive(Debug, Clone)]
pub struct ReportFilter {
    every: u32,
    last: Option<f64>,
}

impl ReportFilter {
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            last: None,
        }
    }

    /// Whether `value`, read in poll number `period`, should be published.
    pub fn should_report(&mut self, value: f64, period: u32) -> bool {
        let due = period % self.every == 0;
        if due || self.last != Some(value) {
            self.last = Some(value);
            return true;
        }
        false
    }
}

/// Publish a reading formatted with one decimal.
pub(crate) fn publish_reading(transport: &dyn Transport, topic: &str, value: f64) -> Result<()> {
    let mut buf: heapless::String<16> = heapless::String::new();
    write!(buf, "{value:.1}").map_err(|_| TransportError::PublishFailed(topic.to_owned()))?;
    transport.publish(topic, buf.as_bytes(), QoS::ExactlyOnce, false)?;
    Ok(())
}

/// Subscribe to every topic in `topics` with QoS 2, stopping at the first failure.
pub(crate) fn subscribe_all(transport: &dyn Transport, topics: &[&str]) -> Result<()> {
    for topic in topics {
        transport.subscribe(topic, QoS::ExactlyOnce)?;
    }
    Ok(())
}

pub(crate) fn not_initialised(module: &str) -> Error {
    Error::Init(format!("{module}: not initialised"))
}
