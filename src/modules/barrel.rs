//! Rain barrel level monitor.
//!
//! Polls the barrel-level register through the actuator port (so the read
//! is serialised with relay updates) and publishes the fill percentage.
//! A non-monotonic switch pattern is a sensor fault: it is logged and
//! nothing is published for that poll.

use std::sync::Arc;

use log::{info, warn};

use crate::app::context::GardenContext;
use crate::app::ports::{ActuatorPort, GardenModule, Transport};
use crate::error::Result;
use crate::sensors::barrel::barrel_level_percent;
use crate::worker::Worker;

use super::{ReportFilter, publish_reading};

pub const TOPIC_BARREL_LEVEL: &str = "/garden/sensor/barrel";

pub struct BarrelPoller {
    actuators: Arc<dyn ActuatorPort>,
    transport: Arc<dyn Transport>,
    filter: ReportFilter,
    period: u32,
}

impl BarrelPoller {
    pub fn new(
        actuators: Arc<dyn ActuatorPort>,
        transport: Arc<dyn Transport>,
        publish_every: u32,
    ) -> Self {
        Self {
            actuators,
            transport,
            filter: ReportFilter::new(publish_every),
            period: 0,
        }
    }

    /// One poll; returns the decoded percentage if the read succeeded.
    pub fn poll(&mut self) -> Option<f64> {
        let period = self.period;
        self.period = self.period.wrapping_add(1);

        let raw = match self.actuators.barrel_level_raw() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("barrel: level read failed: {e}");
                return None;
            }
        };
        let percent = match barrel_level_percent(raw) {
            Ok(p) => p,
            Err(e) => {
                warn!("barrel: {e}");
                return None;
            }
        };

        if self.filter.should_report(percent, period) {
            if let Err(e) = publish_reading(self.transport.as_ref(), TOPIC_BARREL_LEVEL, percent) {
                warn!("barrel: publish failed: {e}");
            }
        }
        Some(percent)
    }
}

#[derive(Default)]
pub struct BarrelMonitor {
    worker: Option<Worker>,
}

impl BarrelMonitor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GardenModule for BarrelMonitor {
    fn name(&self) -> &'static str {
        "barrel"
    }

    fn init(&mut self, ctx: &GardenContext) -> Result<()> {
        let mut poller = BarrelPoller::new(
            ctx.actuators.clone(),
            ctx.transport.clone(),
            ctx.config.publish_every,
        );
        let interval = ctx.config.barrel_interval();
        self.worker = Some(Worker::periodic("barrel-level", interval, move || {
            poller.poll();
        })?);
        info!("barrel: polling every {interval:?}");
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
    }
}
