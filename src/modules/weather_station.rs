//! Weather station: periodic DHT temperature / humidity publishing.

use std::sync::Arc;

use log::{info, warn};

use crate::app::context::GardenContext;
use crate::app::ports::{GardenModule, Transport};
use crate::error::Result;
use crate::sensors::weather::DhtSensor;
use crate::worker::Worker;

use super::{ReportFilter, publish_reading};

pub const TOPIC_TEMPERATURE: &str = "/garden/sensor/temperature";
pub const TOPIC_HUMIDITY: &str = "/garden/sensor/humidity";

/// One poll cycle's state; owned by the worker thread.
pub struct WeatherPoller {
    dht: DhtSensor,
    transport: Arc<dyn Transport>,
    temperature: ReportFilter,
    humidity: ReportFilter,
    period: u32,
}

impl WeatherPoller {
    pub fn new(dht: DhtSensor, transport: Arc<dyn Transport>, publish_every: u32) -> Self {
        Self {
            dht,
            transport,
            temperature: ReportFilter::new(publish_every),
            humidity: ReportFilter::new(publish_every),
            period: 0,
        }
    }

    /// Read both channels and publish what is due.  Failed reads and
    /// publishes are logged and skipped.
    pub fn poll(&mut self) {
        match self.dht.temperature() {
            Ok(t) if self.temperature.should_report(t, self.period) => {
                if let Err(e) = publish_reading(self.transport.as_ref(), TOPIC_TEMPERATURE, t) {
                    warn!("weather: publish temperature failed: {e}");
                }
            }
            Ok(_) => {}
            Err(e) => warn!("weather: temperature read failed: {e}"),
        }

        match self.dht.humidity() {
            Ok(h) if self.humidity.should_report(h, self.period) => {
                if let Err(e) = publish_reading(self.transport.as_ref(), TOPIC_HUMIDITY, h) {
                    warn!("weather: publish humidity failed: {e}");
                }
            }
            Ok(_) => {}
            Err(e) => warn!("weather: humidity read failed: {e}"),
        }

        self.period = self.period.wrapping_add(1);
    }
}

#[derive(Default)]
pub struct WeatherStation {
    worker: Option<Worker>,
}

impl WeatherStation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GardenModule for WeatherStation {
    fn name(&self) -> &'static str {
        "weather_station"
    }

    fn init(&mut self, ctx: &GardenContext) -> Result<()> {
        let config = &ctx.config;
        let mut poller = WeatherPoller::new(
            DhtSensor::new(&config.iio_device),
            ctx.transport.clone(),
            config.publish_every,
        );
        self.worker = Some(Worker::periodic(
            "weather-station",
            config.weather_interval(),
            move || poller.poll(),
        )?);
        info!("weather: polling {} every {:?}", config.iio_device.display(), config.weather_interval());
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
    }
}
