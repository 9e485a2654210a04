//! Static module registry: the plugin host.
//!
//! Modules are linked in and registered in a fixed order at startup.
//! Lifecycle calls fan out in registration order and stop at the first
//! module that fails; shutdown runs in reverse order.

use log::{debug, error, info};

use crate::config::ModulesConfig;
use crate::error::Result;
use crate::modules;

use super::context::GardenContext;
use super::ports::GardenModule;

#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Box<dyn GardenModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with the built-in modules enabled in `enabled`.
    pub fn from_config(enabled: &ModulesConfig) -> Self {
        let mut reg = Self::new();
        if enabled.watering {
            reg.register(Box::new(modules::watering::Watering::new()));
        }
        if enabled.light {
            reg.register(Box::new(modules::light::Light::new()));
        }
        if enabled.weather_station {
            reg.register(Box::new(modules::weather_station::WeatherStation::new()));
        }
        if enabled.barrel {
            reg.register(Box::new(modules::barrel::BarrelMonitor::new()));
        }
        if enabled.tap_button {
            reg.register(Box::new(modules::tap_button::TapButton::new()));
        }
        reg
    }

    pub fn register(&mut self, module: Box<dyn GardenModule>) {
        debug!("registry: registered {}", module.name());
        self.modules.push(module);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn init_all(&mut self, ctx: &GardenContext) -> Result<()> {
        for module in &mut self.modules {
            module.init(ctx).inspect_err(|e| {
                error!("registry: init {} failed: {e}", module.name());
            })?;
            info!("registry: {} initialised", module.name());
        }
        Ok(())
    }

    pub fn subscribe_all(&mut self) -> Result<()> {
        for module in &mut self.modules {
            module.subscribe().inspect_err(|e| {
                error!("registry: subscribe {} failed: {e}", module.name());
            })?;
        }
        Ok(())
    }

    /// Deliver one inbound message to every module.
    pub fn dispatch(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        debug!("registry: message on {topic} ({} bytes)", payload.len());
        for module in &mut self.modules {
            module.on_message(topic, payload).inspect_err(|e| {
                error!("registry: {} rejected {topic}: {e}", module.name());
            })?;
        }
        Ok(())
    }

    pub fn shutdown(&mut self) {
        for module in self.modules.iter_mut().rev() {
            debug!("registry: shutting down {}", module.name());
            module.shutdown();
        }
    }
}
