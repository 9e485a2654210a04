//! The explicitly owned context handed to every module.
//!
//! Built once in `main`, borrowed by the registry during `init`; modules
//! clone the `Arc`s they need into their workers.  This replaces the
//! process-wide globals (hardware lock, log level) of a plugin host.

use std::sync::Arc;

use crate::config::SystemConfig;

use super::ports::{ActuatorPort, Transport};

#[derive(Clone)]
pub struct GardenContext {
    pub config: Arc<SystemConfig>,
    pub actuators: Arc<dyn ActuatorPort>,
    pub transport: Arc<dyn Transport>,
}

impl GardenContext {
    pub fn new(
        config: SystemConfig,
        actuators: Arc<dyn ActuatorPort>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            actuators,
            transport,
        }
    }
}
