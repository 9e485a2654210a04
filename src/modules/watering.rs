//! Watering: tap, yard zones, droppipe pump and barrel valve.
//!
//! Every command maps to exactly one [`ActuatorPort::set`] call; the pump
//! interlock is handled below the port, not here.
//!
//! [`ActuatorPort::set`]: crate::app::ports::ActuatorPort::set

use log::info;

use crate::app::context::GardenContext;
use crate::app::payload::{parse_on_off, parse_water};
use crate::app::ports::GardenModule;
use crate::error::Result;
use crate::gpioex::bank::Actuators;

use super::{not_initialised, subscribe_all};

pub const TOPIC_TAP: &str = "/garden/tap";
pub const TOPIC_WATER: &str = "/garden/water";
pub const TOPIC_DROPPIPE_PUMP: &str = "/garden/droppipepump";
pub const TOPIC_BARREL: &str = "/garden/barrel";

const TOPICS: [&str; 4] = [TOPIC_TAP, TOPIC_WATER, TOPIC_DROPPIPE_PUMP, TOPIC_BARREL];

#[derive(Default)]
pub struct Watering {
    ctx: Option<GardenContext>,
}

impl Watering {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GardenModule for Watering {
    fn name(&self) -> &'static str {
        "watering"
    }

    fn init(&mut self, ctx: &GardenContext) -> Result<()> {
        self.ctx = Some(ctx.clone());
        Ok(())
    }

    fn subscribe(&mut self) -> Result<()> {
        let ctx = self.ctx.as_ref().ok_or_else(|| not_initialised(self.name()))?;
        subscribe_all(ctx.transport.as_ref(), &TOPICS)
    }

    fn on_message(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        let (actuators, engage) = match topic {
            TOPIC_TAP => (Actuators::TAP, parse_on_off(payload)?),
            TOPIC_WATER => parse_water(payload)?,
            TOPIC_DROPPIPE_PUMP => (Actuators::DROPPIPE_PUMP, parse_on_off(payload)?),
            TOPIC_BARREL => (Actuators::BARREL, parse_on_off(payload)?),
            _ => return Ok(()),
        };
        let ctx = self.ctx.as_ref().ok_or_else(|| not_initialised(self.name()))?;

        info!("watering: {topic} -> 0x{:03X} engage={engage}", actuators.bits());
        ctx.actuators.set(actuators, engage)?;
        Ok(())
    }
}
