//! Garden lights: tree and house (230 V) and the tap light (12 V).

use log::info;

use crate::app::context::GardenContext;
use crate::app::payload::parse_on_off;
use crate::app::ports::GardenModule;
use crate::error::Result;
use crate::gpioex::bank::Actuators;

use super::{not_initialised, subscribe_all};

pub const TOPIC_LIGHT_TREE: &str = "/garden/light/tree";
pub const TOPIC_LIGHT_HOUSE: &str = "/garden/light/house";
pub const TOPIC_LIGHT_TAP: &str = "/garden/light/tap";

const LIGHTS: [(&str, Actuators); 3] = [
    (TOPIC_LIGHT_TREE, Actuators::LIGHT_TREE),
    (TOPIC_LIGHT_HOUSE, Actuators::LIGHT_HOUSE),
    (TOPIC_LIGHT_TAP, Actuators::LIGHT_TAP),
];

#[derive(Default)]
pub struct Light {
    ctx: Option<GardenContext>,
}

impl Light {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GardenModule for Light {
    fn name(&self) -> &'static str {
        "light"
    }

    fn init(&mut self, ctx: &GardenContext) -> Result<()> {
        self.ctx = Some(ctx.clone());
        Ok(())
    }

    fn subscribe(&mut self) -> Result<()> {
        let ctx = self.ctx.as_ref().ok_or_else(|| not_initialised(self.name()))?;
        let topics = LIGHTS.map(|(topic, _)| topic);
        subscribe_all(ctx.transport.as_ref(), &topics)
    }

    fn on_message(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        let Some(&(_, light)) = LIGHTS.iter().find(|(t, _)| *t == topic) else {
            return Ok(());
        };
        let on = parse_on_off(payload)?;
        let ctx = self.ctx.as_ref().ok_or_else(|| not_initialised(self.name()))?;

        info!("light: {topic} {}", if on { "on" } else { "off" });
        ctx.actuators.set(light, on)?;
        Ok(())
    }
}
