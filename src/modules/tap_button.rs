//! Tap push-button: toggles the tap valve and its indicator light.
//!
//! The worker blocks on GPIO edges, bounded by a timeout so it notices a
//! stop request.  After every wake-up, edge or timeout, it debounces the
//! line and feeds the stable level into a [`TapToggle`], so a line without
//! edge support is still polled once per timeout.  A toggle engages or
//! releases `TAP | LIGHT_TAP` together and publishes the new state.  If the
//! relay update fails the toggle is rolled back, so the next press retries
//! the same transition.
//!
//! The tap valve can also be switched remotely through `/garden/tap`.  On
//! every press the toggle is re-synced from the TAP relay first, so a press
//! after a remote "on" turns the tap off.

use std::sync::Arc;
use std::time::Duration;

use embedded_hal::digital::InputPin;
use log::{error, info, warn};

use crate::app::context::GardenContext;
use crate::app::ports::{ActuatorPort, GardenModule, QoS, Transport};
use crate::drivers::gpio::SysfsGpio;
use crate::error::Result;
use crate::gpioex::bank::Actuators;
use crate::sensors::button::{
    DEFAULT_POLL_INTERVAL, DEFAULT_SETTLE_ITERATIONS, TapToggle, debounce_digital_input,
};
use crate::worker::{StopSignal, Worker};

pub const TOPIC_TAP_STATE: &str = "/garden/tap/state";

/// Actuators switched by a button press.
pub const TAP_ACTUATORS: Actuators = Actuators::TAP.union(Actuators::LIGHT_TAP);

/// Toggle state plus the ports a toggle drives; owned by the worker.
pub struct TapController {
    toggle: TapToggle,
    actuators: Arc<dyn ActuatorPort>,
    transport: Arc<dyn Transport>,
}

impl TapController {
    pub fn new(actuators: Arc<dyn ActuatorPort>, transport: Arc<dyn Transport>) -> Self {
        Self {
            toggle: TapToggle::new(),
            actuators,
            transport,
        }
    }

    pub fn is_on(&self) -> bool {
        self.toggle.is_on()
    }

    /// Feed one debounced sample (`pressed` = line low).
    /// Returns the new tap state if this sample toggled it.
    pub fn on_sample(&mut self, pressed: bool) -> Result<Option<bool>> {
        if pressed {
            match self.actuators.is_engaged(Actuators::TAP) {
                Ok(on) => self.toggle.sync(on),
                Err(e) => warn!("tap button: tap state read failed: {e}"),
            }
        }
        let before = self.toggle;
        let Some(on) = self.toggle.sample(pressed) else {
            return Ok(None);
        };

        if let Err(e) = self.actuators.set(TAP_ACTUATORS, on) {
            self.toggle = before;
            return Err(e.into());
        }
        info!("tap button: tap {}", if on { "on" } else { "off" });

        let payload: &[u8] = if on { b"on" } else { b"off" };
        if let Err(e) = self.transport.publish(TOPIC_TAP_STATE, payload, QoS::ExactlyOnce, true) {
            warn!("tap button: publish state failed: {e}");
        }
        Ok(Some(on))
    }
}

fn run(mut pin: SysfsGpio, mut controller: TapController, timeout: Duration, stop: &StopSignal) {
    // Clear the edge pending from export.
    if let Err(e) = pin.is_high() {
        warn!("tap button: initial read of gpio{} failed: {e}", pin.line());
    }

    while !stop.is_stopped() {
        if let Err(e) = pin.wait_for_edge(timeout) {
            warn!("tap button: edge wait failed: {e}");
            if stop.wait(timeout) {
                break;
            }
            continue;
        }

        let pressed =
            match debounce_digital_input(|| pin.is_low(), DEFAULT_SETTLE_ITERATIONS, DEFAULT_POLL_INTERVAL) {
                Ok(pressed) => pressed,
                Err(e) => {
                    warn!("tap button: debounce read failed: {e}");
                    continue;
                }
            };

        if let Err(e) = controller.on_sample(pressed) {
            error!("tap button: switching tap failed: {e}");
        }
    }
}

#[derive(Default)]
pub struct TapButton {
    worker: Option<Worker>,
}

impl TapButton {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GardenModule for TapButton {
    fn name(&self) -> &'static str {
        "tap_button"
    }

    fn init(&mut self, ctx: &GardenContext) -> Result<()> {
        let config = &ctx.config;
        let pin = SysfsGpio::input(&config.gpio_root, config.tap_button_gpio)?;
        let controller = TapController::new(ctx.actuators.clone(), ctx.transport.clone());
        let timeout = config.tap_poll_timeout();

        self.worker = Some(Worker::spawn("tap-button", move |stop| {
            run(pin, controller, timeout, &stop);
        })?);
        info!("tap button: watching gpio{}", config.tap_button_gpio);
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
    }
}
