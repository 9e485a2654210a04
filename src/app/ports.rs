//! Port traits: the boundary between feature modules and the outside world.
//!
//! ```text
//!   Transport ──▶ ModuleRegistry ──▶ GardenModule ──▶ ActuatorPort
//!       ▲                                 │
//!       └──────────── publish ────────────┘
//! ```
//!
//! Modules only ever see these traits through a
//! [`GardenContext`](super::context::GardenContext), so every module can be
//! exercised on the host with recording mocks.

use crate::error::{ActuatorError, Result, TransportError};
use crate::gpioex::bank::Actuators;

use super::context::GardenContext;

// ───────────────────────────────────────────────────────────────
// Actuator port (domain → relay banks)
// ───────────────────────────────────────────────────────────────

/// Write-side port onto the relay banks, shared by every module and worker.
///
/// Implementations serialise whole operations; callers simply block.
pub trait ActuatorPort: Send + Sync {
    /// Engage (`true`) or release (`false`) every actuator in the set.
    fn set(&self, actuators: Actuators, engage: bool) -> core::result::Result<(), ActuatorError>;

    /// Whether every actuator in the set is engaged, read back from the relays.
    fn is_engaged(&self, actuators: Actuators) -> core::result::Result<bool, ActuatorError>;

    /// Raw barrel level register byte.
    fn barrel_level_raw(&self) -> core::result::Result<u8, ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Transport port (broker ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Delivery guarantee requested from the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QoS {
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

/// The message broker session as modules see it.  Inbound messages are
/// delivered by the host through [`GardenModule::on_message`].
pub trait Transport: Send + Sync {
    fn subscribe(&self, topic: &str, qos: QoS) -> core::result::Result<(), TransportError>;

    fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> core::result::Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Feature module capability interface
// ───────────────────────────────────────────────────────────────

/// A feature module hosted by the [`ModuleRegistry`](super::registry::ModuleRegistry).
///
/// Lifecycle: `init` once, `subscribe` once, then `on_message` for every
/// inbound message, and finally `shutdown`.  Modules ignore topics that
/// are not theirs and return `Ok(())` for them.
pub trait GardenModule: Send {
    fn name(&self) -> &'static str;

    /// Keep what the module needs from the context and start any workers.
    fn init(&mut self, ctx: &GardenContext) -> Result<()>;

    fn subscribe(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_message(&mut self, _topic: &str, _payload: &[u8]) -> Result<()> {
        Ok(())
    }

    /// Stop and join background workers.
    fn shutdown(&mut self) {}
}
