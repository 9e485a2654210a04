//! Mock hardware and transport for integration tests.
//!
//! `MockBus` stands in for `/dev/i2c-N`: it keeps one byte per address and
//! records every transfer so tests can assert on the exact register
//! sequence.  State lives behind an `Arc` so the test keeps a handle after
//! the bus has been moved into a `GpioExpander`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gardenctl::app::ports::{ActuatorPort, QoS, Transport};
use gardenctl::drivers::i2c::RegisterBus;
use gardenctl::error::{ActuatorError, IoError, TransportError};
use gardenctl::gpioex::bank::Actuators;

// ── Bus call record ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCall {
    Read(u8),
    Write(u8, u8),
}

#[derive(Default)]
struct BusState {
    registers: HashMap<u8, u8>,
    calls: Vec<BusCall>,
    /// Fail the n-th transfer (0-based, counting reads and writes).
    fail_at: Option<(usize, IoError)>,
}

// ── MockBus ───────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<BusState>>,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus with every relay register and the barrel register at `0xFF`.
    pub fn released() -> Self {
        let bus = Self::new();
        for addr in 0x20..=0x23 {
            bus.set_register(addr, 0xFF);
        }
        bus
    }

    pub fn set_register(&self, addr: u8, value: u8) {
        self.state.lock().unwrap().registers.insert(addr, value);
    }

    pub fn register(&self, addr: u8) -> Option<u8> {
        self.state.lock().unwrap().registers.get(&addr).copied()
    }

    pub fn calls(&self) -> Vec<BusCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BusCall::Write(a, v) => Some((a, v)),
                BusCall::Read(_) => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Fail the `n`-th transfer from now (0-based) with `error`.
    pub fn fail_at(&self, n: usize, error: IoError) {
        let mut s = self.state.lock().unwrap();
        let base = s.calls.len();
        s.fail_at = Some((base + n, error));
    }

    fn check_failure(s: &mut BusState) -> Result<(), IoError> {
        match s.fail_at {
            Some((n, error)) if n == s.calls.len() => {
                s.fail_at = None;
                Err(error)
            }
            _ => Ok(()),
        }
    }
}

impl RegisterBus for MockBus {
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), IoError> {
        let mut s = self.state.lock().unwrap();
        let result = Self::check_failure(&mut s);
        s.calls.push(BusCall::Write(address, value));
        result?;
        s.registers.insert(address, value);
        Ok(())
    }

    fn read_register(&mut self, address: u8) -> Result<u8, IoError> {
        let mut s = self.state.lock().unwrap();
        let result = Self::check_failure(&mut s);
        s.calls.push(BusCall::Read(address));
        result?;
        s.registers.get(&address).copied().ok_or(IoError::ReadShort)
    }
}

// ── RecordingActuators ────────────────────────────────────────

const ALL_ACTUATORS: [Actuators; 10] = [
    Actuators::TAP,
    Actuators::YARD_LEFT,
    Actuators::YARD_RIGHT,
    Actuators::YARD_FRONT,
    Actuators::YARD_BACK,
    Actuators::DROPPIPE_PUMP,
    Actuators::BARREL,
    Actuators::LIGHT_TREE,
    Actuators::LIGHT_HOUSE,
    Actuators::LIGHT_TAP,
];

/// Actuator port that records `set` calls and serves a fixed barrel byte.
#[derive(Default)]
pub struct RecordingActuators {
    pub sets: Mutex<Vec<(Actuators, bool)>>,
    pub barrel_raw: Mutex<Option<u8>>,
    pub fail_next_set: Mutex<Option<ActuatorError>>,
}

#[allow(dead_code)]
impl RecordingActuators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_barrel(raw: u8) -> Self {
        let a = Self::new();
        *a.barrel_raw.lock().unwrap() = Some(raw);
        a
    }

    pub fn sets(&self) -> Vec<(Actuators, bool)> {
        self.sets.lock().unwrap().clone()
    }

    pub fn fail_next_set(&self, error: ActuatorError) {
        *self.fail_next_set.lock().unwrap() = Some(error);
    }
}

impl ActuatorPort for RecordingActuators {
    fn set(&self, actuators: Actuators, engage: bool) -> Result<(), ActuatorError> {
        if let Some(e) = self.fail_next_set.lock().unwrap().take() {
            return Err(e);
        }
        self.sets.lock().unwrap().push((actuators, engage));
        Ok(())
    }

    /// Engaged if the most recent `set` touching each actuator engaged it.
    fn is_engaged(&self, actuators: Actuators) -> Result<bool, ActuatorError> {
        let sets = self.sets();
        let engaged = |single: Actuators| {
            sets.iter()
                .rev()
                .find(|(a, _)| a.intersects(single))
                .is_some_and(|&(_, engage)| engage)
        };
        let mut any = false;
        for single in ALL_ACTUATORS.into_iter().filter(|&a| actuators.intersects(a)) {
            if !engaged(single) {
                return Ok(false);
            }
            any = true;
        }
        Ok(any)
    }

    fn barrel_level_raw(&self) -> Result<u8, ActuatorError> {
        (*self.barrel_raw.lock().unwrap()).ok_or(ActuatorError::NotInitialized)
    }
}

// ── RecordingTransport ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub qos: QoS,
    pub retain: bool,
}

#[derive(Default)]
pub struct RecordingTransport {
    pub subscriptions: Mutex<Vec<String>>,
    pub published: Mutex<Vec<Published>>,
    /// Topic whose subscription is refused.
    pub refuse: Mutex<Option<String>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn payloads_on(&self, topic: &str) -> Vec<String> {
        self.published()
            .into_iter()
            .filter(|p| p.topic == topic)
            .map(|p| p.payload)
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn subscribe(&self, topic: &str, _qos: QoS) -> Result<(), TransportError> {
        if self.refuse.lock().unwrap().as_deref() == Some(topic) {
            return Err(TransportError::SubscribeFailed(topic.to_owned()));
        }
        self.subscriptions.lock().unwrap().push(topic.to_owned());
        Ok(())
    }

    fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), TransportError> {
        self.published.lock().unwrap().push(Published {
            topic: topic.to_owned(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            qos,
            retain,
        });
        Ok(())
    }
}
