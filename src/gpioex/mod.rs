//! Actuator control: the single serialisation point for the relay banks.
//!
//! ## Locking
//!
//! One mutex covers the bus *and* the whole read-modify-write sequence of
//! an operation, across all three relay registers.  Per-register locking
//! is not enough: two callers interleaving their MID and HIGH writes could
//! leave the pump energised against a fully closed valve bank even though
//! each caller's own sequence is correctly ordered.
//!
//! ## Interlock ordering
//!
//! ```text
//!   new MID is full lockout:   HIGH(pump off) ──▶ MID
//!   otherwise:                 MID            ──▶ HIGH(pump on)
//! ```
//!
//! A failure aborts the sequence with no rollback.  The register that
//! failed still holds its previous value, and the ordering above means a
//! half-finished sequence never leaves the pump running into closed valves.
//!
//! Registers are re-read before every modification; hardware is the only
//! source of truth.

pub mod bank;

use std::sync::{Mutex, MutexGuard};

use log::{debug, info};

use crate::app::ports::ActuatorPort;
use crate::drivers::i2c::RegisterBus;
use crate::error::ActuatorError;

use bank::{ALL_OFF, Actuators, PUMP_MASK, Register, apply_bits, is_full_valve_lockout};

struct Inner<B> {
    bus: B,
    initialized: bool,
}

/// The relay banks behind one mutex.
pub struct GpioExpander<B: RegisterBus> {
    inner: Mutex<Inner<B>>,
}

impl<B: RegisterBus> GpioExpander<B> {
    /// Wrap a bus.  The bank starts uninitialised; call [`init`](Self::init).
    pub fn new(bus: B) -> Self {
        Self {
            inner: Mutex::new(Inner {
                bus,
                initialized: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<B>> {
        // No cached register state lives behind the lock, so poisoning is ignored.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Release every relay: HIGH, MID, then LOW, all to `0xFF`.
    ///
    /// Stops at the first failing register.  The daemon must not accept
    /// actuator commands unless this succeeded.
    pub fn init(&self) -> Result<(), ActuatorError> {
        let mut inner = self.lock();
        for register in Register::RELAYS {
            inner
                .bus
                .write_register(register.address(), ALL_OFF)
                .map_err(ActuatorError::io(register))?;
        }
        inner.initialized = true;
        info!("gpioex: all relay banks released");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Engage or release a set of actuators.
    pub fn set(&self, actuators: Actuators, engage: bool) -> Result<(), ActuatorError> {
        let mut inner = self.lock();
        if !inner.initialized {
            return Err(ActuatorError::NotInitialized);
        }
        debug!("gpioex: set 0x{:03X} engage={engage}", actuators.bits());

        let valves = bank::valve_mask(actuators);
        if valves != 0 {
            let mid = read(&mut inner.bus, Register::MidVoltage)?;
            let new_mid = apply_bits(mid, valves, engage);

            if is_full_valve_lockout(new_mid) {
                update(&mut inner.bus, Register::HighVoltage, PUMP_MASK, false)?;
                write(&mut inner.bus, Register::MidVoltage, new_mid)?;
            } else {
                write(&mut inner.bus, Register::MidVoltage, new_mid)?;
                update(&mut inner.bus, Register::HighVoltage, PUMP_MASK, true)?;
            }
        }

        for mapping in bank::independent(actuators) {
            update(&mut inner.bus, mapping.register, mapping.mask, engage)?;
        }

        Ok(())
    }

    /// Read back whether every actuator in `actuators` is engaged.  Only
    /// the registers the set maps to are read; an empty set is `false`.
    pub fn is_engaged(&self, actuators: Actuators) -> Result<bool, ActuatorError> {
        let mut inner = self.lock();
        for register in Register::RELAYS {
            let mask = bank::physical_mask(actuators, register);
            if mask == 0 {
                continue;
            }
            if read(&mut inner.bus, register)? & mask != 0 {
                return Ok(false);
            }
        }
        Ok(!actuators.is_empty())
    }

    /// Raw barrel level byte; decode with [`crate::sensors::barrel`].
    pub fn get_barrel_level(&self) -> Result<u8, ActuatorError> {
        let mut inner = self.lock();
        read(&mut inner.bus, Register::BarrelLevel)
    }
}

fn read<B: RegisterBus>(bus: &mut B, register: Register) -> Result<u8, ActuatorError> {
    bus.read_register(register.address())
        .map_err(ActuatorError::io(register))
}

fn write<B: RegisterBus>(bus: &mut B, register: Register, value: u8) -> Result<(), ActuatorError> {
    bus.write_register(register.address(), value)
        .map_err(ActuatorError::io(register))
}

/// Read-modify-write of `mask` in one register.
fn update<B: RegisterBus>(
    bus: &mut B,
    register: Register,
    mask: u8,
    engage: bool,
) -> Result<(), ActuatorError> {
    let current = read(bus, register)?;
    write(bus, register, apply_bits(current, mask, engage))
}

impl<B: RegisterBus> ActuatorPort for GpioExpander<B> {
    fn set(&self, actuators: Actuators, engage: bool) -> Result<(), ActuatorError> {
        GpioExpander::set(self, actuators, engage)
    }

    fn is_engaged(&self, actuators: Actuators) -> Result<bool, ActuatorError> {
        GpioExpander::is_engaged(self, actuators)
    }

    fn barrel_level_raw(&self) -> Result<u8, ActuatorError> {
        self.get_barrel_level()
    }
}
