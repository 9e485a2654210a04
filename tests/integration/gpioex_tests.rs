//! Relay bank control against the mock bus: register sequences, the
//! pump/valve interlock, failure handling and locking.

use std::sync::Arc;
use std::thread;

use gardenctl::error::{ActuatorError, EIO, IoError};
use gardenctl::gpioex::GpioExpander;
use gardenctl::gpioex::bank::{Actuators, PUMP_MASK, Register, is_full_valve_lockout};
use gardenctl::sensors::barrel::barrel_level_percent;

use crate::mock_hw::{BusCall, MockBus};

const BARREL: u8 = 0x20;
const HIGH: u8 = 0x21;
const MID: u8 = 0x22;
const LOW: u8 = 0x23;

fn ready_bank() -> (GpioExpander<MockBus>, MockBus) {
    let bus = MockBus::released();
    let bank = GpioExpander::new(bus.clone());
    bank.init().unwrap();
    bus.clear_calls();
    (bank, bus)
}

// ── init ──────────────────────────────────────────────────────

#[test]
fn init_releases_high_mid_low_in_order() {
    let bus = MockBus::new();
    let bank = GpioExpander::new(bus.clone());

    assert!(!bank.is_initialized());
    bank.init().unwrap();
    assert!(bank.is_initialized());
    assert_eq!(bus.writes(), vec![(HIGH, 0xFF), (MID, 0xFF), (LOW, 0xFF)]);
}

#[test]
fn init_stops_at_first_failing_register() {
    let bus = MockBus::new();
    bus.fail_at(1, IoError::Write(EIO));
    let bank = GpioExpander::new(bus.clone());

    assert_eq!(
        bank.init(),
        Err(ActuatorError::Io {
            register: Register::MidVoltage,
            error: IoError::Write(EIO),
        })
    );
    assert_eq!(bus.calls(), vec![BusCall::Write(HIGH, 0xFF), BusCall::Write(MID, 0xFF)]);
    assert_eq!(bus.register(LOW), None, "low-voltage bank must not be touched");
    assert!(!bank.is_initialized());
}

#[test]
fn set_before_init_is_refused_without_bus_traffic() {
    let bus = MockBus::released();
    let bank = GpioExpander::new(bus.clone());

    assert_eq!(bank.set(Actuators::TAP, true), Err(ActuatorError::NotInitialized));
    assert!(bus.calls().is_empty());
}

// ── interlock ─────────────────────────────────────────────────

#[test]
fn opening_a_valve_writes_mid_before_starting_pump() {
    let (bank, bus) = ready_bank();

    bank.set(Actuators::TAP, true).unwrap();

    assert_eq!(
        bus.calls(),
        vec![
            BusCall::Read(MID),
            BusCall::Write(MID, 0xF7),
            BusCall::Read(HIGH),
            BusCall::Write(HIGH, 0x7F),
        ]
    );
}

#[test]
fn closing_last_valve_stops_pump_before_mid() {
    let (bank, bus) = ready_bank();
    bank.set(Actuators::TAP, true).unwrap();
    bus.clear_calls();

    bank.set(Actuators::TAP, false).unwrap();

    assert_eq!(
        bus.calls(),
        vec![
            BusCall::Read(MID),
            BusCall::Read(HIGH),
            BusCall::Write(HIGH, 0xFF),
            BusCall::Write(MID, 0xFF),
        ]
    );
}

#[test]
fn closing_one_of_two_valves_keeps_pump_running() {
    let (bank, bus) = ready_bank();
    bank.set(Actuators::TAP | Actuators::YARD_LEFT, true).unwrap();
    assert_eq!(bus.register(MID), Some(0xF6));
    bus.clear_calls();

    bank.set(Actuators::TAP, false).unwrap();

    assert_eq!(
        bus.calls(),
        vec![
            BusCall::Read(MID),
            BusCall::Write(MID, 0xFE),
            BusCall::Read(HIGH),
            BusCall::Write(HIGH, 0x7F),
        ]
    );
}

#[test]
fn releasing_all_yard_zones_is_a_lockout() {
    let (bank, bus) = ready_bank();
    bank.set(Actuators::YARD_FRONT | Actuators::YARD_BACK, true).unwrap();
    assert_eq!(bus.register(HIGH), Some(0x7F));

    bank.set(Actuators::YARD, false).unwrap();

    assert_eq!(bus.register(MID), Some(0xFF));
    assert_eq!(bus.register(HIGH), Some(0xFF));
}

#[test]
fn other_high_bits_survive_pump_updates() {
    let (bank, bus) = ready_bank();
    bank.set(Actuators::LIGHT_TREE, true).unwrap();
    bank.set(Actuators::BARREL, true).unwrap();

    assert_eq!(bus.register(HIGH), Some(0xFD & 0x7F));
    bank.set(Actuators::BARREL, false).unwrap();
    assert_eq!(bus.register(HIGH), Some(0xFD), "tree light must stay on");
}

// ── independent actuators ─────────────────────────────────────

#[test]
fn lights_touch_only_their_own_register() {
    let (bank, bus) = ready_bank();

    bank.set(Actuators::LIGHT_TREE | Actuators::LIGHT_TAP, true).unwrap();

    assert_eq!(
        bus.calls(),
        vec![
            BusCall::Read(HIGH),
            BusCall::Write(HIGH, 0xFD),
            BusCall::Read(LOW),
            BusCall::Write(LOW, 0xFE),
        ]
    );
}

#[test]
fn droppipe_pump_is_not_interlocked() {
    let (bank, bus) = ready_bank();

    bank.set(Actuators::DROPPIPE_PUMP, true).unwrap();

    assert_eq!(bus.register(HIGH), Some(0xFE));
    assert!(!bus.calls().contains(&BusCall::Read(MID)));
}

#[test]
fn tap_with_light_runs_valves_then_light() {
    let (bank, bus) = ready_bank();

    bank.set(Actuators::TAP | Actuators::LIGHT_TAP, true).unwrap();

    assert_eq!(
        bus.writes(),
        vec![(MID, 0xF7), (HIGH, 0x7F), (LOW, 0xFE)]
    );
}

// ── failures ──────────────────────────────────────────────────

#[test]
fn failed_mid_write_leaves_pump_off() {
    let (bank, bus) = ready_bank();
    bus.fail_at(1, IoError::Write(EIO));

    assert_eq!(
        bank.set(Actuators::TAP, true),
        Err(ActuatorError::Io {
            register: Register::MidVoltage,
            error: IoError::Write(EIO),
        })
    );
    assert_eq!(bus.calls().len(), 2, "sequence must stop at the failure");
    assert_eq!(bus.register(MID), Some(0xFF));
    assert_eq!(bus.register(HIGH), Some(0xFF));
}

#[test]
fn failed_high_write_during_lockout_leaves_valves_open() {
    let (bank, bus) = ready_bank();
    bank.set(Actuators::TAP, true).unwrap();
    bus.fail_at(2, IoError::Write(EIO));

    assert!(bank.set(Actuators::TAP, false).is_err());
    assert_eq!(bus.register(MID), Some(0xF7), "valve stays open for the running pump");
    assert_eq!(bus.register(HIGH), Some(0x7F));
}

#[test]
fn failed_light_aborts_remaining_independent_bits() {
    let (bank, bus) = ready_bank();
    bus.fail_at(0, IoError::Open(libc::ENOENT));

    assert_eq!(
        bank.set(Actuators::LIGHT_TREE | Actuators::LIGHT_TAP, true),
        Err(ActuatorError::Io {
            register: Register::HighVoltage,
            error: IoError::Open(libc::ENOENT),
        })
    );
    assert_eq!(bus.calls(), vec![BusCall::Read(HIGH)]);
}

// ── read-back ─────────────────────────────────────────────────

#[test]
fn is_engaged_reads_only_mapped_registers() {
    let (bank, bus) = ready_bank();
    bank.set(Actuators::TAP, true).unwrap();
    bus.clear_calls();

    assert_eq!(bank.is_engaged(Actuators::TAP), Ok(true));
    assert_eq!(bus.calls(), vec![BusCall::Read(MID)]);

    assert_eq!(bank.is_engaged(Actuators::TAP | Actuators::LIGHT_TAP), Ok(false));
    assert_eq!(bank.is_engaged(Actuators::BARREL), Ok(false));
    assert_eq!(bank.is_engaged(Actuators::NONE), Ok(false));
}

#[test]
fn is_engaged_sees_changes_made_elsewhere() {
    let (bank, bus) = ready_bank();
    bus.set_register(LOW, 0xFE);

    assert_eq!(bank.is_engaged(Actuators::LIGHT_TAP), Ok(true));
}

// ── barrel ────────────────────────────────────────────────────

#[test]
fn barrel_level_reads_raw_byte() {
    let (bank, bus) = ready_bank();
    bus.set_register(BARREL, 0xF0);

    let raw = bank.get_barrel_level().unwrap();
    assert_eq!(raw, 0xF0);
    assert_eq!(barrel_level_percent(raw), Ok(50.0));
    assert_eq!(bus.calls(), vec![BusCall::Read(BARREL)]);
}

#[test]
fn barrel_level_is_readable_before_init() {
    let bus = MockBus::released();
    bus.set_register(BARREL, 0x00);
    let bank = GpioExpander::new(bus);

    assert_eq!(bank.get_barrel_level(), Ok(0x00));
}

#[test]
fn empty_barrel_read_reports_no_data() {
    let bus = MockBus::new();
    let bank = GpioExpander::new(bus);

    assert_eq!(
        bank.get_barrel_level(),
        Err(ActuatorError::Io {
            register: Register::BarrelLevel,
            error: IoError::ReadShort,
        })
    );
}

// ── locking ───────────────────────────────────────────────────

#[test]
fn concurrent_callers_never_run_pump_into_closed_valves() {
    let (bank, bus) = ready_bank();
    let bank = Arc::new(bank);
    let zones = [
        Actuators::TAP,
        Actuators::YARD_LEFT,
        Actuators::BARREL,
        Actuators::YARD_BACK,
    ];

    let handles: Vec<_> = zones
        .into_iter()
        .map(|zone| {
            let bank = bank.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    bank.set(zone, true).unwrap();
                    bank.set(zone | Actuators::LIGHT_TAP, false).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // Replay the write log: the pump may only be energised while at
    // least one valve is open.
    let (mut mid, mut high) = (0xFFu8, 0xFFu8);
    for (addr, value) in bus.writes() {
        match addr {
            MID => mid = value,
            HIGH => high = value,
            _ => {}
        }
        let pump_on = high & PUMP_MASK == 0;
        assert!(
            !(pump_on && is_full_valve_lockout(mid)),
            "pump on with all valves closed: mid=0x{mid:02X} high=0x{high:02X}"
        );
    }
    assert_eq!(bus.register(MID), Some(0xFF));
    assert_eq!(bus.register(HIGH), Some(0xFF));
}
