//! Actuator bank model: logical actuators, the three relay registers, and
//! the pump/valve interlock rule.
//!
//! ## Register layout (bus 1)
//!
//! | Register      | Addr | Bits                                          |
//! |---------------|------|-----------------------------------------------|
//! | Barrel level  | 0x20 | 8 level sensor lines, read-only               |
//! | High voltage  | 0x21 | PUMP 0x80, DROPPIPE 0x01, TREE 0x02, HOUSE 0x04 |
//! | Mid voltage   | 0x22 | L 0x01, R 0x02, BARREL 0x04, TAP 0x08, F 0x10, B 0x20 |
//! | Low voltage   | 0x23 | LIGHT_TAP 0x01                                |
//!
//! Relay registers are active-low: a cleared bit energises the relay.
//! Everything here is pure; the I/O lives in [`super::GpioExpander`].

use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// I2C bus index the expander bank sits on.
pub const BUS: u8 = 1;

/// Register value with every relay released.
pub const ALL_OFF: u8 = 0xFF;

/// Main pump bit in the high-voltage register.  Not caller-addressable;
/// driven only by the interlock.
pub const PUMP_MASK: u8 = 0x80;

/// All six valve bits in the mid-voltage register.
pub const VALVE_MASK: u8 = 0x3F;

// ---------------------------------------------------------------------------
// Logical actuators
// ---------------------------------------------------------------------------

/// A set of logical actuators, combinable with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Actuators(u32);

impl Actuators {
    pub const NONE: Self = Self(0);
    pub const TAP: Self = Self(0x001);
    pub const YARD_LEFT: Self = Self(0x002);
    pub const YARD_RIGHT: Self = Self(0x004);
    pub const YARD_FRONT: Self = Self(0x008);
    pub const YARD_BACK: Self = Self(0x010);
    pub const DROPPIPE_PUMP: Self = Self(0x020);
    pub const BARREL: Self = Self(0x040);
    pub const LIGHT_TREE: Self = Self(0x080);
    pub const LIGHT_HOUSE: Self = Self(0x100);
    pub const LIGHT_TAP: Self = Self(0x200);

    /// All four yard irrigation zones.
    pub const YARD: Self = Self(0x002 | 0x004 | 0x008 | 0x010);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for Actuators {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Actuators {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ---------------------------------------------------------------------------
// Registers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    BarrelLevel,
    HighVoltage,
    MidVoltage,
    LowVoltage,
}

impl Register {
    /// Relay registers in the order `init` releases them.
    pub const RELAYS: [Self; 3] = [Self::HighVoltage, Self::MidVoltage, Self::LowVoltage];

    /// 7-bit I2C slave address.
    pub const fn address(self) -> u8 {
        match self {
            Self::BarrelLevel => 0x20,
            Self::HighVoltage => 0x21,
            Self::MidVoltage => 0x22,
            Self::LowVoltage => 0x23,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BarrelLevel => "barrel-level",
            Self::HighVoltage => "high-voltage",
            Self::MidVoltage => "mid-voltage",
            Self::LowVoltage => "low-voltage",
        };
        write!(f, "{name}@0x{:02X}", self.address())
    }
}

// ---------------------------------------------------------------------------
// Bit table
// ---------------------------------------------------------------------------

/// Where one logical actuator lives in hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitMapping {
    pub actuator: Actuators,
    pub register: Register,
    pub mask: u8,
}

const fn map(actuator: Actuators, register: Register, mask: u8) -> BitMapping {
    BitMapping { actuator, register, mask }
}

/// Valve relays; committed together under the interlock.
pub const VALVES: [BitMapping; 6] = [
    map(Actuators::YARD_LEFT, Register::MidVoltage, 0x01),
    map(Actuators::YARD_RIGHT, Register::MidVoltage, 0x02),
    map(Actuators::BARREL, Register::MidVoltage, 0x04),
    map(Actuators::TAP, Register::MidVoltage, 0x08),
    map(Actuators::YARD_FRONT, Register::MidVoltage, 0x10),
    map(Actuators::YARD_BACK, Register::MidVoltage, 0x20),
];

/// Single-bit actuators with no ordering dependency on the valves.
pub const INDEPENDENT: [BitMapping; 4] = [
    map(Actuators::DROPPIPE_PUMP, Register::HighVoltage, 0x01),
    map(Actuators::LIGHT_TREE, Register::HighVoltage, 0x02),
    map(Actuators::LIGHT_HOUSE, Register::HighVoltage, 0x04),
    map(Actuators::LIGHT_TAP, Register::LowVoltage, 0x01),
];

/// Bits of `register` that `actuators` map to.
pub fn physical_mask(actuators: Actuators, register: Register) -> u8 {
    VALVES
        .iter()
        .chain(INDEPENDENT.iter())
        .filter(|m| m.register == register && actuators.intersects(m.actuator))
        .fold(0, |acc, m| acc | m.mask)
}

/// Physical valve bits selected by `actuators`.
pub fn valve_mask(actuators: Actuators) -> u8 {
    physical_mask(actuators, Register::MidVoltage)
}

/// Independent actuators selected by `actuators`, in table order.
pub fn independent(actuators: Actuators) -> impl Iterator<Item = &'static BitMapping> {
    INDEPENDENT
        .iter()
        .filter(move |m| actuators.intersects(m.actuator))
}

// ---------------------------------------------------------------------------
// Pure register logic
// ---------------------------------------------------------------------------

/// Engage (clear) or release (set) `mask` in an active-low register value.
pub const fn apply_bits(current: u8, mask: u8, engage: bool) -> u8 {
    if engage { current & !mask } else { current | mask }
}

/// True when every valve in the mid-voltage value is closed, i.e. there
/// is no open outlet for the pump to push into.
pub const fn is_full_valve_lockout(mid: u8) -> bool {
    mid & VALVE_MASK == VALVE_MASK
}
