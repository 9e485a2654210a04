//! Unified error types for gardenctl.
//!
//! Every subsystem has its own small error enum; all of them convert into
//! the crate-wide [`Error`] so module hooks and the registry can handle
//! failures uniformly.  The hardware-facing variants are `Copy` and carry
//! the raw OS errno rather than a `std::io::Error`, so they can be compared
//! in tests and passed around under the actuator lock without allocation.

use core::fmt;

use crate::gpioex::bank::Register;

/// Fallback errno when the OS did not report one (short transfers).
pub const EIO: i32 = libc::EIO;

/// Extract the errno from a `std::io::Error`, defaulting to `EIO`.
pub(crate) fn errno_of(e: &std::io::Error) -> i32 {
    e.raw_os_error().unwrap_or(EIO)
}

// ---------------------------------------------------------------------------
// I2C / file I/O errors
// ---------------------------------------------------------------------------

/// Failure of a single register or sysfs access, tagged by the failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// The bus device (or sysfs file) could not be opened.
    Open(i32),
    /// Binding the slave address failed.
    AddressSelect(i32),
    /// The write failed or was short (`EIO`).
    Write(i32),
    /// The read returned zero bytes: no data.
    ReadShort,
    /// The read failed.
    Read(i32),
}

impl IoError {
    /// Open and address-select failures leave no partial hardware state
    /// behind; a caller may retry them.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Open(_) | Self::AddressSelect(_))
    }

    /// The errno behind this failure, if any.
    pub const fn errno(self) -> Option<i32> {
        match self {
            Self::Open(e) | Self::AddressSelect(e) | Self::Write(e) | Self::Read(e) => Some(e),
            Self::ReadShort => None,
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(e) => write!(f, "open failed (errno {e})"),
            Self::AddressSelect(e) => write!(f, "slave address select failed (errno {e})"),
            Self::Write(e) => write!(f, "write failed (errno {e})"),
            Self::ReadShort => write!(f, "no data"),
            Self::Read(e) => write!(f, "read failed (errno {e})"),
        }
    }
}

impl std::error::Error for IoError {}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// `set` was called before a successful `init`.
    NotInitialized,
    /// A register access failed; hardware holds whatever was last written.
    Io { register: Register, error: IoError },
}

impl ActuatorError {
    pub(crate) fn io(register: Register) -> impl Fn(IoError) -> Self {
        move |error| Self::Io { register, error }
    }
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "actuator bank not initialised"),
            Self::Io { register, error } => write!(f, "{register}: {error}"),
        }
    }
}

impl std::error::Error for ActuatorError {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Barrel level byte is not one of the nine monotonic patterns.
    InvalidPattern(u8),
    /// The sensor file could not be read.
    Read(i32),
    /// The sensor file did not contain an integer.
    Parse,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern(raw) => write!(f, "sensor fault: invalid level pattern 0x{raw:02X}"),
            Self::Read(e) => write!(f, "sensor read failed (errno {e})"),
            Self::Parse => write!(f, "sensor value not numeric"),
        }
    }
}

impl std::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Payload / transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// Payload is not valid for the topic it arrived on.
    Invalid(String),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(p) => write!(f, "invalid payload {p:?}"),
        }
    }
}

impl std::error::Error for PayloadError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    SubscribeFailed(String),
    PublishFailed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscribeFailed(topic) => write!(f, "subscribe {topic} failed"),
            Self::PublishFailed(topic) => write!(f, "publish {topic} failed"),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible module hook funnels into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Actuator(ActuatorError),
    Sensor(SensorError),
    Io(IoError),
    Payload(PayloadError),
    Transport(TransportError),
    /// A module or worker could not be started.
    Init(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Payload(e) => write!(f, "payload: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Self::Io(e)
    }
}

impl From<PayloadError> for Error {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
