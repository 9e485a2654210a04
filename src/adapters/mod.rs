//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter | Implements | Connects to                         |
//! |---------|------------|-------------------------------------|
//! | `stdio` | Transport  | line protocol on stdin / stdout     |
//!
//! The actuator port is implemented directly by
//! [`GpioExpander`](crate::gpioex::GpioExpander).

pub mod stdio;
