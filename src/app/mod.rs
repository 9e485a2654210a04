//! Application core: module hosting and the ports modules talk through.
//!
//! Feature modules never touch hardware or the broker directly.  All
//! interaction happens through the **port traits** in [`ports`], reached via
//! the [`context::GardenContext`] the registry hands out at `init`.

pub mod context;
pub mod payload;
pub mod ports;
pub mod registry;
