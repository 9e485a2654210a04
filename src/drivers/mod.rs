//! Linux hardware access: I2C register transfers and sysfs GPIO lines.

pub mod gpio;
pub mod i2c;
