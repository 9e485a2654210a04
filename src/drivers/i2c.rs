//! Single-byte I2C register access through `/dev/i2c-N`.
//!
//! Every call opens the bus device, binds the slave address with
//! `ioctl(I2C_SLAVE)`, transfers exactly one byte, and closes the device
//! again when the `File` drops.  No handle is cached: the bus is shared
//! and can only talk to one address at a time.  No retries either; the
//! failing step is reported in the [`IoError`] variant and the caller
//! decides what to do about it.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;

use log::trace;

use crate::error::{EIO, IoError, errno_of};

/// `linux/i2c-dev.h`: use this slave address.
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// Register-level access to the devices on one bus.
///
/// The actuator layer is generic over this so it can be driven against a
/// recording mock on the host.
pub trait RegisterBus: Send {
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), IoError>;

    fn read_register(&mut self, address: u8) -> Result<u8, IoError>;
}

/// The real bus: `/dev/i2c-<bus>`.
#[derive(Debug, Clone, Copy)]
pub struct LinuxI2c {
    bus: u8,
}

impl LinuxI2c {
    pub fn new(bus: u8) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> u8 {
        self.bus
    }
}

impl RegisterBus for LinuxI2c {
    fn write_register(&mut self, address: u8, value: u8) -> Result<(), IoError> {
        write_register(self.bus, address, value)
    }

    fn read_register(&mut self, address: u8) -> Result<u8, IoError> {
        read_register(self.bus, address)
    }
}

fn device_path(bus: u8) -> String {
    format!("/dev/i2c-{bus}")
}

fn open_slave(bus: u8, address: u8) -> Result<File, IoError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(device_path(bus))
        .map_err(|e| IoError::Open(errno_of(&e)))?;

    // SAFETY: `file` owns a valid open descriptor for the duration of the
    // call and I2C_SLAVE takes the address by value.
    let rc = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            I2C_SLAVE as _,
            libc::c_ulong::from(address),
        )
    };
    if rc < 0 {
        let e = std::io::Error::last_os_error();
        return Err(IoError::AddressSelect(errno_of(&e)));
    }

    Ok(file)
}

/// Write one byte to the device at `address` on `bus`.
pub fn write_register(bus: u8, address: u8, value: u8) -> Result<(), IoError> {
    let mut file = open_slave(bus, address)?;
    match file.write(&[value]) {
        Ok(1) => {
            trace!("i2c-{bus} 0x{address:02X} <- 0x{value:02X}");
            Ok(())
        }
        Ok(_) => Err(IoError::Write(EIO)),
        Err(e) => Err(IoError::Write(errno_of(&e))),
    }
}

/// Read one byte from the device at `address` on `bus`.
pub fn read_register(bus: u8, address: u8) -> Result<u8, IoError> {
    let mut file = open_slave(bus, address)?;
    let mut buf = [0u8; 1];
    match file.read(&mut buf) {
        Ok(0) => Err(IoError::ReadShort),
        Ok(_) => {
            trace!("i2c-{bus} 0x{address:02X} -> 0x{:02X}", buf[0]);
            Ok(buf[0])
        }
        Err(e) => Err(IoError::Read(errno_of(&e))),
    }
}
