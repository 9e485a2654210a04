//! Raw GPIO input through the sysfs interface.
//!
//! ```text
//!   <root>/export              ← line number
//!   <root>/gpio<N>/direction   ← "in"
//!   <root>/gpio<N>/edge        ← "both"
//!   <root>/gpio<N>/value       → "0" | "1"   (poll(POLLPRI) wakes on edge)
//! ```
//!
//! The root is configurable so the driver can run against a directory of
//! plain files in tests.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin};
use log::{debug, warn};

use crate::error::{IoError, errno_of};

pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// One exported GPIO line configured as an edge-triggering input.
pub struct SysfsGpio {
    line: u32,
    value: File,
}

impl SysfsGpio {
    /// Export `line` under `root` and configure it as an input that
    /// signals both edges.
    pub fn input(root: impl AsRef<Path>, line: u32) -> Result<Self, IoError> {
        let root = root.as_ref();
        let dir = line_dir(root, line);

        if !dir.exists() {
            write_attr(&root.join("export"), &line.to_string())?;
            debug!("gpio{line}: exported");
        }
        write_attr(&dir.join("direction"), "in")?;
        if let Err(e) = write_attr(&dir.join("edge"), "both") {
            // Lines without interrupt support still read fine; edges
            // just degrade to the poll timeout.
            warn!("gpio{line}: edge setup failed: {e}");
        }

        let value = File::open(dir.join("value")).map_err(|e| IoError::Open(errno_of(&e)))?;
        Ok(Self { line, value })
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    /// Current level; `true` means high.
    pub fn read_level(&mut self) -> Result<bool, IoError> {
        self.value
            .seek(SeekFrom::Start(0))
            .map_err(|e| IoError::Read(errno_of(&e)))?;
        let mut buf = [0u8; 2];
        match self.value.read(&mut buf) {
            Ok(0) => Err(IoError::ReadShort),
            Ok(_) => parse_level(buf[0]),
            Err(e) => Err(IoError::Read(errno_of(&e))),
        }
    }

    /// Block until the line signals an edge or `timeout` passes.
    /// Returns `true` if an edge was signalled.
    pub fn wait_for_edge(&mut self, timeout: Duration) -> Result<bool, IoError> {
        let mut fds = libc::pollfd {
            fd: self.value.as_raw_fd(),
            events: libc::POLLPRI | libc::POLLERR,
            revents: 0,
        };
        let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

        // SAFETY: `fds` is a valid pollfd for one descriptor owned by
        // `self.value`, which outlives the call.
        let rc = unsafe { libc::poll(&raw mut fds, 1, timeout_ms) };
        if rc < 0 {
            let e = std::io::Error::last_os_error();
            return Err(IoError::Read(errno_of(&e)));
        }
        Ok(rc > 0 && fds.revents & libc::POLLPRI != 0)
    }
}

fn line_dir(root: &Path, line: u32) -> PathBuf {
    root.join(format!("gpio{line}"))
}

fn write_attr(path: &Path, value: &str) -> Result<(), IoError> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| IoError::Open(errno_of(&e)))?;
    std::io::Write::write_all(&mut file, value.as_bytes()).map_err(|e| IoError::Write(errno_of(&e)))
}

fn parse_level(byte: u8) -> Result<bool, IoError> {
    match byte {
        b'0' => Ok(false),
        b'1' => Ok(true),
        _ => Err(IoError::Read(libc::EINVAL)),
    }
}

impl digital::Error for IoError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl ErrorType for SysfsGpio {
    type Error = IoError;
}

impl InputPin for SysfsGpio {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.read_level()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.read_level().map(|high| !high)
    }
}

/// Create the files a kernel would create for `line` under `root`.
#[doc(hidden)]
pub fn fake_sysfs_line(root: &Path, line: u32, level: bool) -> std::io::Result<()> {
    let dir = line_dir(root, line);
    fs::create_dir_all(&dir)?;
    fs::write(root.join("export"), "")?;
    fs::write(dir.join("direction"), "")?;
    fs::write(dir.join("edge"), "")?;
    fs::write(dir.join("value"), if level { "1\n" } else { "0\n" })
}
