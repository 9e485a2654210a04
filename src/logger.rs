//! stderr backend for the `log` facade.
//!
//! The maximum level is passed in by `main` (from the command line or the
//! config file) instead of living in a mutable global.

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

pub fn init(max_level: LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(Logger { max_level }))?;
    log::set_max_level(max_level);
    Ok(())
}

#[derive(Debug)]
struct Logger {
    max_level: LevelFilter,
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        static LEVEL_STRS: [&str; 5] = ["[x]", "[!]", "[i]", "[?]", "[.]"];
        let level = LEVEL_STRS[record.level() as usize - 1];
        // stderr keeps stdout free for the stdio transport.
        let _ = writeln!(
            std::io::stderr().lock(),
            "{level} {}: {}",
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
