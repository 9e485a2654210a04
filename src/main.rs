//! gardenctl daemon: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  stdin ──▶ StdioTransport ──▶ ModuleRegistry ──▶ modules     │
//! │                  ▲                                  │        │
//! │  stdout ◀────────┘                                  ▼        │
//! │                                     GpioExpander<LinuxI2c>   │
//! │                                     (one lock, /dev/i2c-N)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Startup order: config, logger, relay bank init (must succeed), signal
//! mask, module init and subscriptions, then the event loop.  The daemon
//! keeps running after stdin closes and stops on SIGINT or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use gardenctl::adapters::stdio::StdioTransport;
use gardenctl::app::context::GardenContext;
use gardenctl::app::registry::ModuleRegistry;
use gardenctl::config::SystemConfig;
use gardenctl::daemon::{self, TerminationSignals};
use gardenctl::drivers::i2c::LinuxI2c;
use gardenctl::gpioex::GpioExpander;
use gardenctl::logger;

/// Garden automation controller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<LevelFilter>,

    /// I2C bus index; overrides the config file
    #[arg(long)]
    bus: Option<u8>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SystemConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SystemConfig::default(),
    };
    if let Some(bus) = args.bus {
        config.i2c_bus = bus;
    }

    let level = match args.log_level {
        Some(level) => level,
        None => config.log_level.parse::<LevelFilter>().context("log_level")?,
    };
    logger::init(level).context("installing logger")?;
    info!("gardenctl {} starting", env!("CARGO_PKG_VERSION"));

    let expander = Arc::new(GpioExpander::new(LinuxI2c::new(config.i2c_bus)));
    expander
        .init()
        .with_context(|| format!("releasing relay banks on i2c-{}", config.i2c_bus))?;

    // Before any worker thread exists, so every thread inherits the mask.
    let signals = TerminationSignals::block().context("blocking termination signals")?;

    let transport = Arc::new(StdioTransport::new());
    let mut registry = ModuleRegistry::from_config(&config.modules);
    let ctx = GardenContext::new(config, expander, transport.clone());

    if let Err(e) = registry.init_all(&ctx).and_then(|()| registry.subscribe_all()) {
        registry.shutdown();
        return Err(e).context("starting modules");
    }
    info!("modules: {:?}", registry.names());

    let (tx, rx) = flume::unbounded();
    signals.listen(tx.clone()).context("starting signal listener")?;
    daemon::spawn_line_reader(std::io::stdin(), tx).context("starting input reader")?;

    daemon::run(&mut registry, &rx, |topic| transport.is_subscribed(topic));

    registry.shutdown();
    info!("gardenctl stopped");
    Ok(())
}
