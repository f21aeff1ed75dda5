//! # SpiderBot
//!
//! Teleoperation console for a walking robot driven over a serial link:
//! - Port discovery and a managed serial connection
//! - Live distance telemetry parsed from the robot's text protocol
//! - RGB and thermal frames relayed from the capture pipeline
//! - Motion commands and snapshots
//!
//! ## Architecture
//!
//! The console is organized as a workspace with multiple crates:
//!
//! 1. **spiderbot-core** - Errors, telemetry store, frame relay, console log, snapshots
//! 2. **spiderbot-communication** - Serial transport, link manager, reader loop, line protocol
//! 3. **spiderbot-settings** - Configuration loading and persistence
//! 4. **spiderbot** - Poll cycle, operator console and the binary

pub mod console;
pub mod poll;

pub use console::{Console, EchoSink, Flow, OperatorCommand};
pub use poll::{PollCycle, PollSnapshot};

pub use spiderbot_communication::{
    list_ports, BaudRate, ConnectionParams, ConnectionState, LinkManager, MotionCommand,
    SerialPortInfo,
};

pub use spiderbot_core::{
    ConnectionError, Error, Frame, FrameKind, FrameRelay, LogSink, MessageLog, OverflowPolicy,
    Result, SnapshotWriter, TelemetryStore,
};

pub use spiderbot_settings::{Config, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr so it does not interleave with console replies
/// - RUST_LOG environment variable support
/// - INFO as the default level
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.to_string()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
