//! DriveWatch — removable drive watcher.
//!
//! Thin binary entry point. All logic lives in the `drivewatch-core` crate.

use anyhow::Context;
use drivewatch_core::config::Config;
use drivewatch_core::logging::{LogSink, TracingSink};
use drivewatch_core::monitor::{self, StopSignal};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("DriveWatch v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load().context("failed to load configuration")?;
    let sink: Arc<dyn LogSink> = Arc::new(TracingSink);

    // Installed before the monitor starts so an early Ctrl-C still exits cleanly.
    let signal = StopSignal::new();
    let on_interrupt = signal.clone();
    ctrlc::set_handler(move || on_interrupt.stop())
        .context("failed to install Ctrl-C handler")?;

    let handle =
        monitor::launch(&config, sink, signal).context("failed to start drive monitor")?;

    if !handle.join() {
        anyhow::bail!("drive monitor thread panicked");
    }

    tracing::info!("Program terminated by user.");
    Ok(())
}
