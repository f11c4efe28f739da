//! `bankai-bench` - runs the benchmark monitor until Ctrl+C / SIGTERM.

use anyhow::Context;
use bankai_bench::config::MonitorConfig;
use bankai_bench::monitor::{listen_for_interrupt, stop_channel, Monitor};
use bankai_bench::observability;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    observability::init().context("failed to initialize logging")?;

    let config = MonitorConfig::load().context("failed to load configuration")?;
    let monitor = Monitor::from_config(&config).context("failed to build monitor")?;

    let (handle, signal) = stop_channel();
    let _listener = listen_for_interrupt(handle);

    monitor.run(signal).await;
    Ok(())
}
