//! Temperature Monitor Binary
//!
//! Tails the sensor's port file, keeps hourly and daily averages, and prunes
//! the three logs to their retention windows.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin tempflow -- [SOURCE_PATH] [--log-dir DIR] [--once]
//! ```
//!
//! ## Environment Variables
//!
//! - TEMPFLOW_SOURCE_PATH - Source file to tail (default: virtual_port.txt)
//! - TEMPFLOW_LOG_DIR - Directory for the three logs (default: .)
//! - TEMPFLOW_POLL_INTERVAL_SECS - Seconds between cycles (default: 10)
//! - TEMPFLOW_HOURLY_CHECK_SECS - Hourly flush interval (default: 3600)
//! - TEMPFLOW_DAILY_CHECK_SECS - Daily flush interval (default: 82800)
//! - TEMPFLOW_CURSOR_STATE_PATH - Persist the read cursor here (optional)
//! - RUST_LOG - Logging level (optional, default: info)

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tempflow::monitor_core::Monitor;
use tempflow::{MonitorConfig, SystemClock};

#[derive(Parser, Debug)]
#[command(name = "tempflow", about = "Telemetry aggregation daemon for a single metric stream")]
struct Args {
    /// Source file to tail (overrides TEMPFLOW_SOURCE_PATH)
    source_path: Option<PathBuf>,

    /// Directory for the measurement and average logs
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let args = Args::parse();

    let mut config = MonitorConfig::from_env().map_err(|e| {
        log::error!("❌ {}", e);
        e
    })?;
    if let Some(source_path) = args.source_path {
        config.source_path = source_path;
    }
    if let Some(log_dir) = args.log_dir {
        config.log_dir = log_dir;
    }

    let mut monitor = Monitor::new(config, Arc::new(SystemClock)).map_err(|e| {
        log::error!("❌ {}", e);
        e
    })?;

    let config = monitor.config();
    log::info!("🚀 Starting temperature monitor");
    log::info!("   Source: {}", config.source_path.display());
    log::info!("   Log directory: {}", config.log_dir.display());
    log::info!("   Poll interval: {}s", config.poll_interval_secs);
    log::info!("   Hourly check: {}s", config.hourly_check_secs);
    log::info!("   Daily check: {}s", config.daily_check_secs);
    if let Some(state_path) = &config.cursor_state_path {
        log::info!("   Cursor state: {} (resuming at byte {})", state_path.display(), monitor.cursor());
    }

    if args.once {
        let report = monitor.run_cycle().await;
        log::info!(
            "✅ Single cycle done: {} ingested, {} rejected, {} pruned",
            report.samples_ingested,
            report.lines_rejected,
            report.records_pruned
        );
        return Ok(());
    }

    log::info!("✅ Monitor running - watching for measurements...");
    monitor.run().await;

    Ok(())
}
