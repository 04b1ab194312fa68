//! Click-Sentinel - flags auto-clicker timing and injected mouse input
//!
//! Watches global mouse input and reports two conditions: left clicks that
//! follow each other faster than a human can click, and mouse events the OS
//! marks as injected by software. Injected events are blocked by default.

use click_sentinel::{Config, Monitor, MonitorError, TracingSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), MonitorError> {
    let config = Config::default();

    // Initialize logging
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .init();

    info!("Click-Sentinel starting...");
    info!(
        "Config: retention={:?}, min interval={:?}, block injected={}",
        config.retention, config.min_click_interval, config.block_injected
    );

    // Set up Ctrl+C handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    #[cfg(windows)]
    let shutdown = click_sentinel::windows_hook::ShutdownHandle::for_current_thread();

    let handler = ctrlc::set_handler(move || {
        info!("Shutdown signal received");
        running_clone.store(false, Ordering::SeqCst);
        #[cfg(windows)]
        shutdown.request();
    });
    if let Err(e) = handler {
        // Still run; the process can only be stopped by killing it.
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let monitor = Monitor::new(&config, Box::new(TracingSink));

    info!("Press Ctrl+C to exit");

    #[cfg(windows)]
    let stats = click_sentinel::windows_hook::run(monitor, running)?;
    #[cfg(not(windows))]
    let stats = click_sentinel::input_listener::run(monitor, running)?;

    info!(
        "Click-Sentinel shutting down ({} suspicious patterns, {} injected events)",
        stats.suspicious_patterns, stats.injected_seen
    );

    Ok(())
}
