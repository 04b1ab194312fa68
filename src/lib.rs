//! Click-Sentinel - detection of auto-clicker and injected mouse input
//!
//! This library provides components for:
//! - A time-bounded window of recent left clicks
//! - Timing classification (clicks closer together than a human can manage)
//! - Injection classification (events the OS flags as synthesized)
//! - A monitor facade that ties both detectors to a reporting sink
//! - A platform shim that feeds OS mouse events into the monitor

pub mod config;
pub mod event;
pub mod event_window;
pub mod injection;
pub mod monitor;
pub mod report;
pub mod timing;

#[cfg(not(windows))]
pub mod input_listener;
#[cfg(windows)]
pub mod windows_hook;

pub use config::Config;
pub use event::{ButtonFlags, ClickEvent, DeviceKind, InjectionFlags, RawMouseEvent};
pub use event_window::EventWindow;
pub use injection::InjectionClassifier;
pub use monitor::{Monitor, MonitorState, MonitorStats, Registration, Verdict};
pub use report::{Detection, ReportSink, TracingSink};
pub use timing::TimingClassifier;

use thiserror::Error;

/// Main error type for Click-Sentinel
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Failed to register raw input device: {0}")]
    RawInputRegistration(String),

    #[error("Failed to install low-level mouse hook: {0}")]
    HookRegistration(String),

    #[error("Failed to create message window: {0}")]
    WindowCreation(String),

    #[error("Failed to read event data: {0}")]
    EventData(String),

    #[error("Failed to allocate {0} bytes for event data")]
    Allocation(usize),

    #[error("Failed to access input devices: {0}")]
    InputAccess(String),

    #[error("Invalid monitor transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: MonitorState,
        to: MonitorState,
    },

    #[error("Channel error: {0}")]
    Channel(String),
}
