//! Reporting of detections

use std::fmt;
use std::time::Duration;
use tracing::warn;

use crate::event::InjectionFlags;

/// A condition worth reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// The OS flagged a mouse event as synthesized
    InjectedInput {
        flags: InjectionFlags,
        blocked: bool,
    },

    /// Two adjacent clicks arrived faster than the human minimum
    SuspiciousClickPattern {
        gap: Duration,
        clicks_in_window: usize,
    },
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Detection::InjectedInput { flags, blocked } => write!(
                f,
                "Emulated mouse input detected (flags={:#x}, {})",
                flags.bits(),
                if *blocked { "blocked" } else { "passed" }
            ),
            Detection::SuspiciousClickPattern {
                gap,
                clicks_in_window,
            } => write!(
                f,
                "Suspicious mouse click pattern detected ({}ms gap, {} clicks in window)",
                gap.as_millis(),
                clicks_in_window
            ),
        }
    }
}

/// Destination for detections
pub trait ReportSink {
    fn report(&mut self, detection: &Detection);
}

/// Sink that writes every detection as a warning through `tracing`
#[derive(Debug, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn report(&mut self, detection: &Detection) {
        warn!("{}", detection);
    }
}
