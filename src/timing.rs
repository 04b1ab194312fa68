//! Click timing classification
//!
//! A window is suspicious when any two adjacent clicks are closer together
//! than the minimum human interval. Gaps are compared in whole milliseconds,
//! truncated, so 19.9 ms counts as 19 ms.

use std::time::Duration;

use crate::event_window::EventWindow;

/// Flags adjacent clicks that arrive faster than a human can click
#[derive(Debug, Clone, Copy)]
pub struct TimingClassifier {
    min_interval_ms: u128,
}

impl TimingClassifier {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval_ms: min_interval.as_millis(),
        }
    }

    /// Whether any adjacent pair in the window violates the threshold
    pub fn is_suspicious(&self, window: &EventWindow) -> bool {
        self.first_violation(window).is_some()
    }

    /// Gap of the oldest adjacent pair that violates the threshold.
    ///
    /// Returns `None` for windows with fewer than two clicks.
    pub fn first_violation(&self, window: &EventWindow) -> Option<Duration> {
        if window.len() < 2 {
            return None;
        }

        window
            .iter()
            .zip(window.iter().skip(1))
            .map(|(prev, next)| next.timestamp.saturating_duration_since(prev.timestamp))
            .find(|gap| gap.as_millis() < self.min_interval_ms)
    }
}

impl Default for TimingClassifier {
    fn default() -> Self {
        Self::new(Duration::from_millis(20))
    }
}
