//! Time-bounded buffer of recent clicks

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::event::ClickEvent;

/// Clicks seen within the retention horizon, oldest first
#[derive(Debug, Clone)]
pub struct EventWindow {
    events: VecDeque<ClickEvent>,
    horizon: Duration,
}

impl EventWindow {
    /// Create an empty window that keeps clicks for `horizon`
    pub fn new(horizon: Duration) -> Self {
        Self {
            events: VecDeque::new(),
            horizon,
        }
    }

    /// Append a click and drop everything older than the horizon
    /// relative to the click's own timestamp.
    pub fn record(&mut self, event: ClickEvent) {
        let now = event.timestamp;
        self.events.push_back(event);
        self.prune(now);
    }

    /// Remove every click with `timestamp < now - horizon`.
    pub fn prune(&mut self, now: Instant) {
        // An instant closer to the clock origin than the horizon has nothing stale.
        let Some(cutoff) = now.checked_sub(self.horizon) else {
            return;
        };
        self.events.retain(|e| e.timestamp >= cutoff);
    }

    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clicks in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &ClickEvent> + '_ {
        self.events.iter()
    }

    pub fn latest(&self) -> Option<&ClickEvent> {
        self.events.back()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Default for EventWindow {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}
