//! Configuration management for Click-Sentinel

use std::time::Duration;

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct Config {
    /// How long a click stays in the event window
    pub retention: Duration,

    /// Adjacent clicks closer than this (in whole milliseconds) are suspicious
    pub min_click_interval: Duration,

    /// Suppress injected events instead of only reporting them
    pub block_injected: bool,

    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(10),
            min_click_interval: Duration::from_millis(20),
            block_injected: true,
            verbose: false,
        }
    }
}

impl Config {
    /// Create a new Config with a custom retention horizon
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Create a new Config with a custom minimum human click interval
    pub fn with_min_click_interval(mut self, interval: Duration) -> Self {
        self.min_click_interval = interval;
        self
    }

    /// Report injected events without blocking them
    pub fn with_block_injected(mut self, block: bool) -> Self {
        self.block_injected = block;
        self
    }

    /// Enable verbose logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_detection_thresholds() {
        let config = Config::default();
        assert_eq!(config.retention, Duration::from_secs(10));
        assert_eq!(config.min_click_interval, Duration::from_millis(20));
        assert!(config.block_injected);
        assert!(!config.verbose);
    }

    #[test]
    fn builders_override_fields() {
        let config = Config::default()
            .with_retention(Duration::from_secs(3))
            .with_min_click_interval(Duration::from_millis(35))
            .with_block_injected(false)
            .with_verbose(true);

        assert_eq!(config.retention, Duration::from_secs(3));
        assert_eq!(config.min_click_interval, Duration::from_millis(35));
        assert!(!config.block_injected);
        assert!(config.verbose);
    }
}
