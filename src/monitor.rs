//! Monitor facade
//!
//! Owns the event window and both classifiers. The platform shim drives it:
//! `attach` once registration has been attempted, `start` when the event
//! loop begins dispatching, the `on_*` handlers for every event, and
//! `shutdown` exactly once after the hook has been released.
//!
//! All handlers run to completion on the dispatch thread, so the monitor
//! needs no locking. It must stay on that one thread.

use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::event::{ClickEvent, InjectionFlags, RawMouseEvent};
use crate::event_window::EventWindow;
use crate::injection::InjectionClassifier;
use crate::report::{Detection, ReportSink};
use crate::timing::TimingClassifier;
use crate::MonitorError;

/// Lifecycle of the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Uninitialized,
    Hooked,
    Running,
    /// Interceptor released, no further events accepted
    Terminated,
}

/// What the shim should do with the event it just delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Block,
}

impl Verdict {
    pub fn is_block(self) -> bool {
        self == Verdict::Block
    }
}

/// Which OS event sources were attached successfully
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registration {
    /// Raw input sink delivering click packets (feeds the timing detector)
    pub raw_input: bool,
    /// Low-level interceptor delivering injection flags (feeds the injection detector)
    pub interceptor: bool,
}

impl Registration {
    pub fn full() -> Self {
        Self {
            raw_input: true,
            interceptor: true,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !(self.raw_input && self.interceptor)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub clicks_recorded: u64,
    pub suspicious_patterns: u64,
    pub injected_seen: u64,
    pub injected_blocked: u64,
    pub events_dropped: u64,
}

pub struct Monitor {
    state: MonitorState,
    registration: Registration,
    window: EventWindow,
    timing: TimingClassifier,
    injection: InjectionClassifier,
    block_injected: bool,
    sink: Box<dyn ReportSink>,
    stats: MonitorStats,
}

impl Monitor {
    pub fn new(config: &Config, sink: Box<dyn ReportSink>) -> Self {
        Self {
            state: MonitorState::Uninitialized,
            registration: Registration::default(),
            window: EventWindow::new(config.retention),
            timing: TimingClassifier::new(config.min_click_interval),
            injection: InjectionClassifier::new(),
            block_injected: config.block_injected,
            sink,
            stats: MonitorStats::default(),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn registration(&self) -> Registration {
        self.registration
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn window(&self) -> &EventWindow {
        &self.window
    }

    /// Record the outcome of source registration.
    ///
    /// Failed sources are reported but never fatal: the monitor carries on
    /// with whatever attached.
    pub fn attach(&mut self, registration: Registration) -> Result<(), MonitorError> {
        self.transition(MonitorState::Uninitialized, MonitorState::Hooked)?;
        self.registration = registration;

        if !registration.raw_input {
            error!("Raw input sink not attached - click timing detection disabled");
        }
        if !registration.interceptor {
            error!("Low-level interceptor not attached - injected input detection disabled");
        }
        if !registration.raw_input && !registration.interceptor {
            warn!("No input sources attached, monitor will see no events");
        }
        Ok(())
    }

    /// Mark the event loop as dispatching
    pub fn start(&mut self) -> Result<(), MonitorError> {
        self.transition(MonitorState::Hooked, MonitorState::Running)?;
        info!(
            "Monitor running (raw input: {}, interceptor: {})",
            self.registration.raw_input, self.registration.interceptor
        );
        Ok(())
    }

    /// Tear down after the interceptor has been released.
    ///
    /// Valid from any state except `Terminated`, so a failed startup can
    /// still be torn down.
    pub fn shutdown(&mut self) -> Result<MonitorStats, MonitorError> {
        if self.state == MonitorState::Terminated {
            return Err(MonitorError::InvalidTransition {
                from: self.state,
                to: MonitorState::Terminated,
            });
        }
        debug!("Monitor {:?} -> {:?}", self.state, MonitorState::Terminated);
        self.state = MonitorState::Terminated;
        self.window.clear();

        let stats = self.stats;
        info!(
            "Monitor stopped: {} clicks, {} suspicious patterns, {} injected ({} blocked), {} dropped",
            stats.clicks_recorded,
            stats.suspicious_patterns,
            stats.injected_seen,
            stats.injected_blocked,
            stats.events_dropped
        );
        Ok(stats)
    }

    /// Handle a raw mouse packet observed now
    pub fn on_mouse_event(&mut self, event: RawMouseEvent) -> Verdict {
        self.on_mouse_event_at(event, Instant::now())
    }

    /// Handle a raw mouse packet observed at `now`.
    ///
    /// The injection check runs first; a blocked event is never tracked.
    pub fn on_mouse_event_at(&mut self, event: RawMouseEvent, now: Instant) -> Verdict {
        if !self.accepting() {
            return Verdict::Pass;
        }

        let verdict = self.classify_injection(event.injection);
        if verdict.is_block() || !event.is_left_click() {
            return verdict;
        }

        self.window.record(ClickEvent::new(now, event.x, event.y));
        self.stats.clicks_recorded += 1;
        debug!("Click at ({}, {}), {} in window", event.x, event.y, self.window.len());

        if let Some(gap) = self.timing.first_violation(&self.window) {
            self.stats.suspicious_patterns += 1;
            self.sink.report(&Detection::SuspiciousClickPattern {
                gap,
                clicks_in_window: self.window.len(),
            });
        }

        verdict
    }

    /// Handle a low-level event carrying only injection flags.
    ///
    /// `Verdict::Block` means the shim must suppress the event.
    pub fn on_low_level_event(&mut self, flags: InjectionFlags) -> Verdict {
        if !self.accepting() {
            return Verdict::Pass;
        }
        self.classify_injection(flags)
    }

    /// Count and log an event the shim could not read
    pub fn on_event_dropped(&mut self, err: &MonitorError) {
        self.stats.events_dropped += 1;
        warn!("Dropping mouse event: {}", err);
    }

    fn classify_injection(&mut self, flags: InjectionFlags) -> Verdict {
        if !self.injection.is_injected(flags) {
            return Verdict::Pass;
        }

        self.stats.injected_seen += 1;
        if self.block_injected {
            self.stats.injected_blocked += 1;
        }
        self.sink.report(&Detection::InjectedInput {
            flags,
            blocked: self.block_injected,
        });

        if self.block_injected {
            Verdict::Block
        } else {
            Verdict::Pass
        }
    }

    fn accepting(&self) -> bool {
        if self.state == MonitorState::Running {
            return true;
        }
        debug!("Ignoring mouse event while {:?}", self.state);
        false
    }

    fn transition(&mut self, from: MonitorState, to: MonitorState) -> Result<(), MonitorError> {
        if self.state != from {
            return Err(MonitorError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!("Monitor {:?} -> {:?}", from, to);
        self.state = to;
        Ok(())
    }
}
