//! Global mouse listening using rdev
//!
//! Portable fallback for platforms without the Win32 hooks. rdev reports no
//! injection information, so only the click timing detector is fed.

use rdev::{listen, Button, Event, EventType};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::event::RawMouseEvent;
use crate::monitor::{Monitor, MonitorStats, Registration};
use crate::MonitorError;

/// Message sent from the listener thread to the monitor thread
#[derive(Debug, Clone)]
pub enum ListenerMessage {
    /// Left-button press with the time it was observed
    Click { event: RawMouseEvent, at: Instant },
    /// The listener could not start
    Failed(String),
}

/// Input listener that captures global mouse events
pub struct InputListener {
    /// Sender for click events
    sender: mpsc::Sender<ListenerMessage>,
}

impl InputListener {
    /// Create a new InputListener with the given channel sender
    pub fn new(sender: mpsc::Sender<ListenerMessage>) -> Self {
        Self { sender }
    }

    /// Start listening for input events in a background thread
    ///
    /// Left presses are forwarded with the last cursor position rdev reported.
    /// Returns a JoinHandle for the listener thread.
    pub fn start(self) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            info!("Input listener started");

            let sender = self.sender;
            let failure_sender = sender.clone();
            let mut last_position = (0i32, 0i32);

            let callback = move |event: Event| match event.event_type {
                EventType::MouseMove { x, y } => {
                    last_position = (x as i32, y as i32);
                }
                EventType::ButtonPress(Button::Left) => {
                    let (x, y) = last_position;
                    let message = ListenerMessage::Click {
                        event: RawMouseEvent::left_down(x, y),
                        at: Instant::now(),
                    };

                    if let Err(e) = sender.send(message) {
                        debug!("Failed to send click event: {}", e);
                    }
                }
                _ => {}
            };

            if let Err(e) = listen(callback) {
                error!("Error in input listener: {:?}", e);
                let _ = failure_sender.send(ListenerMessage::Failed(format!("{:?}", e)));
            }
        })
    }
}

/// Create a channel for listener messages and return both ends
pub fn create_event_channel() -> (mpsc::Sender<ListenerMessage>, mpsc::Receiver<ListenerMessage>) {
    mpsc::channel()
}

/// Drive `monitor` from the rdev listener until `running` clears.
///
/// The monitor stays on the calling thread; only messages cross threads.
pub fn run(mut monitor: Monitor, running: Arc<AtomicBool>) -> Result<MonitorStats, MonitorError> {
    let (sender, receiver) = create_event_channel();

    // The listener thread cannot be joined; it lives until the process exits.
    let _listener_handle = InputListener::new(sender).start();

    let started = monitor
        .attach(Registration {
            raw_input: true,
            interceptor: false,
        })
        .and_then(|()| monitor.start());
    if let Err(e) = started {
        let _ = monitor.shutdown();
        return Err(e);
    }

    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(ListenerMessage::Click { event, at }) => {
                monitor.on_mouse_event_at(event, at);
            }
            Ok(ListenerMessage::Failed(reason)) => {
                monitor.on_event_dropped(&MonitorError::InputAccess(reason));
                error!("Input listener failed, no events will be delivered");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // No event, continue loop
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                warn!("Input listener disconnected");
                break;
            }
        }
    }

    monitor.shutdown()
}
