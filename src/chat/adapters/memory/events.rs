//! Recording in-memory event sink.

use crate::chat::ports::events::{EventSink, SessionEvent};
use std::sync::{Arc, Mutex};

/// Event sink that records every emitted event.
///
/// Thread-safe via internal locking. Suitable for unit tests only.
#[derive(Debug, Default, Clone)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl RecordingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event emitted so far.
    #[must_use]
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Discards all recorded events.
    pub fn drain(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.clear();
        }
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: SessionEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
