//! Recording in-memory transport.

use crate::chat::domain::OutboundStanza;
use crate::chat::ports::transport::{Transport, TransportError, TransportResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Transport that records every dispatched stanza.
///
/// Thread-safe via internal locking. Suitable for unit tests only. A
/// scripted failure, once armed, rejects every subsequent send.
#[derive(Debug, Default, Clone)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<OutboundStanza>>>,
    failure: Arc<Mutex<Option<TransportError>>>,
}

impl RecordingTransport {
    /// Creates a transport that accepts every send.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a failure returned by every subsequent send.
    pub fn fail_with(&self, error: TransportError) {
        if let Ok(mut guard) = self.failure.lock() {
            *guard = Some(error);
        }
    }

    /// Clears a previously armed failure.
    pub fn succeed(&self) {
        if let Ok(mut guard) = self.failure.lock() {
            *guard = None;
        }
    }

    /// Returns a copy of every stanza dispatched so far.
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundStanza> {
        self.sent.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Returns how many stanzas were dispatched.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, stanza: OutboundStanza) -> TransportResult<()> {
        if let Ok(guard) = self.failure.lock()
            && let Some(error) = guard.clone()
        {
            return Err(error);
        }
        if let Ok(mut guard) = self.sent.lock() {
            guard.push(stanza);
        }
        Ok(())
    }
}
