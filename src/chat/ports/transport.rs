//! Transport port for dispatching outbound stanzas.
//!
//! The engine never opens connections; it hands fully built
//! [`OutboundStanza`]s to this port and converts failures into visible
//! error records rather than propagating them.

use crate::chat::domain::OutboundStanza;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur when dispatching a stanza.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The remote end rejected the stanza.
    #[error("send rejected: {0}")]
    Rejected(String),

    /// The connection is gone; the stanza was not dispatched.
    #[error("connection lost: {0}")]
    ConnectionLost(String),
}

impl TransportError {
    /// Creates a rejection error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Creates a connection-lost error.
    #[must_use]
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost(message.into())
    }
}

/// Port for stanza dispatch.
///
/// Timeout and cancellation policy live behind this port; the engine
/// only sees a resolved or rejected send.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Dispatches one outbound stanza.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the stanza could not be handed to
    /// the network.
    async fn send(&self, stanza: OutboundStanza) -> TransportResult<()>;
}
