//! Service layer orchestrating sessions over the domain and the ports.

mod acks;
mod correction;
mod dedup;
mod registry;
mod session;

pub use acks::{AcknowledgmentTracker, MarkerOutcome};
pub use correction::CorrectionEngine;
pub use dedup::Deduplicator;
pub use registry::SessionRegistry;
pub use session::{ConversationSession, IngestFlags, IngestOutcome};

use crate::chat::config::ChatConfig;
use crate::chat::domain::Address;
use crate::chat::ports::{
    CapabilityDiscovery, ContactDirectory, ConversationStore, EventSink, FileUploader, Transport,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;

/// Shared collaborators every session operates with.
///
/// Cloning is cheap: all collaborators sit behind [`Arc`]s.
#[derive(Clone)]
pub struct ChatContext {
    /// Full address of the local account.
    pub account: Address,
    /// Behaviour toggles.
    pub config: ChatConfig,
    /// Stanza dispatch.
    pub transport: Arc<dyn Transport>,
    /// Roster lookups.
    pub directory: Arc<dyn ContactDirectory>,
    /// Service discovery.
    pub capabilities: Arc<dyn CapabilityDiscovery>,
    /// History persistence.
    pub store: Arc<dyn ConversationStore>,
    /// Lifecycle event delivery.
    pub events: Arc<dyn EventSink>,
    /// Attachment slot negotiation and transfer.
    pub uploader: Arc<dyn FileUploader>,
    /// Time source.
    pub clock: Arc<dyn Clock + Send + Sync>,
}

impl ChatContext {
    /// Returns the current instant from the context's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }
}
