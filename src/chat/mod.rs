//! Canonical conversation state for the Palaver engine.
//!
//! This module implements the per-conversation message state machine: the
//! ingestion pipeline that turns inbound stanzas into a deduplicated,
//! chronologically ordered history, and the send paths that turn user
//! intent into outbound stanzas.
//!
//! # Architecture
//!
//! The module follows hexagonal architecture principles:
//!
//! - **Domain**: Pure domain types ([`domain::MessageRecord`],
//!   [`domain::StanzaView`], [`domain::Timeline`], etc.)
//! - **Ports**: Abstract trait interfaces ([`ports::Transport`],
//!   [`ports::CapabilityDiscovery`], [`ports::ConversationStore`], ...)
//! - **Adapters**: Concrete implementations
//!   ([`adapters::memory::InMemoryConversationStore`], ...)
//! - **Services**: The engines that enforce the conversation invariants
//!   ([`services::Deduplicator`], [`services::CorrectionEngine`],
//!   [`services::AcknowledgmentTracker`], [`services::ConversationSession`],
//!   [`services::SessionRegistry`])

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
