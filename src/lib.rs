//! Palaver: headless chat conversation engine.
//!
//! This crate reconciles unreliable, overlapping protocol signals —
//! duplicate delivery, out-of-order delayed delivery, message correction,
//! delivery receipts and chat markers — into one canonical, deduplicated,
//! ordered message history per conversation, and turns user intent (send
//! text, correct a message, send files) into outbound stanzas.
//!
//! # Architecture
//!
//! Palaver follows hexagonal architecture principles:
//!
//! - **Domain**: Pure conversation types with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external collaborators
//!   (transport, contact directory, capability discovery, storage, uploads)
//! - **Adapters**: Concrete implementations of ports (in-memory test doubles)
//! - **Services**: The ingestion pipeline and its supporting engines
//!
//! # Modules
//!
//! - [`chat`]: the per-conversation message state machine

pub mod chat;
