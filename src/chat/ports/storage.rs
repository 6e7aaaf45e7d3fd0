//! Conversation storage port.
//!
//! An abstract ordered keyed store: the engine persists and restores
//! record snapshots per conversation and assumes nothing about the
//! durability technology behind the port.

use crate::chat::domain::{ConversationId, MessageRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during persistence.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backing store failed.
    #[error("storage error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),

    /// A record snapshot could not be serialised or deserialised.
    #[error("serialisation error: {0}")]
    Serialisation(String),
}

impl StoreError {
    /// Creates a backend error from any error type.
    #[must_use]
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }

    /// Creates a serialisation error.
    #[must_use]
    pub fn serialisation(message: impl Into<String>) -> Self {
        Self::Serialisation(message.into())
    }
}

/// Port for conversation history persistence.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Replaces the stored snapshot for a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the snapshot could not be written.
    async fn persist(
        &self,
        conversation_id: &ConversationId,
        records: &[MessageRecord],
    ) -> StoreResult<()>;

    /// Fetches the stored snapshot for a conversation, oldest first.
    ///
    /// Returns an empty vector for unknown conversations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the snapshot could not be read.
    async fn fetch(&self, conversation_id: &ConversationId) -> StoreResult<Vec<MessageRecord>>;

    /// Drops the stored snapshot for a conversation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the snapshot could not be removed.
    async fn clear(&self, conversation_id: &ConversationId) -> StoreResult<()>;
}
