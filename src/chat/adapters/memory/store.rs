//! In-memory conversation store.

use crate::chat::domain::{ConversationId, MessageRecord};
use crate::chat::ports::storage::{ConversationStore, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Conversation store backed by a process-local map.
///
/// Thread-safe via internal locking. Suitable for unit tests only;
/// nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct InMemoryConversationStore {
    snapshots: Arc<RwLock<HashMap<ConversationId, Vec<MessageRecord>>>>,
}

impl InMemoryConversationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many conversations hold a snapshot.
    #[must_use]
    pub fn conversation_count(&self) -> usize {
        self.snapshots.read().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn persist(
        &self,
        conversation_id: &ConversationId,
        records: &[MessageRecord],
    ) -> StoreResult<()> {
        let mut guard = self
            .snapshots
            .write()
            .map_err(|_| StoreError::serialisation("store lock poisoned"))?;
        guard.insert(conversation_id.clone(), records.to_vec());
        Ok(())
    }

    async fn fetch(&self, conversation_id: &ConversationId) -> StoreResult<Vec<MessageRecord>> {
        let guard = self
            .snapshots
            .read()
            .map_err(|_| StoreError::serialisation("store lock poisoned"))?;
        Ok(guard.get(conversation_id).cloned().unwrap_or_default())
    }

    async fn clear(&self, conversation_id: &ConversationId) -> StoreResult<()> {
        let mut guard = self
            .snapshots
            .write()
            .map_err(|_| StoreError::serialisation("store lock poisoned"))?;
        guard.remove(conversation_id);
        Ok(())
    }
}
