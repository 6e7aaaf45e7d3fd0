//! Lifecycle event port for UI, notification and automation consumers.
//!
//! Sessions emit events instead of exposing observable mutation;
//! consumers read the timeline, never write it.

use crate::chat::domain::{ConversationId, MessageId};
use serde::{Deserialize, Serialize};

/// A conversation lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum SessionEvent {
    /// A new record was appended to the timeline.
    MessageAppended {
        /// The owning conversation.
        conversation_id: ConversationId,
        /// The appended record.
        message_id: MessageId,
    },
    /// An existing record was updated in place (dedup merge, correction,
    /// acknowledgment, upload transition).
    MessageUpdated {
        /// The owning conversation.
        conversation_id: ConversationId,
        /// The updated record.
        message_id: MessageId,
    },
    /// An ephemeral record reached its purge deadline and was removed.
    MessageExpired {
        /// The owning conversation.
        conversation_id: ConversationId,
        /// The removed record.
        message_id: MessageId,
    },
    /// The session's history was cleared (close or reconnection).
    SessionReset {
        /// The reset conversation.
        conversation_id: ConversationId,
    },
    /// The unread counter changed.
    UnreadCountChanged {
        /// The owning conversation.
        conversation_id: ConversationId,
        /// The new unread count.
        count: u32,
    },
}

/// Port for receiving lifecycle events.
pub trait EventSink: Send + Sync {
    /// Delivers one event. Must not block.
    fn emit(&self, event: SessionEvent);
}
