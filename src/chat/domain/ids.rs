//! Domain identifier newtypes for messages and conversations.
//!
//! Message identifiers are opaque protocol strings: peers assign origin
//! ids and archives assign stable ids, so unlike database keys they are
//! not UUIDs by construction. Locally generated identifiers use UUID v4.

use super::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier for a message.
///
/// Used for the record's stable `id`, for client-assigned origin ids,
/// for archive-assigned stable ids and for the protocol-level delivery
/// id that receipts, markers and corrections reference.
///
/// # Examples
///
/// ```
/// use palaver::chat::domain::MessageId;
///
/// let id = MessageId::new("o1");
/// assert_eq!(id.as_str(), "o1");
/// assert_ne!(MessageId::generate(), MessageId::generate());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Creates a message identifier from a protocol-supplied string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh, locally unique message identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for MessageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier for a conversation: the lowercased bare address of the
/// peer (contact or room).
///
/// # Examples
///
/// ```
/// use palaver::chat::domain::{Address, ConversationId};
///
/// let peer = Address::new("Alice@Example.org/phone").expect("valid address");
/// let id = ConversationId::from_address(&peer);
/// assert_eq!(id.as_str(), "alice@example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Creates a conversation identifier from a peer address,
    /// normalising to the lowercased bare form.
    #[must_use]
    pub fn from_address(address: &Address) -> Self {
        Self(address.bare().as_str().to_lowercase())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
