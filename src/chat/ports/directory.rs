//! Contact directory port.
//!
//! Roster membership gates marker auto-replies and (configurably)
//! message admission from unknown peers. Lookup failures are
//! indistinguishable from "not a contact" at this layer.

use crate::chat::domain::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A roster entry for a known peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Bare address of the contact.
    pub address: Address,
    /// Display name, when the roster carries one.
    pub nickname: Option<String>,
}

impl Contact {
    /// Creates a contact entry.
    #[must_use]
    pub const fn new(address: Address, nickname: Option<String>) -> Self {
        Self { address, nickname }
    }
}

/// Port for roster lookups.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Looks up a peer by bare address.
    ///
    /// Returns `None` for unknown peers and on lookup failure.
    async fn lookup(&self, address: &Address) -> Option<Contact>;
}
