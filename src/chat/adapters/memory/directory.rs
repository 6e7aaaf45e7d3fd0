//! Static in-memory contact directory.

use crate::chat::domain::Address;
use crate::chat::ports::directory::{Contact, ContactDirectory};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Contact directory backed by a fixed map.
///
/// Thread-safe via internal locking. Suitable for unit tests only.
#[derive(Debug, Default, Clone)]
pub struct StaticContactDirectory {
    contacts: Arc<RwLock<HashMap<String, Contact>>>,
}

impl StaticContactDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a contact, keyed by its bare address.
    pub fn add(&self, contact: Contact) {
        if let Ok(mut guard) = self.contacts.write() {
            guard.insert(contact.address.bare().as_str().to_owned(), contact);
        }
    }

    /// Removes a contact by bare address.
    pub fn remove(&self, address: &Address) {
        if let Ok(mut guard) = self.contacts.write() {
            guard.remove(address.bare().as_str());
        }
    }
}

#[async_trait]
impl ContactDirectory for StaticContactDirectory {
    async fn lookup(&self, address: &Address) -> Option<Contact> {
        self.contacts
            .read()
            .ok()
            .and_then(|guard| guard.get(address.bare().as_str()).cloned())
    }
}
