//! Static in-memory capability discovery.

use crate::chat::domain::Address;
use crate::chat::ports::capability::{CapabilityDiscovery, ServiceItem};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Capability discovery backed by fixed feature and item tables.
///
/// Thread-safe via internal locking. Suitable for unit tests only;
/// every query resolves immediately from the tables.
#[derive(Debug, Default, Clone)]
pub struct StaticCapabilityDiscovery {
    features: Arc<RwLock<HashSet<(String, String)>>>,
    items: Arc<RwLock<HashMap<(String, String), Vec<ServiceItem>>>>,
}

impl StaticCapabilityDiscovery {
    /// Creates a discovery service that advertises nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `address` advertises the feature `namespace`.
    pub fn advertise_feature(&self, namespace: &str, address: &Address) {
        if let Ok(mut guard) = self.features.write() {
            guard.insert((namespace.to_owned(), address.as_str().to_owned()));
        }
    }

    /// Declares the items `address` advertises for `namespace`.
    pub fn advertise_items(&self, namespace: &str, address: &Address, items: Vec<ServiceItem>) {
        if let Ok(mut guard) = self.items.write() {
            guard.insert((namespace.to_owned(), address.as_str().to_owned()), items);
        }
    }
}

#[async_trait]
impl CapabilityDiscovery for StaticCapabilityDiscovery {
    async fn supports_feature(&self, namespace: &str, address: &Address) -> bool {
        self.features.read().is_ok_and(|guard| {
            guard.contains(&(namespace.to_owned(), address.as_str().to_owned()))
        })
    }

    async fn discover_items(&self, namespace: &str, address: &Address) -> Vec<ServiceItem> {
        self.items
            .read()
            .ok()
            .and_then(|guard| {
                guard
                    .get(&(namespace.to_owned(), address.as_str().to_owned()))
                    .cloned()
            })
            .unwrap_or_default()
    }
}
