//! Capability discovery port (XEP-0030 service discovery).
//!
//! Used for two negotiations: whether an archiving address implements
//! stable-id semantics (deduplication tier 2) and where the HTTP upload
//! service lives (file sends).

use crate::chat::domain::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Form field advertising the upload service's maximum file size.
pub const MAX_FILE_SIZE_FIELD: &str = "max-file-size";

/// One discovered service item with its advertised metadata form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceItem {
    /// Address of the service.
    pub address: Address,
    /// Raw metadata form fields, as advertised.
    pub metadata: BTreeMap<String, String>,
}

impl ServiceItem {
    /// Creates a service item without metadata.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a metadata field.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns the advertised maximum file size in bytes.
    ///
    /// An absent or unparsable advertisement means "no limit".
    #[must_use]
    pub fn max_file_size(&self) -> Option<u64> {
        self.metadata
            .get(MAX_FILE_SIZE_FIELD)
            .and_then(|value| value.parse().ok())
    }
}

/// Port for asynchronous capability queries.
///
/// Queries may suspend (network round-trip plus cache fill); the engine
/// holds the affected stanza provisionally while a query is in flight
/// without blocking other stanzas.
#[async_trait]
pub trait CapabilityDiscovery: Send + Sync {
    /// Returns whether `address` advertises the feature `namespace`.
    async fn supports_feature(&self, namespace: &str, address: &Address) -> bool;

    /// Returns the service items `address` advertises for `namespace`.
    async fn discover_items(&self, namespace: &str, address: &Address) -> Vec<ServiceItem>;
}
