//! Protocol addresses (JIDs) in bare and full form.
//!
//! An address is `local@domain` optionally followed by `/resource`. The
//! bare form identifies an account or room; the full form identifies one
//! connected resource of it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A protocol address, either bare (`user@example.org`) or full
/// (`user@example.org/laptop`).
///
/// # Examples
///
/// ```
/// use palaver::chat::domain::Address;
///
/// let full = Address::new("alice@example.org/phone").expect("valid address");
/// assert_eq!(full.bare().as_str(), "alice@example.org");
/// assert_eq!(full.resource(), Some("phone"));
/// assert_eq!(full.domain(), "example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Creates an address from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] if the value is empty, contains
    /// whitespace, or has an empty domain part.
    pub fn new(value: impl Into<String>) -> Result<Self, AddressError> {
        let value = value.into();
        if value.is_empty() {
            return Err(AddressError::Empty);
        }
        if value.chars().any(char::is_whitespace) {
            return Err(AddressError::Whitespace(value));
        }
        let bare_part = value.split('/').next().unwrap_or_default();
        let domain = bare_part.rsplit('@').next().unwrap_or_default();
        if domain.is_empty() {
            return Err(AddressError::MissingDomain(value));
        }
        Ok(Self(value))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the bare form of this address (resource stripped).
    #[must_use]
    pub fn bare(&self) -> Self {
        self.0
            .split_once('/')
            .map_or_else(|| self.clone(), |(bare, _)| Self(bare.to_owned()))
    }

    /// Returns `true` if the address carries no resource part.
    #[must_use]
    pub fn is_bare(&self) -> bool {
        !self.0.contains('/')
    }

    /// Returns the resource part, if any.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        self.0.split_once('/').map(|(_, resource)| resource)
    }

    /// Returns the domain part of the address.
    #[must_use]
    pub fn domain(&self) -> &str {
        let bare_part = self.0.split('/').next().unwrap_or_default();
        bare_part.rsplit('@').next().unwrap_or_default()
    }

    /// Returns the domain as an address of its own, for addressing
    /// server-side services.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] if the domain part is empty.
    pub fn domain_address(&self) -> Result<Self, AddressError> {
        Self::new(self.domain())
    }

    /// Returns `true` if the two addresses share the same bare form.
    #[must_use]
    pub fn same_bare(&self, other: &Self) -> bool {
        self.bare() == other.bare()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The address string was empty.
    #[error("address cannot be empty")]
    Empty,

    /// The address contained whitespace.
    #[error("address '{0}' contains whitespace")]
    Whitespace(String),

    /// The address had no domain part.
    #[error("address '{0}' has no domain part")]
    MissingDomain(String),
}
