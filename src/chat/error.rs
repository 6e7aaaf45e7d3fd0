//! Error taxonomy for the conversation subsystem.
//!
//! Protocol violations are dropped with a local warning and are never
//! fatal; no error from this module propagates out of the ingestion
//! pipeline.

use super::domain::Address;
use thiserror::Error;

/// Malformed or contradictory inbound stanzas.
///
/// These are logged and the offending stanza is dropped; the peer is
/// never answered with an error of our own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// A stanza carried more than one chat marker element.
    #[error("stanza carries {count} chat markers; at most one is allowed")]
    MultipleMarkers {
        /// How many marker elements the stanza carried.
        count: usize,
    },

    /// A purported carbon copy did not originate from the local account.
    #[error("carbon copy claimed by non-account sender {claimed}")]
    CarbonForgery {
        /// The outer sender that claimed to forward the carbon.
        claimed: Address,
    },

    /// A self-sent stanza carried no recipient to route by.
    #[error("self-sent stanza without a 'to' address cannot be routed")]
    MissingRecipient,
}
