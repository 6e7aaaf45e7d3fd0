//! Three-tier duplicate detection for inbound messages.
//!
//! Replay is routine: reconnection replays archived history, carbons
//! duplicate traffic across resources, and rooms reflect own sends back.
//! Exactly one record may exist per distinct logical message, so every
//! inbound stanza is checked against the timeline before it may append.

use crate::chat::domain::{MessageAttributes, MessageId, RecordKind, Timeline, ns};
use crate::chat::ports::CapabilityDiscovery;
use std::sync::Arc;

/// Resolves inbound messages against existing timeline records.
///
/// Detection runs in three tiers, strongest identifier first:
///
/// 1. client-assigned origin id, scoped to the sender's bare address
/// 2. archive-assigned stable id, honoured only when the archiving
///    address advertises stable-id support
/// 3. body text plus sender plus the stanza's own id, for peers that
///    assign neither stable identifier
#[derive(Clone)]
pub struct Deduplicator {
    capabilities: Arc<dyn CapabilityDiscovery>,
}

impl Deduplicator {
    /// Creates a deduplicator backed by the given discovery port.
    #[must_use]
    pub fn new(capabilities: Arc<dyn CapabilityDiscovery>) -> Self {
        Self { capabilities }
    }

    /// Returns the id of the existing record the attributes duplicate,
    /// or `None` when the message is genuinely new.
    pub async fn resolve(
        &self,
        attrs: &MessageAttributes,
        timeline: &Timeline,
    ) -> Option<MessageId> {
        if let Some(id) = Self::match_origin_id(attrs, timeline) {
            return Some(id);
        }
        if let Some(id) = self.match_archive_id(attrs, timeline).await {
            return Some(id);
        }
        Self::match_body_and_id(attrs, timeline)
    }

    /// Tier 1: origin id scoped to the sender's bare address.
    fn match_origin_id(attrs: &MessageAttributes, timeline: &Timeline) -> Option<MessageId> {
        let origin_id = attrs.origin_id.as_ref()?;
        timeline
            .find(|record| {
                record.origin_id() == Some(origin_id) && record.sender() == &attrs.sender
            })
            .map(|record| record.id().clone())
    }

    /// Tier 2: archive-assigned stable id, gated on the archiving
    /// address advertising stable-id semantics.
    ///
    /// An unverified claim is ignored rather than trusted: a forged
    /// stable id must not suppress a genuine message.
    async fn match_archive_id(
        &self,
        attrs: &MessageAttributes,
        timeline: &Timeline,
    ) -> Option<MessageId> {
        for (by, stable_id) in &attrs.archive_ids {
            if !self.capabilities.supports_feature(ns::STANZA_ID, by).await {
                continue;
            }
            let hit = timeline
                .find(|record| record.archive_ids().get(by) == Some(stable_id))
                .map(|record| record.id().clone());
            if hit.is_some() {
                return hit;
            }
        }
        None
    }

    /// Tier 3: body text, sender and the stanza's own id.
    fn match_body_and_id(attrs: &MessageAttributes, timeline: &Timeline) -> Option<MessageId> {
        let body = attrs.body.as_deref()?;
        let remote_id = attrs.remote_id.as_ref()?;
        timeline
            .find(|record| {
                record.kind() != RecordKind::Error
                    && record.sender() == &attrs.sender
                    && record.body() == Some(body)
                    && record.delivery_id() == remote_id
            })
            .map(|record| record.id().clone())
    }
}
