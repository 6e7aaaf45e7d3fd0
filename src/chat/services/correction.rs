//! Application of inbound message corrections (XEP-0308).
//!
//! A correction never creates a second record: the referenced record is
//! updated in place and its previous content archived. Corrections and
//! their originals can arrive in any order, so application is decided by
//! logical send time, not arrival order.

use crate::chat::domain::{MessageAttributes, MessageId, Timeline};
use chrono::{DateTime, Utc};

/// Applies inbound corrections to timeline records.
pub struct CorrectionEngine;

impl CorrectionEngine {
    /// Applies a correction described by `attrs` to the timeline.
    ///
    /// The referenced record is looked up by stable id, delivery id or
    /// origin id, scoped to the correcting sender so a peer can never
    /// rewrite someone else's message. The incoming correction supersedes
    /// the visible version and re-derives the delivery identifier from
    /// the correcting stanza, unless it is older than an already-applied
    /// correction; only then does it land in the superseded history
    /// without touching the visible content.
    ///
    /// Returns the updated record's id, or `None` when the target is
    /// unknown.
    pub fn apply(
        attrs: &MessageAttributes,
        timeline: &mut Timeline,
        now: DateTime<Utc>,
    ) -> Option<MessageId> {
        let target = attrs.correction_target.as_ref()?;
        let current = timeline
            .find_by_reference(target, Some(&attrs.sender))
            .map(|record| (record.id().clone(), record.timestamp()))?;
        let (id, visible_at) = current;
        timeline.update(&id, |record| {
            if attrs.timestamp < visible_at && record.correction().is_edited() {
                record.record_older_version(attrs.timestamp, attrs.body.clone());
            } else {
                let delivery_id = attrs.origin_id.clone().or_else(|| attrs.remote_id.clone());
                record.supersede(attrs.body.clone(), attrs.timestamp, now, delivery_id);
            }
        });
        Some(id)
    }
}
