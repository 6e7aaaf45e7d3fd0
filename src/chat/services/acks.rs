//! Delivery receipts (XEP-0184) and chat markers (XEP-0333).
//!
//! Both protocols reference earlier messages by id and mutate existing
//! records; neither ever appends. Acknowledgment timestamps are set at
//! most once, so replayed receipts and markers are harmless.

use super::session::IngestFlags;
use crate::chat::domain::{
    Address, ConversationId, Direction, MarkerKind, MessageId, StanzaBuilder, StanzaView, Timeline,
};
use crate::chat::error::ProtocolViolation;
use crate::chat::ports::{EventSink, SessionEvent, Transport};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of marker processing for one inbound stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerOutcome {
    /// The stanza carried no marker elements; processing continues.
    Absent,
    /// A marker response was consumed and the referenced record updated.
    Applied(MessageId),
    /// A marker was consumed without changing any record.
    Ignored,
    /// The stanza was malformed and must be dropped.
    Violation(ProtocolViolation),
}

/// Processes receipts and markers for one conversation.
#[derive(Clone)]
pub struct AcknowledgmentTracker {
    account: Address,
    conversation_id: ConversationId,
    builder: StanzaBuilder,
    transport: Arc<dyn Transport>,
    events: Arc<dyn EventSink>,
}

impl AcknowledgmentTracker {
    /// Creates a tracker for one conversation.
    #[must_use]
    pub fn new(
        account: Address,
        conversation_id: ConversationId,
        transport: Arc<dyn Transport>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let builder = StanzaBuilder::new(account.clone());
        Self {
            account,
            conversation_id,
            builder,
            transport,
            events,
        }
    }

    /// Answers a receipt request on an inbound message.
    ///
    /// No receipt is sent for carbon copies or self-sent messages; the
    /// originating resource answers those. Send failures are logged and
    /// swallowed: a lost receipt never affects local state.
    pub async fn answer_receipt_request(&self, stanza: &StanzaView, flags: &IngestFlags) {
        if !stanza.receipt_request() || flags.is_carbon || flags.is_self {
            return;
        }
        let (Some(from), Some(remote_id)) = (stanza.from(), stanza.remote_id()) else {
            return;
        };
        let ack = self.builder.receipt_ack(from, remote_id);
        if let Err(error) = self.transport.send(ack).await {
            warn!(%error, conversation = %self.conversation_id, "failed to send delivery receipt");
        }
    }

    /// Consumes a receipt acknowledgment, recording delivery on the
    /// referenced outgoing record.
    ///
    /// Returns `true` when the stanza was a receipt addressed to this
    /// account and is fully handled, whether or not the referenced record
    /// was found. A receipt addressed to someone else (a sent carbon) is
    /// not ours to consume and falls through to the rest of the pipeline.
    pub fn consume_receipt(
        &self,
        stanza: &StanzaView,
        timeline: &mut Timeline,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(ack_id) = stanza.receipt_ack() else {
            return false;
        };
        if stanza.to().is_some_and(|to| !to.same_bare(&self.account)) {
            debug!(conversation = %self.conversation_id, "receipt addressed elsewhere; passing on");
            return false;
        }
        let target = timeline
            .find(|record| {
                record.direction() == Direction::Outgoing && record.matches_reference(ack_id)
            })
            .map(|record| record.id().clone());
        let Some(id) = target else {
            debug!(
                conversation = %self.conversation_id,
                reference = %ack_id,
                "receipt references no known message"
            );
            return true;
        };
        let mut changed = false;
        timeline.update(&id, |record| {
            changed = record.mark_delivered(now);
        });
        if changed {
            self.events.emit(SessionEvent::MessageUpdated {
                conversation_id: self.conversation_id.clone(),
                message_id: id,
            });
        }
        true
    }

    /// Processes the marker elements of an inbound stanza.
    ///
    /// A `markable` request is answered (roster contacts only, never for
    /// carbons or archive replays) and processing continues; a response
    /// marker is consumed and the referenced record acknowledged.
    pub async fn apply_marker(
        &self,
        stanza: &StanzaView,
        timeline: &mut Timeline,
        flags: &IngestFlags,
        now: DateTime<Utc>,
    ) -> MarkerOutcome {
        let markers = stanza.markers();
        if markers.is_empty() {
            return MarkerOutcome::Absent;
        }
        if markers.len() > 1 {
            let violation = ProtocolViolation::MultipleMarkers {
                count: markers.len(),
            };
            warn!(conversation = %self.conversation_id, %violation, "dropping stanza");
            return MarkerOutcome::Violation(violation);
        }
        if stanza.to().is_some_and(|to| !to.same_bare(&self.account)) {
            // A sent carbon of our own markable message lands here; the
            // marker is not for us but the message itself still counts.
            debug!(conversation = %self.conversation_id, "marker addressed elsewhere; passing on");
            return MarkerOutcome::Absent;
        }
        let Some(marker) = markers.first() else {
            return MarkerOutcome::Absent;
        };
        if marker.kind.is_request() {
            self.answer_marker_request(stanza, flags).await;
            return MarkerOutcome::Absent;
        }
        let Some(target) = marker.target.as_ref() else {
            return MarkerOutcome::Ignored;
        };
        let mut changed = false;
        let updated = timeline.update_by_reference(target, None, |record| {
            changed = match marker.kind {
                MarkerKind::Received => record.mark_delivered(now),
                MarkerKind::Displayed | MarkerKind::Acknowledged => record.mark_read(now),
                MarkerKind::Markable => false,
            };
        });
        match updated {
            Some(id) => {
                if changed {
                    self.events.emit(SessionEvent::MessageUpdated {
                        conversation_id: self.conversation_id.clone(),
                        message_id: id.clone(),
                    });
                }
                MarkerOutcome::Applied(id)
            }
            None => {
                debug!(
                    conversation = %self.conversation_id,
                    reference = %target,
                    "marker references no known message"
                );
                MarkerOutcome::Ignored
            }
        }
    }

    async fn answer_marker_request(&self, stanza: &StanzaView, flags: &IngestFlags) {
        if !flags.is_roster_contact || flags.is_carbon || flags.is_self || stanza.is_archived() {
            return;
        }
        let (Some(from), Some(remote_id)) = (stanza.from(), stanza.remote_id()) else {
            return;
        };
        let reply = self.builder.marker(from, remote_id, MarkerKind::Received);
        if let Err(error) = self.transport.send(reply).await {
            warn!(%error, conversation = %self.conversation_id, "failed to send chat marker");
        }
    }
}
