//! Per-conversation session: ingestion pipeline and send operations.
//!
//! A session owns one timeline and is the only writer to it. Inbound
//! stanzas flow through a fixed pipeline (deduplication, receipts,
//! markers, error admission, correction, append); outbound
//! operations build wire stanzas from records and hand them to the
//! transport. Send failures surface as self-expiring error records
//! rather than propagating.

use super::acks::{AcknowledgmentTracker, MarkerOutcome};
use super::correction::CorrectionEngine;
use super::dedup::Deduplicator;
use super::ChatContext;
use crate::chat::domain::{
    Address, ChatState, ConversationId, Direction, MessageAttributes, MessageId, MessageRecord,
    OutboundStanza, RecordKind, StanzaBuilder, StanzaKind, StanzaView, Timeline, UploadState, ns,
};
use crate::chat::ports::{FileHandle, ServiceItem, SessionEvent};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Routing facts about an inbound stanza, established by the registry
/// before the session sees it.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestFlags {
    /// The stanza arrived as a carbon copy from another resource.
    pub is_carbon: bool,
    /// The stanza was sent by the local account.
    pub is_self: bool,
    /// The peer is a roster contact.
    pub is_roster_contact: bool,
}

/// What ingestion did with an inbound stanza.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new record was appended.
    AppendedNew(MessageId),
    /// An existing record was updated (duplicate, correction).
    UpdatedExisting(MessageId),
    /// The stanza was a receipt or marker and was fully consumed.
    ConsumedAsAck,
    /// The stanza was dropped without touching the timeline.
    Dropped,
}

/// One open conversation with a peer.
pub struct ConversationSession {
    context: ChatContext,
    conversation_id: ConversationId,
    peer: Address,
    message_type: StanzaKind,
    nickname: Option<String>,
    timeline: Timeline,
    unread: u32,
    correcting: Option<MessageId>,
    builder: StanzaBuilder,
    dedup: Deduplicator,
    acks: AcknowledgmentTracker,
}

impl ConversationSession {
    /// Creates a session for the given peer.
    ///
    /// `message_type` selects between one-on-one and room semantics for
    /// both inbound records and outbound stanzas.
    #[must_use]
    pub fn new(
        context: ChatContext,
        peer: Address,
        message_type: StanzaKind,
        nickname: Option<String>,
    ) -> Self {
        let bare_peer = peer.bare();
        let conversation_id = ConversationId::from_address(&bare_peer);
        let builder = StanzaBuilder::new(context.account.clone());
        let dedup = Deduplicator::new(context.capabilities.clone());
        let acks = AcknowledgmentTracker::new(
            context.account.clone(),
            conversation_id.clone(),
            context.transport.clone(),
            context.events.clone(),
        );
        Self {
            context,
            conversation_id,
            peer: bare_peer,
            message_type,
            nickname,
            timeline: Timeline::new(),
            unread: 0,
            correcting: None,
            builder,
            dedup,
            acks,
        }
    }

    /// Returns the conversation identifier.
    #[must_use]
    pub const fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Returns the bare peer address.
    #[must_use]
    pub const fn peer(&self) -> &Address {
        &self.peer
    }

    /// Returns the peer's display name, when known.
    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Returns the timeline for read access.
    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Returns the unread message count.
    #[must_use]
    pub const fn unread(&self) -> u32 {
        self.unread
    }

    /// Returns the record currently being corrected, if any.
    #[must_use]
    pub const fn correcting(&self) -> Option<&MessageId> {
        self.correcting.as_ref()
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Runs one inbound stanza through the ingestion pipeline.
    ///
    /// Deduplication runs before any receipt or marker handling, so a
    /// replayed stanza never re-answers a receipt or marker request.
    pub async fn ingest(&mut self, stanza: &StanzaView, flags: IngestFlags) -> IngestOutcome {
        let now = self.context.now();
        let Some(attrs) = MessageAttributes::extract(stanza, &self.context.account, now) else {
            debug!(conversation = %self.conversation_id, "stanza carries no sender; dropping");
            return IngestOutcome::Dropped;
        };
        if let Some(existing) = self.dedup.resolve(&attrs, &self.timeline).await {
            self.timeline.update(&existing, |record| {
                record.merge_archive_ids(attrs.archive_ids.iter().cloned());
            });
            self.context.events.emit(SessionEvent::MessageUpdated {
                conversation_id: self.conversation_id.clone(),
                message_id: existing.clone(),
            });
            self.persist().await;
            return IngestOutcome::UpdatedExisting(existing);
        }
        self.acks.answer_receipt_request(stanza, &flags).await;
        if self.acks.consume_receipt(stanza, &mut self.timeline, now) {
            self.persist().await;
            return IngestOutcome::ConsumedAsAck;
        }
        match self
            .acks
            .apply_marker(stanza, &mut self.timeline, &flags, now)
            .await
        {
            MarkerOutcome::Violation(_) => return IngestOutcome::Dropped,
            MarkerOutcome::Applied(_) => {
                self.persist().await;
                return IngestOutcome::ConsumedAsAck;
            }
            MarkerOutcome::Ignored => return IngestOutcome::ConsumedAsAck,
            MarkerOutcome::Absent => {}
        }
        if attrs.stanza_kind == StanzaKind::Error {
            if !self.should_append_error(stanza, &attrs) {
                debug!(conversation = %self.conversation_id, "suppressing error stanza");
                return IngestOutcome::Dropped;
            }
            return self.append(&attrs, now).await;
        }
        if attrs.correction_target.is_some() {
            if let Some(updated) = CorrectionEngine::apply(&attrs, &mut self.timeline, now) {
                self.context.events.emit(SessionEvent::MessageUpdated {
                    conversation_id: self.conversation_id.clone(),
                    message_id: updated.clone(),
                });
                self.persist().await;
                return IngestOutcome::UpdatedExisting(updated);
            }
            debug!(
                conversation = %self.conversation_id,
                "correction references no known message; dropping"
            );
            return IngestOutcome::Dropped;
        }
        if !attrs.is_actionable() {
            debug!(conversation = %self.conversation_id, "stanza carries nothing to record");
            return IngestOutcome::Dropped;
        }
        self.append(&attrs, now).await
    }

    /// Decides whether an error stanza deserves a visible record.
    ///
    /// Errors that reference a known message are surfaced once; repeats
    /// for the same failed send are suppressed. Unreferenced errors are
    /// surfaced only when they carry their own text.
    fn should_append_error(&self, stanza: &StanzaView, attrs: &MessageAttributes) -> bool {
        let Some(remote_id) = &attrs.remote_id else {
            return true;
        };
        let already_surfaced = self.timeline.records().any(|record| {
            record.kind() == RecordKind::Error && record.matches_reference(remote_id)
        });
        if already_surfaced {
            return false;
        }
        if self.timeline.find_by_reference(remote_id, None).is_some() {
            return true;
        }
        stanza.visible_body().is_some()
    }

    async fn append(&mut self, attrs: &MessageAttributes, now: DateTime<Utc>) -> IngestOutcome {
        let id = attrs
            .preferred_id(&self.context.account)
            .unwrap_or_else(MessageId::generate);
        let mut builder = MessageRecord::builder(
            id.clone(),
            self.conversation_id.clone(),
            attrs.sender.clone(),
            attrs.direction,
        )
        .full_sender(attrs.full_sender.clone())
        .kind(attrs.record_kind())
        .maybe_body(attrs.body.clone())
        .timestamp(attrs.timestamp)
        .maybe_chat_state(attrs.chat_state)
        .archive_ids(attrs.archive_ids.iter().cloned());
        if let Some(remote_id) = &attrs.remote_id {
            builder = builder.delivery_id(remote_id.clone());
        }
        if let Some(origin_id) = &attrs.origin_id {
            builder = builder.origin_id(origin_id.clone());
        }
        if let Some(url) = &attrs.oob_url {
            builder = builder.oob_url(url.clone());
        }
        if let Some(nickname) = &attrs.nickname {
            builder = builder.nickname(nickname.clone());
        }
        let mut record = builder.build(now);
        record.arm_expiry(now);
        let counts_unread = record.direction() == Direction::Incoming
            && record.body().is_some()
            && !record.is_ephemeral();
        if let Err(error) = self.timeline.insert(record) {
            warn!(%error, conversation = %self.conversation_id, "dropping colliding record");
            return IngestOutcome::Dropped;
        }
        self.context.events.emit(SessionEvent::MessageAppended {
            conversation_id: self.conversation_id.clone(),
            message_id: id.clone(),
        });
        if counts_unread {
            self.bump_unread();
        }
        self.persist().await;
        IngestOutcome::AppendedNew(id)
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Sends a text message, or applies and dispatches a correction when
    /// one is in progress.
    ///
    /// Returns the id of the record the text now lives on. Transport
    /// failures surface as a self-expiring error record; they are never
    /// returned to the caller.
    pub async fn send_text(&mut self, text: &str) -> MessageId {
        let now = self.context.now();
        if let Some(target) = self.correcting.take() {
            if self.timeline.contains(&target) {
                return self.send_correction(target, text, now).await;
            }
            warn!(
                conversation = %self.conversation_id,
                "correction target vanished; sending as new message"
            );
        }
        let id = MessageId::generate();
        let record = MessageRecord::builder(
            id.clone(),
            self.conversation_id.clone(),
            self.context.account.bare(),
            Direction::Outgoing,
        )
        .full_sender(self.context.account.clone())
        .kind(self.outgoing_kind())
        .body(text)
        .timestamp(now)
        .origin_id(id.clone())
        .build(now);
        let stanza = self.builder.message(&record, &self.peer, self.message_type);
        if let Err(error) = self.timeline.insert(record) {
            warn!(%error, conversation = %self.conversation_id, "generated id collided");
            return id;
        }
        self.context.events.emit(SessionEvent::MessageAppended {
            conversation_id: self.conversation_id.clone(),
            message_id: id.clone(),
        });
        self.dispatch(stanza, now).await;
        self.persist().await;
        id
    }

    /// Applies the pending correction to its record and dispatches it.
    ///
    /// The correction goes out under a fresh origin id so it never
    /// collides with the original send, and the stale delivery
    /// confirmation is cleared until the peer acknowledges the new text.
    async fn send_correction(
        &mut self,
        target: MessageId,
        text: &str,
        now: DateTime<Utc>,
    ) -> MessageId {
        let fresh = MessageId::generate();
        self.timeline.update(&target, |record| {
            record.supersede(Some(text.to_owned()), now, now, None);
            record.clear_delivered();
            record.set_origin_id(fresh);
        });
        self.context.events.emit(SessionEvent::MessageUpdated {
            conversation_id: self.conversation_id.clone(),
            message_id: target.clone(),
        });
        let stanza = self
            .timeline
            .get(&target)
            .map(|record| self.builder.message(record, &self.peer, self.message_type));
        if let Some(stanza) = stanza {
            self.dispatch(stanza, now).await;
        }
        self.persist().await;
        target
    }

    /// Starts correcting one of our own messages.
    ///
    /// Returns `false` when the id names nothing correctable: only
    /// non-ephemeral outgoing records can be edited.
    pub fn begin_correcting(&mut self, id: &MessageId) -> bool {
        let editable = self.timeline.get(id).is_some_and(|record| {
            record.direction() == Direction::Outgoing && !record.is_ephemeral()
        });
        if editable {
            self.correcting = Some(id.clone());
        }
        editable
    }

    /// Abandons a correction in progress.
    pub fn cancel_correcting(&mut self) {
        self.correcting = None;
    }

    /// Sends a chat state notification to the peer.
    ///
    /// No record is appended; own chat states are transient. The send is
    /// suppressed entirely when notifications are disabled.
    pub async fn send_chat_state(&self, state: ChatState) {
        if !self.context.config.send_chat_state_notifications {
            return;
        }
        let stanza = self.builder.chat_state(&self.peer, state);
        if let Err(error) = self.context.transport.send(stanza).await {
            warn!(%error, conversation = %self.conversation_id, "failed to send chat state");
        }
    }

    /// Uploads files one at a time and sends each as an attachment
    /// message.
    ///
    /// Each file gets a placeholder record while its transfer is in
    /// flight; on success the record starts carrying the public URL, on
    /// failure it is demoted to a self-expiring error.
    pub async fn send_files(&mut self, files: Vec<FileHandle>) {
        let now = self.context.now();
        let Ok(domain) = self.context.account.domain_address() else {
            warn!(conversation = %self.conversation_id, "account has no domain to discover against");
            return;
        };
        let items = self
            .context
            .capabilities
            .discover_items(ns::HTTP_UPLOAD, &domain)
            .await;
        let Some(service) = items.into_iter().next() else {
            warn!(conversation = %self.conversation_id, "no upload service discovered");
            self.append_local_error("No file upload service available".to_owned(), now)
                .await;
            return;
        };
        for file in files {
            self.send_file(&service, &file).await;
        }
    }

    async fn send_file(&mut self, service: &ServiceItem, file: &FileHandle) {
        let now = self.context.now();
        if let Some(max) = service.max_file_size()
            && file.size > max
        {
            self.append_local_error(
                format!(
                    "The file {} exceeds the maximum allowed size of {max} bytes",
                    file.name
                ),
                now,
            )
            .await;
            return;
        }
        let slot = match self.context.uploader.request_slot(&service.address, file).await {
            Ok(slot) => slot,
            Err(error) => {
                warn!(%error, conversation = %self.conversation_id, "upload slot refused");
                self.append_local_error(format!("Could not upload {}: {error}", file.name), now)
                    .await;
                return;
            }
        };
        let id = MessageId::generate();
        let record = MessageRecord::builder(
            id.clone(),
            self.conversation_id.clone(),
            self.context.account.bare(),
            Direction::Outgoing,
        )
        .full_sender(self.context.account.clone())
        .kind(self.outgoing_kind())
        .timestamp(now)
        .origin_id(id.clone())
        .upload(UploadState::Pending)
        .build(now);
        if let Err(error) = self.timeline.insert(record) {
            warn!(%error, conversation = %self.conversation_id, "generated id collided");
            return;
        }
        self.context.events.emit(SessionEvent::MessageAppended {
            conversation_id: self.conversation_id.clone(),
            message_id: id.clone(),
        });
        match self.context.uploader.upload(&slot, file).await {
            Ok(()) => {
                self.timeline.update(&id, |record| {
                    record.set_upload(UploadState::Succeeded {
                        url: slot.get_url.clone(),
                    });
                    record.set_body(Some(slot.get_url.clone()));
                    record.set_oob_url(Some(slot.get_url.clone()));
                });
                self.context.events.emit(SessionEvent::MessageUpdated {
                    conversation_id: self.conversation_id.clone(),
                    message_id: id.clone(),
                });
                let stanza = self
                    .timeline
                    .get(&id)
                    .map(|record| self.builder.message(record, &self.peer, self.message_type));
                if let Some(stanza) = stanza {
                    self.dispatch(stanza, now).await;
                }
            }
            Err(error) => {
                warn!(%error, conversation = %self.conversation_id, "upload failed");
                self.timeline.update(&id, |record| {
                    record.set_upload(UploadState::Failed {
                        reason: error.to_string(),
                    });
                    record.demote_to_error();
                    record.arm_expiry(now);
                });
                self.context.events.emit(SessionEvent::MessageUpdated {
                    conversation_id: self.conversation_id.clone(),
                    message_id: id.clone(),
                });
            }
        }
        self.persist().await;
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Reloads the timeline from the store, replacing in-memory state.
    pub async fn restore(&mut self) {
        match self.context.store.fetch(&self.conversation_id).await {
            Ok(records) => {
                self.timeline.clear();
                for record in records {
                    if let Err(error) = self.timeline.insert(record) {
                        warn!(%error, conversation = %self.conversation_id, "skipping stored record");
                    }
                }
            }
            Err(error) => {
                warn!(%error, conversation = %self.conversation_id, "failed to restore history");
            }
        }
    }

    /// Clears the timeline and the stored snapshot.
    pub async fn reset(&mut self) {
        self.timeline.clear();
        self.correcting = None;
        if let Err(error) = self.context.store.clear(&self.conversation_id).await {
            warn!(%error, conversation = %self.conversation_id, "failed to clear stored history");
        }
        if self.unread != 0 {
            self.unread = 0;
            self.context.events.emit(SessionEvent::UnreadCountChanged {
                conversation_id: self.conversation_id.clone(),
                count: 0,
            });
        }
        self.context.events.emit(SessionEvent::SessionReset {
            conversation_id: self.conversation_id.clone(),
        });
    }

    /// Removes ephemeral records whose purge deadline has passed.
    ///
    /// Returns how many records were removed.
    pub async fn purge_expired(&mut self) -> usize {
        let now = self.context.now();
        let expired = self.timeline.purge_expired(now);
        for message_id in &expired {
            self.context.events.emit(SessionEvent::MessageExpired {
                conversation_id: self.conversation_id.clone(),
                message_id: message_id.clone(),
            });
        }
        if !expired.is_empty() {
            self.persist().await;
        }
        expired.len()
    }

    /// Marks the conversation as read.
    pub fn clear_unread(&mut self) {
        if self.unread != 0 {
            self.unread = 0;
            self.context.events.emit(SessionEvent::UnreadCountChanged {
                conversation_id: self.conversation_id.clone(),
                count: 0,
            });
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    const fn outgoing_kind(&self) -> RecordKind {
        match self.message_type {
            StanzaKind::GroupChat => RecordKind::GroupChat,
            _ => RecordKind::Normal,
        }
    }

    fn bump_unread(&mut self) {
        self.unread = self.unread.saturating_add(1);
        self.context.events.emit(SessionEvent::UnreadCountChanged {
            conversation_id: self.conversation_id.clone(),
            count: self.unread,
        });
    }

    async fn dispatch(&mut self, stanza: OutboundStanza, now: DateTime<Utc>) {
        if let Err(error) = self.context.transport.send(stanza).await {
            warn!(%error, conversation = %self.conversation_id, "send failed");
            self.append_local_error(format!("Message delivery failed: {error}"), now)
                .await;
        }
    }

    /// Surfaces a local failure as a self-expiring error record.
    async fn append_local_error(&mut self, text: String, now: DateTime<Utc>) {
        let id = MessageId::generate();
        let mut record = MessageRecord::builder(
            id.clone(),
            self.conversation_id.clone(),
            self.context.account.bare(),
            Direction::Outgoing,
        )
        .kind(RecordKind::Error)
        .body(text)
        .timestamp(now)
        .build(now);
        record.arm_expiry(now);
        if let Err(error) = self.timeline.insert(record) {
            warn!(%error, conversation = %self.conversation_id, "generated id collided");
            return;
        }
        self.context.events.emit(SessionEvent::MessageAppended {
            conversation_id: self.conversation_id.clone(),
            message_id: id,
        });
        self.persist().await;
    }

    async fn persist(&self) {
        let snapshot = self.timeline.snapshot();
        if let Err(error) = self
            .context
            .store
            .persist(&self.conversation_id, &snapshot)
            .await
        {
            warn!(%error, conversation = %self.conversation_id, "failed to persist history");
        }
    }
}
