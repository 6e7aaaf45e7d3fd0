//! The canonical persisted unit of conversation history.
//!
//! A record is created once per distinct logical message (enforced by the
//! deduplicator) and afterwards mutated only through narrow, idempotent
//! operations: correction supersede, set-once acknowledgments, archive-id
//! merges and upload-state transitions. The `id` is immutable once set.

use super::address::Address;
use super::ids::{ConversationId, MessageId};
use super::stanza::ChatState;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seconds an ephemeral record stays visible before it may be purged.
pub const EPHEMERAL_TTL_SECONDS: i64 = 10;

/// Whether a message left this account or arrived from a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Sent by the local account.
    Outgoing,
    /// Received from a peer.
    Incoming,
}

/// The kind of a conversation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Ordinary one-on-one message.
    Normal,
    /// Room message.
    GroupChat,
    /// Error surfaced in the conversation; self-expires.
    Error,
    /// Pure chat-state notification carrier; self-expires.
    ChatStateOnly,
}

/// Result state of an attachment send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum UploadState {
    /// The upload slot was granted and the transfer is in flight.
    Pending,
    /// The transfer completed; the file is reachable at `url`.
    Succeeded {
        /// Public URL of the uploaded file.
        url: String,
    },
    /// The transfer failed; `reason` explains why.
    Failed {
        /// Human-readable failure description.
        reason: String,
    },
}

/// One archived version of a corrected message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupersededVersion {
    /// The logical send time this version was current for.
    pub timestamp: DateTime<Utc>,
    /// The body text of this version.
    pub body: Option<String>,
}

/// Correction history of a record (XEP-0308).
///
/// The superseded list is ordered by application and only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionState {
    edited_at: Option<DateTime<Utc>>,
    superseded: Vec<SupersededVersion>,
}

impl CorrectionState {
    /// Returns when the record was last edited, if ever.
    #[must_use]
    pub const fn edited_at(&self) -> Option<DateTime<Utc>> {
        self.edited_at
    }

    /// Returns `true` if the record has been corrected at least once.
    #[must_use]
    pub const fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    /// Returns the archived versions, oldest application first.
    #[must_use]
    pub fn superseded(&self) -> &[SupersededVersion] {
        &self.superseded
    }
}

/// Delivery and read acknowledgments for a record.
///
/// Both fields are set at most once; repeated acknowledgments are no-ops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgment {
    delivered_at: Option<DateTime<Utc>>,
    read_at: Option<DateTime<Utc>>,
}

impl Acknowledgment {
    /// Returns when transport-level delivery was confirmed.
    #[must_use]
    pub const fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// Returns when the peer displayed or acknowledged the message.
    #[must_use]
    pub const fn read_at(&self) -> Option<DateTime<Utc>> {
        self.read_at
    }
}

/// A message within a conversation timeline.
///
/// Records are the atomic unit of conversation history. Exactly one
/// record exists per distinct logical message; duplicate deliveries and
/// corrections update the existing record instead of appending.
///
/// # Invariants
///
/// - `id` is unique within the conversation and never changes
/// - the superseded-version list is monotonically non-decreasing
/// - acknowledgment timestamps are set at most once
/// - ephemeral records are never corrected or acknowledged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Stable identifier, preferring protocol-assigned stable ids.
    id: MessageId,
    /// The owning conversation.
    conversation_id: ConversationId,
    /// Bare address of the originator.
    sender: Address,
    /// Full address of the originator, when known.
    full_sender: Option<Address>,
    /// Outgoing or incoming.
    direction: Direction,
    /// Record kind.
    kind: RecordKind,
    /// Visible body text; absent for state-only carriers.
    body: Option<String>,
    /// Logical send time (delayed-delivery stamp wins over arrival).
    timestamp: DateTime<Utc>,
    /// Protocol-level id referenced by receipts, markers and corrections.
    delivery_id: MessageId,
    /// Client-assigned origin id, when present.
    origin_id: Option<MessageId>,
    /// Archive-assigned stable ids keyed by archiving address.
    archive_ids: BTreeMap<Address, MessageId>,
    /// Correction history.
    correction: CorrectionState,
    /// Delivery/read acknowledgments.
    acknowledgment: Acknowledgment,
    /// Chat state carried alongside (or instead of) the body.
    chat_state: Option<ChatState>,
    /// Attachment send state.
    upload: Option<UploadState>,
    /// Out-of-band attachment URL.
    oob_url: Option<String>,
    /// Roster display name of the sender, when known.
    nickname: Option<String>,
    /// Purge deadline for ephemeral records.
    expires_at: Option<DateTime<Utc>>,
}

impl MessageRecord {
    /// Returns a builder for constructing records.
    #[must_use]
    pub fn builder(
        id: MessageId,
        conversation_id: ConversationId,
        sender: Address,
        direction: Direction,
    ) -> MessageRecordBuilder {
        MessageRecordBuilder::new(id, conversation_id, sender, direction)
    }

    /// Returns the stable record identifier.
    #[must_use]
    pub const fn id(&self) -> &MessageId {
        &self.id
    }

    /// Returns the owning conversation.
    #[must_use]
    pub const fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Returns the bare sender address.
    #[must_use]
    pub const fn sender(&self) -> &Address {
        &self.sender
    }

    /// Returns the full sender address, when known.
    #[must_use]
    pub const fn full_sender(&self) -> Option<&Address> {
        self.full_sender.as_ref()
    }

    /// Returns the direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the record kind.
    #[must_use]
    pub const fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns the visible body text.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the logical send time.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the current protocol-level delivery identifier.
    #[must_use]
    pub const fn delivery_id(&self) -> &MessageId {
        &self.delivery_id
    }

    /// Returns the client-assigned origin id.
    #[must_use]
    pub const fn origin_id(&self) -> Option<&MessageId> {
        self.origin_id.as_ref()
    }

    /// Returns the archive-assigned ids keyed by archiving address.
    #[must_use]
    pub const fn archive_ids(&self) -> &BTreeMap<Address, MessageId> {
        &self.archive_ids
    }

    /// Returns the correction history.
    #[must_use]
    pub const fn correction(&self) -> &CorrectionState {
        &self.correction
    }

    /// Returns the acknowledgment timestamps.
    #[must_use]
    pub const fn acknowledgment(&self) -> &Acknowledgment {
        &self.acknowledgment
    }

    /// Returns the chat state carried by this record.
    #[must_use]
    pub const fn chat_state(&self) -> Option<ChatState> {
        self.chat_state
    }

    /// Returns the attachment send state.
    #[must_use]
    pub const fn upload(&self) -> Option<&UploadState> {
        self.upload.as_ref()
    }

    /// Returns the out-of-band attachment URL.
    #[must_use]
    pub fn oob_url(&self) -> Option<&str> {
        self.oob_url.as_deref()
    }

    /// Returns the sender's roster display name, when known.
    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// Returns `true` if this record self-expires: pure chat-state
    /// carriers and error records.
    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        matches!(self.kind, RecordKind::Error | RecordKind::ChatStateOnly)
    }

    /// Returns the purge deadline for ephemeral records.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns `true` if `reference` names this record by its stable id,
    /// delivery id or origin id.
    #[must_use]
    pub fn matches_reference(&self, reference: &MessageId) -> bool {
        self.id == *reference
            || self.delivery_id == *reference
            || self.origin_id.as_ref() == Some(reference)
    }

    /// Stamps the purge deadline relative to the append time.
    ///
    /// Only ephemeral records get a deadline; the call is a no-op for
    /// everything else.
    pub fn arm_expiry(&mut self, appended_at: DateTime<Utc>) {
        if self.is_ephemeral() {
            self.expires_at = Some(appended_at + Duration::seconds(EPHEMERAL_TTL_SECONDS));
        }
    }

    /// Supersedes the visible content with a newer correction.
    ///
    /// The current (timestamp, body) pair is archived, the incoming body
    /// and timestamp become visible, `edited_at` is set to `now`, and the
    /// delivery identifier is re-derived from the update when the
    /// correcting stanza carried one. The stable `id` never changes.
    pub fn supersede(
        &mut self,
        body: Option<String>,
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
        delivery_id: Option<MessageId>,
    ) {
        self.correction.superseded.push(SupersededVersion {
            timestamp: self.timestamp,
            body: self.body.take(),
        });
        self.body = body;
        self.timestamp = timestamp;
        self.correction.edited_at = Some(now);
        if let Some(delivery_id) = delivery_id {
            self.delivery_id = delivery_id;
        }
    }

    /// Archives an out-of-order older version without touching the
    /// visible content.
    pub fn record_older_version(&mut self, timestamp: DateTime<Utc>, body: Option<String>) {
        self.correction
            .superseded
            .push(SupersededVersion { timestamp, body });
    }

    /// Replaces the origin id, e.g. when a correction is dispatched with
    /// a fresh one to avoid colliding with the original.
    pub fn set_origin_id(&mut self, origin_id: MessageId) {
        self.origin_id = Some(origin_id);
    }

    /// Records transport-level delivery once.
    ///
    /// Returns `true` if the timestamp was set by this call; repeated
    /// receipts are no-ops. Ephemeral records are never acknowledged.
    pub fn mark_delivered(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_ephemeral() || self.acknowledgment.delivered_at.is_some() {
            return false;
        }
        self.acknowledgment.delivered_at = Some(at);
        true
    }

    /// Records that the peer displayed or acknowledged the message, once.
    ///
    /// Returns `true` if the timestamp was set by this call.
    pub fn mark_read(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_ephemeral() || self.acknowledgment.read_at.is_some() {
            return false;
        }
        self.acknowledgment.read_at = Some(at);
        true
    }

    /// Clears the delivery acknowledgment, used when a correction makes
    /// the prior delivery confirmation stale.
    pub fn clear_delivered(&mut self) {
        self.acknowledgment.delivered_at = None;
    }

    /// Merges late-arriving archive ids into the record.
    ///
    /// Existing entries win; the merge is idempotent under replay.
    pub fn merge_archive_ids<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = (Address, MessageId)>,
    {
        for (by, id) in ids {
            self.archive_ids.entry(by).or_insert(id);
        }
    }

    /// Transitions the attachment send state.
    pub fn set_upload(&mut self, state: UploadState) {
        self.upload = Some(state);
    }

    /// Replaces the visible body, used when an upload completes and the
    /// record starts carrying the attachment URL.
    pub fn set_body(&mut self, body: Option<String>) {
        self.body = body;
    }

    /// Sets the out-of-band attachment URL.
    pub fn set_oob_url(&mut self, url: Option<String>) {
        self.oob_url = url;
    }

    /// Demotes the record to an error kind, used when an upload fails
    /// after the placeholder was appended.
    pub fn demote_to_error(&mut self) {
        self.kind = RecordKind::Error;
    }
}

/// Builder for constructing message records.
#[derive(Debug)]
pub struct MessageRecordBuilder {
    id: MessageId,
    conversation_id: ConversationId,
    sender: Address,
    full_sender: Option<Address>,
    direction: Direction,
    kind: RecordKind,
    body: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    delivery_id: Option<MessageId>,
    origin_id: Option<MessageId>,
    archive_ids: BTreeMap<Address, MessageId>,
    chat_state: Option<ChatState>,
    upload: Option<UploadState>,
    oob_url: Option<String>,
    nickname: Option<String>,
}

impl MessageRecordBuilder {
    fn new(
        id: MessageId,
        conversation_id: ConversationId,
        sender: Address,
        direction: Direction,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender,
            full_sender: None,
            direction,
            kind: RecordKind::Normal,
            body: None,
            timestamp: None,
            delivery_id: None,
            origin_id: None,
            archive_ids: BTreeMap::new(),
            chat_state: None,
            upload: None,
            oob_url: None,
            nickname: None,
        }
    }

    /// Sets the full sender address.
    #[must_use]
    pub fn full_sender(mut self, address: Address) -> Self {
        self.full_sender = Some(address);
        self
    }

    /// Sets the record kind.
    #[must_use]
    pub const fn kind(mut self, kind: RecordKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the body text.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets an optional body text.
    #[must_use]
    pub fn maybe_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    /// Sets the logical send time.
    #[must_use]
    pub const fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the protocol-level delivery id. Defaults to the record id.
    #[must_use]
    pub fn delivery_id(mut self, id: MessageId) -> Self {
        self.delivery_id = Some(id);
        self
    }

    /// Sets the client-assigned origin id.
    #[must_use]
    pub fn origin_id(mut self, id: MessageId) -> Self {
        self.origin_id = Some(id);
        self
    }

    /// Adds archive-assigned ids keyed by archiving address.
    #[must_use]
    pub fn archive_ids<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = (Address, MessageId)>,
    {
        self.archive_ids.extend(ids);
        self
    }

    /// Sets the chat state carried by the record.
    #[must_use]
    pub const fn chat_state(mut self, state: ChatState) -> Self {
        self.chat_state = Some(state);
        self
    }

    /// Sets an optional chat state.
    #[must_use]
    pub const fn maybe_chat_state(mut self, state: Option<ChatState>) -> Self {
        self.chat_state = state;
        self
    }

    /// Sets the attachment send state.
    #[must_use]
    pub fn upload(mut self, state: UploadState) -> Self {
        self.upload = Some(state);
        self
    }

    /// Sets the out-of-band attachment URL.
    #[must_use]
    pub fn oob_url(mut self, url: impl Into<String>) -> Self {
        self.oob_url = Some(url.into());
        self
    }

    /// Sets the sender's roster display name.
    #[must_use]
    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    /// Builds the record, stamping `now` where no explicit timestamp was
    /// provided.
    #[must_use]
    pub fn build(self, now: DateTime<Utc>) -> MessageRecord {
        let delivery_id = self.delivery_id.unwrap_or_else(|| self.id.clone());
        MessageRecord {
            id: self.id,
            conversation_id: self.conversation_id,
            sender: self.sender,
            full_sender: self.full_sender,
            direction: self.direction,
            kind: self.kind,
            body: self.body,
            timestamp: self.timestamp.unwrap_or(now),
            delivery_id,
            origin_id: self.origin_id,
            archive_ids: self.archive_ids,
            correction: CorrectionState::default(),
            acknowledgment: Acknowledgment::default(),
            chat_state: self.chat_state,
            upload: self.upload,
            oob_url: self.oob_url,
            nickname: self.nickname,
            expires_at: None,
        }
    }
}
