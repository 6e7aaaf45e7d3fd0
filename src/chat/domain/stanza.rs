//! Read-only view of an inbound protocol message unit.
//!
//! The transport layer parses the wire format; the engine only consumes
//! this queryable representation. Fields mirror the stanza elements the
//! engine acts on; anything else lands in the generic extension map.

use super::address::Address;
use super::ids::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The protocol-level type of a message stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StanzaKind {
    /// One-on-one chat message.
    Chat,
    /// Message without a more specific type.
    Normal,
    /// Group chat (room) message.
    GroupChat,
    /// Error reply to an earlier stanza.
    Error,
    /// Broadcast-style message; never part of a conversation.
    Headline,
}

/// XEP-0085 chat state notification carried by a stanza.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    /// The peer is actively participating.
    Active,
    /// The peer is composing a message.
    Composing,
    /// The peer paused while composing.
    Paused,
    /// The peer has become inactive.
    Inactive,
    /// The peer has gone away.
    Gone,
}

/// XEP-0333 chat marker kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Request: the sender asks for markers on this message.
    Markable,
    /// Response: the message reached the peer's client.
    Received,
    /// Response: the message was displayed to the peer.
    Displayed,
    /// Response: the message was acknowledged by the peer.
    Acknowledged,
}

impl MarkerKind {
    /// Returns `true` for the request kind (`markable`).
    #[must_use]
    pub const fn is_request(self) -> bool {
        matches!(self, Self::Markable)
    }
}

/// One chat marker element on a stanza.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// The marker kind.
    pub kind: MarkerKind,
    /// The referenced message id; absent on some `markable` requests.
    pub target: Option<MessageId>,
}

impl Marker {
    /// Creates a marker element.
    #[must_use]
    pub const fn new(kind: MarkerKind, target: Option<MessageId>) -> Self {
        Self { kind, target }
    }
}

/// Read-only, queryable representation of an inbound message stanza.
///
/// Constructed by the transport layer (or by tests) via
/// [`StanzaView::builder`]; the engine never mutates it.
///
/// # Examples
///
/// ```
/// use palaver::chat::domain::{Address, StanzaKind, StanzaView};
///
/// let from = Address::new("alice@example.org/phone").expect("valid address");
/// let stanza = StanzaView::builder(StanzaKind::Chat)
///     .from(from)
///     .body("hello")
///     .origin_id("o1")
///     .build();
/// assert_eq!(stanza.body(), Some("hello"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StanzaView {
    /// Stanza type attribute.
    kind: StanzaKind,
    /// Full sender address.
    from: Option<Address>,
    /// Recipient address.
    to: Option<Address>,
    /// The stanza's own `id` attribute.
    remote_id: Option<MessageId>,
    /// Message body text.
    body: Option<String>,
    /// Human-readable error text on error stanzas.
    error_text: Option<String>,
    /// Chat state notification element.
    chat_state: Option<ChatState>,
    /// XEP-0308 replace target.
    correction_target: Option<MessageId>,
    /// Whether the sender requests a delivery receipt.
    receipt_request: bool,
    /// XEP-0184 acknowledgment: the delivered message id.
    receipt_ack: Option<MessageId>,
    /// Chat marker elements, in document order.
    markers: Vec<Marker>,
    /// XEP-0359 client-assigned origin id.
    origin_id: Option<MessageId>,
    /// XEP-0359 archive-assigned ids, keyed by archiving address.
    archive_ids: Vec<(Address, MessageId)>,
    /// XEP-0203 delayed-delivery timestamp.
    delay: Option<DateTime<Utc>>,
    /// XEP-0066 out-of-band URL.
    oob_url: Option<String>,
    /// Whether the stanza is a replayed archive entry.
    archived: bool,
    /// Forwarded payload, present on carbon copies.
    forwarded: Option<Box<StanzaView>>,
    /// Whether the forwarded payload arrived as a carbon copy.
    carbon_copy: bool,
    /// Unknown or future extension elements, keyed by namespace.
    extensions: BTreeMap<String, Value>,
}

impl StanzaView {
    /// Returns a builder for the given stanza kind.
    #[must_use]
    pub fn builder(kind: StanzaKind) -> StanzaViewBuilder {
        StanzaViewBuilder::new(kind)
    }

    /// Returns the stanza kind.
    #[must_use]
    pub const fn kind(&self) -> StanzaKind {
        self.kind
    }

    /// Returns the full sender address.
    #[must_use]
    pub const fn from(&self) -> Option<&Address> {
        self.from.as_ref()
    }

    /// Returns the recipient address.
    #[must_use]
    pub const fn to(&self) -> Option<&Address> {
        self.to.as_ref()
    }

    /// Returns the stanza's own `id` attribute.
    #[must_use]
    pub const fn remote_id(&self) -> Option<&MessageId> {
        self.remote_id.as_ref()
    }

    /// Returns the body text.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the error text on error stanzas.
    #[must_use]
    pub fn error_text(&self) -> Option<&str> {
        self.error_text.as_deref()
    }

    /// Returns the text a reader would see for this stanza: the error
    /// text for error stanzas, the body otherwise.
    #[must_use]
    pub fn visible_body(&self) -> Option<&str> {
        match self.kind {
            StanzaKind::Error => self.error_text.as_deref().or(self.body.as_deref()),
            _ => self.body.as_deref(),
        }
    }

    /// Returns the chat state element.
    #[must_use]
    pub const fn chat_state(&self) -> Option<ChatState> {
        self.chat_state
    }

    /// Returns the XEP-0308 replace target, if this stanza corrects an
    /// earlier message.
    #[must_use]
    pub const fn correction_target(&self) -> Option<&MessageId> {
        self.correction_target.as_ref()
    }

    /// Returns `true` if the sender requested a delivery receipt.
    #[must_use]
    pub const fn receipt_request(&self) -> bool {
        self.receipt_request
    }

    /// Returns the acknowledged message id, if this stanza is a receipt.
    #[must_use]
    pub const fn receipt_ack(&self) -> Option<&MessageId> {
        self.receipt_ack.as_ref()
    }

    /// Returns the chat marker elements.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Returns the client-assigned origin id.
    #[must_use]
    pub const fn origin_id(&self) -> Option<&MessageId> {
        self.origin_id.as_ref()
    }

    /// Returns the archive-assigned stable ids with their archiving
    /// addresses, in document order.
    #[must_use]
    pub fn archive_ids(&self) -> &[(Address, MessageId)] {
        &self.archive_ids
    }

    /// Returns the delayed-delivery timestamp.
    #[must_use]
    pub const fn delay(&self) -> Option<DateTime<Utc>> {
        self.delay
    }

    /// Returns the out-of-band attachment URL.
    #[must_use]
    pub fn oob_url(&self) -> Option<&str> {
        self.oob_url.as_deref()
    }

    /// Returns `true` if the stanza is a replayed archive entry.
    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.archived
    }

    /// Returns the forwarded payload, present on carbon copies.
    #[must_use]
    pub fn forwarded(&self) -> Option<&StanzaView> {
        self.forwarded.as_deref()
    }

    /// Returns `true` if the forwarded payload is a carbon copy of a
    /// message received by another of the account's resources.
    #[must_use]
    pub const fn is_carbon_copy(&self) -> bool {
        self.carbon_copy
    }

    /// Returns the extension elements keyed by namespace.
    #[must_use]
    pub const fn extensions(&self) -> &BTreeMap<String, Value> {
        &self.extensions
    }

    /// Returns `true` if the stanza carries content worth opening a
    /// conversation for: a body or a known extension payload.
    ///
    /// Receipts, markers and chat-state-only stanzas for unknown
    /// conversations must not cause session creation.
    #[must_use]
    pub fn has_visible_content(&self) -> bool {
        self.body.is_some() || !self.extensions.is_empty()
    }
}

/// Builder for [`StanzaView`], used by transports and tests.
#[derive(Debug)]
pub struct StanzaViewBuilder {
    view: StanzaView,
}

impl StanzaViewBuilder {
    fn new(kind: StanzaKind) -> Self {
        Self {
            view: StanzaView {
                kind,
                from: None,
                to: None,
                remote_id: None,
                body: None,
                error_text: None,
                chat_state: None,
                correction_target: None,
                receipt_request: false,
                receipt_ack: None,
                markers: Vec::new(),
                origin_id: None,
                archive_ids: Vec::new(),
                delay: None,
                oob_url: None,
                archived: false,
                forwarded: None,
                carbon_copy: false,
                extensions: BTreeMap::new(),
            },
        }
    }

    /// Sets the sender address.
    #[must_use]
    pub fn from(mut self, from: Address) -> Self {
        self.view.from = Some(from);
        self
    }

    /// Sets the recipient address.
    #[must_use]
    pub fn to(mut self, to: Address) -> Self {
        self.view.to = Some(to);
        self
    }

    /// Sets the stanza's `id` attribute.
    #[must_use]
    pub fn remote_id(mut self, id: impl Into<MessageId>) -> Self {
        self.view.remote_id = Some(id.into());
        self
    }

    /// Sets the body text.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.view.body = Some(body.into());
        self
    }

    /// Sets the error text (error stanzas).
    #[must_use]
    pub fn error_text(mut self, text: impl Into<String>) -> Self {
        self.view.error_text = Some(text.into());
        self
    }

    /// Sets the chat state element.
    #[must_use]
    pub const fn chat_state(mut self, state: ChatState) -> Self {
        self.view.chat_state = Some(state);
        self
    }

    /// Sets the XEP-0308 replace target.
    #[must_use]
    pub fn correction_target(mut self, id: impl Into<MessageId>) -> Self {
        self.view.correction_target = Some(id.into());
        self
    }

    /// Marks the stanza as requesting a delivery receipt.
    #[must_use]
    pub const fn receipt_request(mut self) -> Self {
        self.view.receipt_request = true;
        self
    }

    /// Sets the acknowledged message id (receipt stanzas).
    #[must_use]
    pub fn receipt_ack(mut self, id: impl Into<MessageId>) -> Self {
        self.view.receipt_ack = Some(id.into());
        self
    }

    /// Adds a chat marker element.
    #[must_use]
    pub fn marker(mut self, marker: Marker) -> Self {
        self.view.markers.push(marker);
        self
    }

    /// Sets the client-assigned origin id.
    #[must_use]
    pub fn origin_id(mut self, id: impl Into<MessageId>) -> Self {
        self.view.origin_id = Some(id.into());
        self
    }

    /// Adds an archive-assigned stable id scoped to an archiving address.
    #[must_use]
    pub fn archive_id(mut self, by: Address, id: impl Into<MessageId>) -> Self {
        self.view.archive_ids.push((by, id.into()));
        self
    }

    /// Sets the delayed-delivery timestamp.
    #[must_use]
    pub const fn delay(mut self, stamp: DateTime<Utc>) -> Self {
        self.view.delay = Some(stamp);
        self
    }

    /// Sets the out-of-band attachment URL.
    #[must_use]
    pub fn oob_url(mut self, url: impl Into<String>) -> Self {
        self.view.oob_url = Some(url.into());
        self
    }

    /// Marks the stanza as a replayed archive entry.
    #[must_use]
    pub const fn archived(mut self) -> Self {
        self.view.archived = true;
        self
    }

    /// Wraps a forwarded payload as a received carbon copy.
    #[must_use]
    pub fn carbon(mut self, inner: StanzaView) -> Self {
        self.view.forwarded = Some(Box::new(inner));
        self.view.carbon_copy = true;
        self
    }

    /// Wraps a plain forwarded payload (non-carbon).
    #[must_use]
    pub fn forwarded(mut self, inner: StanzaView) -> Self {
        self.view.forwarded = Some(Box::new(inner));
        self
    }

    /// Adds an extension payload keyed by namespace.
    #[must_use]
    pub fn extension(mut self, namespace: impl Into<String>, payload: Value) -> Self {
        self.view.extensions.insert(namespace.into(), payload);
        self
    }

    /// Finalises the view.
    #[must_use]
    pub fn build(self) -> StanzaView {
        self.view
    }
}
