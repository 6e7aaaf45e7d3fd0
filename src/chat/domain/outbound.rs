//! Outbound protocol message units and their construction.
//!
//! [`StanzaBuilder`] is a pure function of message state: it never
//! mutates records and never touches the network. The resulting
//! [`OutboundStanza`] is handed to the transport port for dispatch.

use super::address::Address;
use super::ids::MessageId;
use super::record::{MessageRecord, RecordKind};
use super::stanza::{ChatState, Marker, MarkerKind, StanzaKind};
use serde::{Deserialize, Serialize};

/// XEP-0334 processing hints attached to outbound stanzas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryHint {
    /// The stanza should be stored by the archive.
    Store,
    /// The stanza should not be stored.
    NoStore,
    /// The stanza should not be stored permanently.
    NoPermanentStore,
}

/// An outbound protocol message unit, ready for the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundStanza {
    /// Full address of the sending account.
    pub from: Address,
    /// Recipient address.
    pub to: Address,
    /// Stanza type.
    pub kind: StanzaKind,
    /// The stanza's `id` attribute.
    pub id: MessageId,
    /// Body text.
    pub body: Option<String>,
    /// Chat state element.
    pub chat_state: Option<ChatState>,
    /// Whether a delivery receipt is requested.
    pub receipt_request: bool,
    /// Receipt acknowledgment: the delivered message id.
    pub receipt_ack: Option<MessageId>,
    /// Chat marker element.
    pub marker: Option<Marker>,
    /// XEP-0308 replace target.
    pub correction_target: Option<MessageId>,
    /// Client-assigned origin id.
    pub origin_id: Option<MessageId>,
    /// Out-of-band attachment URL.
    pub oob_url: Option<String>,
    /// Processing hints.
    pub hints: Vec<DeliveryHint>,
}

/// Constructs outbound stanzas from message records.
///
/// # Examples
///
/// ```
/// use palaver::chat::domain::{Address, StanzaBuilder};
///
/// let account = Address::new("me@example.org/home").expect("valid address");
/// let peer = Address::new("alice@example.org").expect("valid address");
/// let builder = StanzaBuilder::new(account);
/// let stanza = builder.receipt_ack(&peer, &"m1".into());
/// assert_eq!(stanza.receipt_ack.as_ref().map(|id| id.as_str()), Some("m1"));
/// ```
#[derive(Debug, Clone)]
pub struct StanzaBuilder {
    account: Address,
}

impl StanzaBuilder {
    /// Creates a builder sending as the given (full) account address.
    #[must_use]
    pub const fn new(account: Address) -> Self {
        Self { account }
    }

    fn base(&self, to: &Address, kind: StanzaKind, id: MessageId) -> OutboundStanza {
        OutboundStanza {
            from: self.account.clone(),
            to: to.clone(),
            kind,
            id,
            body: None,
            chat_state: None,
            receipt_request: false,
            receipt_ack: None,
            marker: None,
            correction_target: None,
            origin_id: None,
            oob_url: None,
            hints: Vec::new(),
        }
    }

    /// Builds the wire form of a conversation message.
    ///
    /// Carries the body, an `active` chat state, a receipt request for
    /// one-on-one messages, the out-of-band URL when the record is an
    /// attachment, a replace element when the record was edited, and the
    /// record's origin id.
    #[must_use]
    pub fn message(&self, record: &MessageRecord, to: &Address, kind: StanzaKind) -> OutboundStanza {
        let id = record
            .origin_id()
            .cloned()
            .unwrap_or_else(|| record.delivery_id().clone());
        let mut stanza = self.base(to, kind, id);
        stanza.body = record.body().map(str::to_owned);
        stanza.chat_state = Some(ChatState::Active);
        stanza.receipt_request = record.kind() == RecordKind::Normal;
        stanza.oob_url = record.oob_url().map(str::to_owned);
        if record.correction().is_edited() {
            stanza.correction_target = Some(record.delivery_id().clone());
        }
        stanza.origin_id = record.origin_id().cloned();
        stanza
    }

    /// Builds a XEP-0184 delivery receipt for the given message id,
    /// hinted for archive storage.
    #[must_use]
    pub fn receipt_ack(&self, to: &Address, id: &MessageId) -> OutboundStanza {
        let mut stanza = self.base(to, StanzaKind::Chat, MessageId::generate());
        stanza.receipt_ack = Some(id.clone());
        stanza.hints.push(DeliveryHint::Store);
        stanza
    }

    /// Builds a XEP-0333 chat marker referencing the given message id.
    #[must_use]
    pub fn marker(&self, to: &Address, id: &MessageId, kind: MarkerKind) -> OutboundStanza {
        let mut stanza = self.base(to, StanzaKind::Chat, MessageId::generate());
        stanza.marker = Some(Marker::new(kind, Some(id.clone())));
        stanza
    }

    /// Builds a XEP-0085 chat state notification, hinted against
    /// storage.
    #[must_use]
    pub fn chat_state(&self, to: &Address, state: ChatState) -> OutboundStanza {
        let mut stanza = self.base(to, StanzaKind::Chat, MessageId::generate());
        stanza.chat_state = Some(state);
        stanza.hints.push(DeliveryHint::NoStore);
        stanza.hints.push(DeliveryHint::NoPermanentStore);
        stanza
    }
}
