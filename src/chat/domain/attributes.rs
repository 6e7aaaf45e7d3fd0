//! Extraction of message attributes from an inbound stanza.
//!
//! The ingestion pipeline works on this flattened view rather than on
//! the raw stanza: logical send time resolved (delayed-delivery stamp
//! wins over arrival time), sender split into bare/full form, direction
//! derived, and the identifier candidates collected.

use super::address::Address;
use super::ids::MessageId;
use super::record::{Direction, RecordKind};
use super::stanza::{ChatState, StanzaKind, StanzaView};
use chrono::{DateTime, Utc};

/// Fallback body for error stanzas that carry no error text.
const GENERIC_ERROR_TEXT: &str = "Sorry, an error occurred";

/// Flattened attributes of one inbound message stanza.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageAttributes {
    /// Bare sender address.
    pub sender: Address,
    /// Sender address exactly as carried by the stanza.
    pub full_sender: Address,
    /// Outgoing (self-sent/carbon) or incoming.
    pub direction: Direction,
    /// Body text; error text for error stanzas.
    pub body: Option<String>,
    /// Chat state element.
    pub chat_state: Option<ChatState>,
    /// Logical send time.
    pub timestamp: DateTime<Utc>,
    /// Whether the timestamp came from delayed-delivery metadata.
    pub delayed: bool,
    /// Whether the stanza was a replayed archive entry.
    pub archived: bool,
    /// XEP-0308 replace target.
    pub correction_target: Option<MessageId>,
    /// The stanza's own `id` attribute.
    pub remote_id: Option<MessageId>,
    /// Client-assigned origin id.
    pub origin_id: Option<MessageId>,
    /// Archive-assigned ids with their archiving addresses.
    pub archive_ids: Vec<(Address, MessageId)>,
    /// Out-of-band attachment URL.
    pub oob_url: Option<String>,
    /// Room nickname, for group chat stanzas.
    pub nickname: Option<String>,
    /// Stanza kind the attributes were extracted from.
    pub stanza_kind: StanzaKind,
}

impl MessageAttributes {
    /// Extracts attributes from a stanza.
    ///
    /// Returns `None` when the stanza carries no sender, in which case
    /// it cannot be attributed to any conversation.
    #[must_use]
    pub fn extract(stanza: &StanzaView, account: &Address, now: DateTime<Utc>) -> Option<Self> {
        let full_sender = stanza.from()?.clone();
        let sender = full_sender.bare();
        let direction = if sender.same_bare(account) {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };
        let body = match stanza.kind() {
            StanzaKind::Error => Some(
                stanza
                    .visible_body()
                    .unwrap_or(GENERIC_ERROR_TEXT)
                    .to_owned(),
            ),
            _ => stanza.body().map(str::to_owned),
        };
        let nickname = match stanza.kind() {
            StanzaKind::GroupChat => full_sender.resource().map(str::to_owned),
            _ => None,
        };
        Some(Self {
            sender,
            full_sender,
            direction,
            body,
            chat_state: stanza.chat_state(),
            timestamp: stanza.delay().unwrap_or(now),
            delayed: stanza.delay().is_some(),
            archived: stanza.is_archived(),
            correction_target: stanza.correction_target().cloned(),
            remote_id: stanza.remote_id().cloned(),
            origin_id: stanza.origin_id().cloned(),
            archive_ids: stanza.archive_ids().to_vec(),
            oob_url: stanza.oob_url().map(str::to_owned),
            nickname,
            stanza_kind: stanza.kind(),
        })
    }

    /// Returns `true` if the attributes represent something worth
    /// appending: a chat state or a body.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        self.chat_state.is_some() || self.body.is_some()
    }

    /// Returns the record kind these attributes map to.
    ///
    /// A bodyless stanza carrying only a chat state becomes a
    /// self-expiring `ChatStateOnly` record.
    #[must_use]
    pub fn record_kind(&self) -> RecordKind {
        match self.stanza_kind {
            StanzaKind::Error => RecordKind::Error,
            StanzaKind::GroupChat => RecordKind::GroupChat,
            StanzaKind::Chat | StanzaKind::Normal | StanzaKind::Headline => {
                if self.body.is_none() && self.chat_state.is_some() {
                    RecordKind::ChatStateOnly
                } else {
                    RecordKind::Normal
                }
            }
        }
    }

    /// Returns the preferred stable record id: the origin id first, then
    /// an archive id assigned by the sender or by the local account's own
    /// archive.
    ///
    /// Callers fall back to a freshly generated id when both are absent.
    #[must_use]
    pub fn preferred_id(&self, account: &Address) -> Option<MessageId> {
        if let Some(origin) = &self.origin_id {
            return Some(origin.clone());
        }
        self.archive_ids
            .iter()
            .find(|(by, _)| by.same_bare(&self.sender) || by.same_bare(account))
            .map(|(_, id)| id.clone())
    }
}
