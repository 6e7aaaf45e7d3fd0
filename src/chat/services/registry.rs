//! Routing of inbound stanzas to conversation sessions.
//!
//! The registry owns every open session, keyed by conversation id. It
//! establishes the routing facts a session cannot see on its own (carbon
//! unwrapping, self detection, roster membership) and creates sessions
//! lazily, only for stanzas that carry visible content.

use super::ChatContext;
use super::session::{ConversationSession, IngestFlags, IngestOutcome};
use crate::chat::domain::{Address, ConversationId, StanzaKind, StanzaView};
use crate::chat::error::ProtocolViolation;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, warn};

/// Holds and routes to every open conversation.
pub struct SessionRegistry {
    context: ChatContext,
    sessions: HashMap<ConversationId, ConversationSession>,
}

impl SessionRegistry {
    /// Creates a registry with no open sessions.
    #[must_use]
    pub fn new(context: ChatContext) -> Self {
        Self {
            context,
            sessions: HashMap::new(),
        }
    }

    /// Returns how many sessions are open.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` when no session is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Iterates over the open sessions in no particular order.
    #[must_use]
    pub fn sessions(&self) -> impl Iterator<Item = &ConversationSession> {
        self.sessions.values()
    }

    /// Routes one inbound stanza to its conversation.
    ///
    /// Unwraps carbon copies (rejecting forgeries), resolves which peer
    /// the stanza belongs to, applies admission policy, and creates the
    /// session lazily when the stanza warrants one.
    pub async fn route(&mut self, stanza: &StanzaView) -> IngestOutcome {
        if stanza.kind() == StanzaKind::Headline {
            debug!("ignoring headline stanza");
            return IngestOutcome::Dropped;
        }
        if self.context.config.filter_by_resource
            && let Some(to) = stanza.to()
            && to.resource().is_some()
            && to.resource() != self.context.account.resource()
        {
            debug!("stanza addressed to another resource; ignoring");
            return IngestOutcome::Dropped;
        }
        let Some((effective, is_carbon)) = self.unwrap_carbon(stanza) else {
            return IngestOutcome::Dropped;
        };
        let Some(from) = effective.from() else {
            debug!("stanza carries no sender; ignoring");
            return IngestOutcome::Dropped;
        };
        let is_self = from.same_bare(&self.context.account);
        let peer = if is_self {
            match effective.to() {
                Some(to) => to.bare(),
                None => {
                    warn!(violation = %ProtocolViolation::MissingRecipient, "dropping stanza");
                    return IngestOutcome::Dropped;
                }
            }
        } else {
            from.bare()
        };
        let conversation_id = ConversationId::from_address(&peer);
        if effective.kind() == StanzaKind::Error {
            if is_self {
                debug!("error stanza from own account; ignoring");
                return IngestOutcome::Dropped;
            }
            let flags = IngestFlags {
                is_carbon,
                is_self,
                is_roster_contact: false,
            };
            return match self.sessions.get_mut(&conversation_id) {
                Some(session) => session.ingest(effective, flags).await,
                None => {
                    debug!(peer = %peer, "error for unknown conversation; ignoring");
                    IngestOutcome::Dropped
                }
            };
        }
        let contact = self.context.directory.lookup(&peer).await;
        let is_roster_contact = contact.is_some();
        if !is_roster_contact && !is_self && !self.context.config.allow_non_roster_messaging {
            debug!(peer = %peer, "peer not in roster and non-roster messaging disabled");
            return IngestOutcome::Dropped;
        }
        let flags = IngestFlags {
            is_carbon,
            is_self,
            is_roster_contact,
        };
        if let Some(session) = self.sessions.get_mut(&conversation_id) {
            return session.ingest(effective, flags).await;
        }
        if !effective.has_visible_content() {
            debug!(peer = %peer, "no open session and nothing visible; ignoring");
            return IngestOutcome::Dropped;
        }
        let message_type = if effective.kind() == StanzaKind::GroupChat {
            StanzaKind::GroupChat
        } else {
            StanzaKind::Chat
        };
        let nickname = contact.and_then(|contact| contact.nickname);
        let mut session =
            ConversationSession::new(self.context.clone(), peer, message_type, nickname);
        session.restore().await;
        let outcome = session.ingest(effective, flags).await;
        self.sessions.insert(conversation_id, session);
        outcome
    }

    /// Unwraps a carbon copy, rejecting wrappers not sent by the local
    /// account.
    ///
    /// Any resource can claim to forward a carbon; accepting one from a
    /// third party would let it inject messages into arbitrary
    /// conversations.
    fn unwrap_carbon<'a>(&self, stanza: &'a StanzaView) -> Option<(&'a StanzaView, bool)> {
        if !stanza.is_carbon_copy() {
            return Some((stanza, false));
        }
        let Some(inner) = stanza.forwarded() else {
            debug!("carbon wrapper without payload; ignoring");
            return None;
        };
        match stanza.from() {
            Some(outer) if outer.same_bare(&self.context.account) => Some((inner, true)),
            Some(outer) => {
                let violation = ProtocolViolation::CarbonForgery {
                    claimed: outer.clone(),
                };
                warn!(%violation, "dropping stanza");
                None
            }
            None => {
                debug!("carbon wrapper without sender; ignoring");
                None
            }
        }
    }

    /// Returns the session for the peer, creating and restoring one when
    /// none is open yet.
    pub async fn open(&mut self, peer: &Address) -> &mut ConversationSession {
        let conversation_id = ConversationId::from_address(peer);
        match self.sessions.entry(conversation_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let nickname = self
                    .context
                    .directory
                    .lookup(peer)
                    .await
                    .and_then(|contact| contact.nickname);
                let mut session = ConversationSession::new(
                    self.context.clone(),
                    peer.clone(),
                    StanzaKind::Chat,
                    nickname,
                );
                session.restore().await;
                entry.insert(session)
            }
        }
    }

    /// Returns the open session for the peer, if any.
    #[must_use]
    pub fn get(&self, peer: &Address) -> Option<&ConversationSession> {
        self.sessions.get(&ConversationId::from_address(peer))
    }

    /// Returns the open session for the peer mutably, if any.
    pub fn get_mut(&mut self, peer: &Address) -> Option<&mut ConversationSession> {
        self.sessions.get_mut(&ConversationId::from_address(peer))
    }

    /// Closes the session for the peer, keeping its stored history.
    ///
    /// Returns `true` when a session was open.
    pub fn close(&mut self, peer: &Address) -> bool {
        self.sessions
            .remove(&ConversationId::from_address(peer))
            .is_some()
    }

    /// Resets every open session, clearing timelines and stored history.
    pub async fn reset_all(&mut self) {
        for session in self.sessions.values_mut() {
            session.reset().await;
        }
    }

    /// Purges expired ephemeral records across every open session.
    ///
    /// Returns how many records were removed.
    pub async fn purge_expired(&mut self) -> usize {
        let mut removed = 0;
        for session in self.sessions.values_mut() {
            removed += session.purge_expired().await;
        }
        removed
    }
}
