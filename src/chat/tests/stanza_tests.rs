//! Tests for stanza views, attribute extraction and outbound building.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use super::fixtures::{account, addr, peer, peer_full};
use crate::chat::domain::{
    ChatState, ConversationId, DeliveryHint, Direction, Marker, MarkerKind, MessageAttributes,
    MessageId, MessageRecord, RecordKind, StanzaBuilder, StanzaKind, StanzaView,
};
use chrono::{DateTime, Duration, Utc};
use rstest::{fixture, rstest};

#[fixture]
fn now() -> DateTime<Utc> {
    "2026-08-01T12:00:00Z".parse().expect("valid timestamp")
}

// ============================================================================
// StanzaView
// ============================================================================

#[rstest]
fn visible_body_prefers_error_text_on_error_stanzas() {
    let stanza = StanzaView::builder(StanzaKind::Error)
        .from(peer_full())
        .body("original text")
        .error_text("service unavailable")
        .build();
    assert_eq!(stanza.visible_body(), Some("service unavailable"));

    let plain = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("hello")
        .error_text("ignored")
        .build();
    assert_eq!(plain.visible_body(), Some("hello"));
}

#[rstest]
fn has_visible_content_requires_a_body_or_extension() {
    let bare = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .chat_state(ChatState::Composing)
        .build();
    assert!(!bare.has_visible_content());

    let with_body = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("hi")
        .build();
    assert!(with_body.has_visible_content());

    let with_extension = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .extension("urn:example:custom", serde_json::json!({"k": "v"}))
        .build();
    assert!(with_extension.has_visible_content());
}

#[rstest]
fn carbon_wraps_the_forwarded_payload() {
    let inner = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("forwarded")
        .build();
    let outer = StanzaView::builder(StanzaKind::Chat)
        .from(account().bare())
        .carbon(inner)
        .build();
    assert!(outer.is_carbon_copy());
    assert_eq!(
        outer.forwarded().and_then(StanzaView::body),
        Some("forwarded")
    );
}

// ============================================================================
// MessageAttributes
// ============================================================================

#[rstest]
fn extract_returns_none_without_a_sender(now: DateTime<Utc>) {
    let stanza = StanzaView::builder(StanzaKind::Chat).body("hi").build();
    assert!(MessageAttributes::extract(&stanza, &account(), now).is_none());
}

#[rstest]
fn extract_prefers_the_delay_stamp(now: DateTime<Utc>) {
    let sent_at = now - Duration::hours(2);
    let stanza = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("hi")
        .delay(sent_at)
        .build();

    let attrs = MessageAttributes::extract(&stanza, &account(), now).expect("attributes");

    assert_eq!(attrs.timestamp, sent_at);
    assert!(attrs.delayed);
    assert_eq!(attrs.sender, peer());
    assert_eq!(attrs.direction, Direction::Incoming);
}

#[rstest]
fn extract_derives_outgoing_direction_for_own_messages(now: DateTime<Utc>) {
    let stanza = StanzaView::builder(StanzaKind::Chat)
        .from(addr("me@example.org/phone"))
        .to(peer())
        .body("hi")
        .build();

    let attrs = MessageAttributes::extract(&stanza, &account(), now).expect("attributes");

    assert_eq!(attrs.direction, Direction::Outgoing);
}

#[rstest]
fn extract_falls_back_to_generic_error_text(now: DateTime<Utc>) {
    let stanza = StanzaView::builder(StanzaKind::Error).from(peer_full()).build();

    let attrs = MessageAttributes::extract(&stanza, &account(), now).expect("attributes");

    assert_eq!(attrs.body.as_deref(), Some("Sorry, an error occurred"));
    assert_eq!(attrs.record_kind(), RecordKind::Error);
}

#[rstest]
fn extract_takes_the_nickname_from_the_room_resource(now: DateTime<Utc>) {
    let stanza = StanzaView::builder(StanzaKind::GroupChat)
        .from(addr("room@conference.example.org/alice"))
        .body("hi all")
        .build();

    let attrs = MessageAttributes::extract(&stanza, &account(), now).expect("attributes");

    assert_eq!(attrs.nickname.as_deref(), Some("alice"));
    assert_eq!(attrs.record_kind(), RecordKind::GroupChat);
}

#[rstest]
fn bodyless_chat_state_maps_to_a_state_only_record(now: DateTime<Utc>) {
    let stanza = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .chat_state(ChatState::Composing)
        .build();

    let attrs = MessageAttributes::extract(&stanza, &account(), now).expect("attributes");

    assert!(attrs.is_actionable());
    assert_eq!(attrs.record_kind(), RecordKind::ChatStateOnly);
}

#[rstest]
fn preferred_id_takes_origin_id_over_archive_id(now: DateTime<Utc>) {
    let stanza = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("hi")
        .origin_id("o1")
        .archive_id(peer(), "s1")
        .build();

    let attrs = MessageAttributes::extract(&stanza, &account(), now).expect("attributes");

    assert_eq!(attrs.preferred_id(&account()), Some(MessageId::new("o1")));
}

#[rstest]
fn preferred_id_accepts_an_archive_id_from_the_own_archive(now: DateTime<Utc>) {
    let stanza = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("hi")
        .archive_id(addr("me@example.org"), "s1")
        .build();

    let attrs = MessageAttributes::extract(&stanza, &account(), now).expect("attributes");

    assert_eq!(attrs.preferred_id(&account()), Some(MessageId::new("s1")));
}

#[rstest]
fn preferred_id_ignores_archive_ids_from_third_parties(now: DateTime<Utc>) {
    let stanza = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("hi")
        .archive_id(addr("elsewhere.org"), "s1")
        .build();

    let attrs = MessageAttributes::extract(&stanza, &account(), now).expect("attributes");

    assert!(attrs.preferred_id(&account()).is_none());
}

// ============================================================================
// StanzaBuilder
// ============================================================================

#[rstest]
fn message_carries_body_state_and_receipt_request(now: DateTime<Utc>) {
    let record = MessageRecord::builder(
        MessageId::new("m1"),
        ConversationId::from_address(&peer()),
        account().bare(),
        Direction::Outgoing,
    )
    .body("hello")
    .origin_id(MessageId::new("m1"))
    .build(now);
    let builder = StanzaBuilder::new(account());

    let stanza = builder.message(&record, &peer(), StanzaKind::Chat);

    assert_eq!(stanza.id.as_str(), "m1");
    assert_eq!(stanza.body.as_deref(), Some("hello"));
    assert_eq!(stanza.chat_state, Some(ChatState::Active));
    assert!(stanza.receipt_request);
    assert!(stanza.correction_target.is_none());
    assert_eq!(stanza.origin_id, Some(MessageId::new("m1")));
}

#[rstest]
fn message_marks_corrections_with_the_delivery_id(now: DateTime<Utc>) {
    let mut record = MessageRecord::builder(
        MessageId::new("m1"),
        ConversationId::from_address(&peer()),
        account().bare(),
        Direction::Outgoing,
    )
    .body("hello")
    .origin_id(MessageId::new("m1"))
    .build(now);
    record.supersede(Some("hello there".to_owned()), now, now, None);
    record.set_origin_id(MessageId::new("fresh"));
    let builder = StanzaBuilder::new(account());

    let stanza = builder.message(&record, &peer(), StanzaKind::Chat);

    assert_eq!(stanza.id.as_str(), "fresh");
    assert_eq!(stanza.correction_target, Some(MessageId::new("m1")));
    assert_eq!(stanza.body.as_deref(), Some("hello there"));
}

#[rstest]
fn group_chat_messages_request_no_receipt(now: DateTime<Utc>) {
    let record = MessageRecord::builder(
        MessageId::new("m1"),
        ConversationId::from_address(&peer()),
        account().bare(),
        Direction::Outgoing,
    )
    .kind(RecordKind::GroupChat)
    .body("hi all")
    .build(now);
    let builder = StanzaBuilder::new(account());

    let stanza = builder.message(&record, &peer(), StanzaKind::GroupChat);

    assert!(!stanza.receipt_request);
}

#[rstest]
fn receipt_ack_is_hinted_for_storage() {
    let builder = StanzaBuilder::new(account());
    let stanza = builder.receipt_ack(&peer_full(), &"m1".into());

    assert_eq!(stanza.receipt_ack, Some(MessageId::new("m1")));
    assert_eq!(stanza.hints, vec![DeliveryHint::Store]);
    assert!(stanza.body.is_none());
}

#[rstest]
fn marker_references_the_target_message() {
    let builder = StanzaBuilder::new(account());
    let stanza = builder.marker(&peer_full(), &"m1".into(), MarkerKind::Received);

    assert_eq!(
        stanza.marker,
        Some(Marker::new(MarkerKind::Received, Some(MessageId::new("m1"))))
    );
}

#[rstest]
fn chat_state_is_hinted_against_storage() {
    let builder = StanzaBuilder::new(account());
    let stanza = builder.chat_state(&peer(), ChatState::Composing);

    assert_eq!(stanza.chat_state, Some(ChatState::Composing));
    assert_eq!(
        stanza.hints,
        vec![DeliveryHint::NoStore, DeliveryHint::NoPermanentStore]
    );
}
