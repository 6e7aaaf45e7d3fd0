//! Tests for three-tier duplicate detection.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use super::fixtures::{account, addr, peer, peer_full};
use crate::chat::adapters::memory::StaticCapabilityDiscovery;
use crate::chat::domain::{
    ConversationId, Direction, MessageAttributes, MessageId, MessageRecord, StanzaKind, StanzaView,
    Timeline, ns,
};
use crate::chat::services::Deduplicator;
use chrono::{DateTime, Utc};
use rstest::{fixture, rstest};
use std::sync::Arc;

#[fixture]
fn now() -> DateTime<Utc> {
    "2026-08-01T12:00:00Z".parse().expect("valid timestamp")
}

fn attrs_for(stanza: &StanzaView, now: DateTime<Utc>) -> MessageAttributes {
    MessageAttributes::extract(stanza, &account(), now).expect("attributes")
}

fn timeline_with(record: MessageRecord) -> Timeline {
    let mut timeline = Timeline::new();
    timeline.insert(record).expect("insert");
    timeline
}

fn incoming(id: &str, now: DateTime<Utc>) -> MessageRecord {
    MessageRecord::builder(
        MessageId::new(id),
        ConversationId::from_address(&peer()),
        peer(),
        Direction::Incoming,
    )
    .body("hi")
    .timestamp(now)
    .build(now)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn origin_id_from_the_same_sender_is_a_duplicate(now: DateTime<Utc>) {
    let record = MessageRecord::builder(
        MessageId::new("o1"),
        ConversationId::from_address(&peer()),
        peer(),
        Direction::Incoming,
    )
    .body("hi")
    .origin_id(MessageId::new("o1"))
    .timestamp(now)
    .build(now);
    let timeline = timeline_with(record);
    let dedup = Deduplicator::new(Arc::new(StaticCapabilityDiscovery::new()));

    let replay = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("hi")
        .origin_id("o1")
        .build();

    let hit = dedup.resolve(&attrs_for(&replay, now), &timeline).await;

    assert_eq!(hit, Some(MessageId::new("o1")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn origin_id_from_a_different_sender_is_not_a_duplicate(now: DateTime<Utc>) {
    let record = MessageRecord::builder(
        MessageId::new("o1"),
        ConversationId::from_address(&peer()),
        peer(),
        Direction::Incoming,
    )
    .body("hi")
    .origin_id(MessageId::new("o1"))
    .timestamp(now)
    .build(now);
    let timeline = timeline_with(record);
    let dedup = Deduplicator::new(Arc::new(StaticCapabilityDiscovery::new()));

    let forged = StanzaView::builder(StanzaKind::Chat)
        .from(addr("mallory@example.org/x"))
        .body("hi")
        .origin_id("o1")
        .build();

    assert!(dedup.resolve(&attrs_for(&forged, now), &timeline).await.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn archive_id_is_honoured_when_the_archiver_supports_stable_ids(now: DateTime<Utc>) {
    let archive = addr("example.org");
    let record = MessageRecord::builder(
        MessageId::new("m1"),
        ConversationId::from_address(&peer()),
        peer(),
        Direction::Incoming,
    )
    .body("hi")
    .archive_ids([(archive.clone(), MessageId::new("s1"))])
    .timestamp(now)
    .build(now);
    let timeline = timeline_with(record);
    let capabilities = StaticCapabilityDiscovery::new();
    capabilities.advertise_feature(ns::STANZA_ID, &archive);
    let dedup = Deduplicator::new(Arc::new(capabilities));

    let replay = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("hi")
        .remote_id("different-wire-id")
        .archive_id(archive, "s1")
        .build();

    let hit = dedup.resolve(&attrs_for(&replay, now), &timeline).await;

    assert_eq!(hit, Some(MessageId::new("m1")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn archive_id_is_ignored_without_stable_id_support(now: DateTime<Utc>) {
    let archive = addr("example.org");
    let record = MessageRecord::builder(
        MessageId::new("m1"),
        ConversationId::from_address(&peer()),
        peer(),
        Direction::Incoming,
    )
    .body("hi")
    .archive_ids([(archive.clone(), MessageId::new("s1"))])
    .timestamp(now)
    .build(now);
    let timeline = timeline_with(record);
    // nothing advertised: the claim is unverified
    let dedup = Deduplicator::new(Arc::new(StaticCapabilityDiscovery::new()));

    let replay = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("bye")
        .remote_id("different-wire-id")
        .archive_id(archive, "s1")
        .build();

    assert!(dedup.resolve(&attrs_for(&replay, now), &timeline).await.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn body_sender_and_id_match_is_a_duplicate(now: DateTime<Utc>) {
    let record = MessageRecord::builder(
        MessageId::new("m1"),
        ConversationId::from_address(&peer()),
        peer(),
        Direction::Incoming,
    )
    .body("hi")
    .delivery_id(MessageId::new("w1"))
    .timestamp(now)
    .build(now);
    let timeline = timeline_with(record);
    let dedup = Deduplicator::new(Arc::new(StaticCapabilityDiscovery::new()));

    let replay = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("hi")
        .remote_id("w1")
        .build();

    let hit = dedup.resolve(&attrs_for(&replay, now), &timeline).await;

    assert_eq!(hit, Some(MessageId::new("m1")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn differing_body_defeats_the_weak_tier(now: DateTime<Utc>) {
    let timeline = timeline_with(incoming("m1", now));
    let dedup = Deduplicator::new(Arc::new(StaticCapabilityDiscovery::new()));

    let stanza = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("something else")
        .remote_id("m1")
        .build();

    assert!(dedup.resolve(&attrs_for(&stanza, now), &timeline).await.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_genuinely_new_message_resolves_to_none(now: DateTime<Utc>) {
    let timeline = timeline_with(incoming("m1", now));
    let dedup = Deduplicator::new(Arc::new(StaticCapabilityDiscovery::new()));

    let stanza = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body("brand new")
        .remote_id("m2")
        .origin_id("o2")
        .build();

    assert!(dedup.resolve(&attrs_for(&stanza, now), &timeline).await.is_none());
}
