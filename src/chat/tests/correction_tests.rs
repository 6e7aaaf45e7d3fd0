//! Tests for inbound correction application.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use super::fixtures::{account, addr, peer, peer_full};
use crate::chat::domain::{
    ConversationId, Direction, MessageAttributes, MessageId, MessageRecord, StanzaKind, StanzaView,
    Timeline,
};
use crate::chat::services::CorrectionEngine;
use chrono::{DateTime, Duration, Utc};
use rstest::{fixture, rstest};

#[fixture]
fn now() -> DateTime<Utc> {
    "2026-08-01T12:00:00Z".parse().expect("valid timestamp")
}

fn original(now: DateTime<Utc>) -> MessageRecord {
    MessageRecord::builder(
        MessageId::new("m1"),
        ConversationId::from_address(&peer()),
        peer(),
        Direction::Incoming,
    )
    .body("helo")
    .delivery_id(MessageId::new("m1"))
    .origin_id(MessageId::new("o1"))
    .timestamp(now)
    .build(now)
}

fn correction_attrs(
    target: &str,
    body: &str,
    sent_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> MessageAttributes {
    let stanza = StanzaView::builder(StanzaKind::Chat)
        .from(peer_full())
        .body(body)
        .remote_id("c-wire")
        .correction_target(target)
        .delay(sent_at)
        .build();
    MessageAttributes::extract(&stanza, &account(), now).expect("attributes")
}

#[rstest]
fn newer_correction_supersedes_the_visible_version(now: DateTime<Utc>) {
    let mut timeline = Timeline::new();
    timeline.insert(original(now)).expect("insert");
    let sent_at = now + Duration::minutes(1);

    let updated = CorrectionEngine::apply(
        &correction_attrs("m1", "hello", sent_at, now),
        &mut timeline,
        now,
    );

    assert_eq!(updated, Some(MessageId::new("m1")));
    let record = timeline.get(&"m1".into()).expect("record");
    assert_eq!(record.body(), Some("hello"));
    assert_eq!(record.timestamp(), sent_at);
    assert!(record.correction().is_edited());
    assert_eq!(
        record.correction().superseded().first().and_then(|v| v.body.as_deref()),
        Some("helo")
    );
}

#[rstest]
fn correction_re_derives_the_delivery_id(now: DateTime<Utc>) {
    let mut timeline = Timeline::new();
    timeline.insert(original(now)).expect("insert");

    CorrectionEngine::apply(
        &correction_attrs("m1", "hello", now + Duration::minutes(1), now),
        &mut timeline,
        now,
    );

    // the correcting stanza's own id becomes the new reference point
    let record = timeline.get(&"m1".into()).expect("record");
    assert_eq!(record.delivery_id().as_str(), "c-wire");
}

#[rstest]
fn correction_can_target_the_origin_id(now: DateTime<Utc>) {
    let mut timeline = Timeline::new();
    timeline.insert(original(now)).expect("insert");

    let updated = CorrectionEngine::apply(
        &correction_attrs("o1", "hello", now + Duration::minutes(1), now),
        &mut timeline,
        now,
    );

    assert_eq!(updated, Some(MessageId::new("m1")));
}

#[rstest]
fn earlier_correction_still_applies_to_an_unedited_target(now: DateTime<Utc>) {
    let mut timeline = Timeline::new();
    timeline.insert(original(now)).expect("insert");
    // clock skew puts the correction's send time before the original's
    let sent_at = now - Duration::seconds(1);

    let updated = CorrectionEngine::apply(
        &correction_attrs("m1", "hello", sent_at, now),
        &mut timeline,
        now,
    );

    assert_eq!(updated, Some(MessageId::new("m1")));
    let record = timeline.get(&"m1".into()).expect("record");
    assert_eq!(record.body(), Some("hello"));
    assert_eq!(record.timestamp(), sent_at);
    assert!(record.correction().is_edited());
    assert_eq!(
        record.correction().superseded().first().and_then(|v| v.body.as_deref()),
        Some("helo")
    );
}

#[rstest]
fn out_of_order_older_correction_lands_in_history(now: DateTime<Utc>) {
    let mut timeline = Timeline::new();
    timeline.insert(original(now)).expect("insert");
    // the newest correction arrives before the middle one
    let newest = now + Duration::seconds(10);
    let middle = now + Duration::seconds(5);

    CorrectionEngine::apply(
        &correction_attrs("m1", "newest", newest, now),
        &mut timeline,
        now,
    );
    CorrectionEngine::apply(
        &correction_attrs("m1", "middle", middle, now),
        &mut timeline,
        now,
    );

    let record = timeline.get(&"m1".into()).expect("record");
    assert_eq!(record.body(), Some("newest"));
    assert_eq!(record.timestamp(), newest);
    let history: Vec<Option<&str>> = record
        .correction()
        .superseded()
        .iter()
        .map(|version| version.body.as_deref())
        .collect();
    assert_eq!(history, vec![Some("helo"), Some("middle")]);
}

#[rstest]
fn a_peer_cannot_correct_someone_elses_message(now: DateTime<Utc>) {
    let mut timeline = Timeline::new();
    timeline.insert(original(now)).expect("insert");

    let stanza = StanzaView::builder(StanzaKind::Chat)
        .from(addr("mallory@example.org/x"))
        .body("hijacked")
        .correction_target("m1")
        .build();
    let attrs = MessageAttributes::extract(&stanza, &account(), now).expect("attributes");

    let updated = CorrectionEngine::apply(&attrs, &mut timeline, now);

    assert!(updated.is_none());
    assert_eq!(
        timeline.get(&"m1".into()).and_then(MessageRecord::body),
        Some("helo")
    );
}

#[rstest]
fn unknown_target_returns_none(now: DateTime<Utc>) {
    let mut timeline = Timeline::new();
    timeline.insert(original(now)).expect("insert");

    let updated = CorrectionEngine::apply(
        &correction_attrs("missing", "hello", now + Duration::minutes(1), now),
        &mut timeline,
        now,
    );

    assert!(updated.is_none());
}
