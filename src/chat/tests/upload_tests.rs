//! Tests for attachment sends over the upload port.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use super::fixtures::{Harness, addr, harness};
use crate::chat::domain::{RecordKind, UploadState, ns};
use crate::chat::ports::{FileHandle, MAX_FILE_SIZE_FIELD, ServiceItem, UploadError};
use rstest::rstest;

fn advertise_upload_service(harness: &Harness, max_file_size: Option<u64>) {
    let mut item = ServiceItem::new(addr("upload.example.org"));
    if let Some(max) = max_file_size {
        item = item.with_metadata(MAX_FILE_SIZE_FIELD, max.to_string());
    }
    harness
        .capabilities
        .advertise_items(ns::HTTP_UPLOAD, &addr("example.org"), vec![item]);
}

fn photo() -> FileHandle {
    FileHandle::new("photo.jpg", 2_048, "image/jpeg")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_upload_sends_the_file_url(harness: Harness) {
    advertise_upload_service(&harness, None);
    let mut session = harness.session();

    session.send_files(vec![photo()]).await;

    assert_eq!(session.timeline().len(), 1);
    let record = session.timeline().records().next().expect("record");
    let expected_url = "https://upload.example.org/photo.jpg";
    assert_eq!(
        record.upload(),
        Some(&UploadState::Succeeded {
            url: expected_url.to_owned()
        })
    );
    assert_eq!(record.body(), Some(expected_url));
    assert_eq!(record.oob_url(), Some(expected_url));
    let sent = harness.transport.sent();
    assert_eq!(sent.len(), 1);
    let stanza = sent.first().expect("stanza");
    assert_eq!(stanza.body.as_deref(), Some(expected_url));
    assert_eq!(stanza.oob_url.as_deref(), Some(expected_url));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn oversized_file_is_refused_locally(harness: Harness) {
    advertise_upload_service(&harness, Some(1_024));
    let mut session = harness.session();

    session.send_files(vec![photo()]).await;

    assert_eq!(harness.transport.sent_count(), 0);
    assert!(harness.uploader.uploaded().is_empty());
    let record = session.timeline().records().next().expect("error record");
    assert_eq!(record.kind(), RecordKind::Error);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_upload_service_surfaces_an_error(harness: Harness) {
    let mut session = harness.session();

    session.send_files(vec![photo()]).await;

    let record = session.timeline().records().next().expect("error record");
    assert_eq!(record.kind(), RecordKind::Error);
    assert_eq!(record.body(), Some("No file upload service available"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refused_slot_surfaces_an_error(harness: Harness) {
    advertise_upload_service(&harness, None);
    harness
        .uploader
        .refuse_slots(UploadError::slot_refused("quota exceeded"));
    let mut session = harness.session();

    session.send_files(vec![photo()]).await;

    assert_eq!(harness.transport.sent_count(), 0);
    let record = session.timeline().records().next().expect("error record");
    assert_eq!(record.kind(), RecordKind::Error);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_transfer_demotes_the_placeholder(harness: Harness) {
    advertise_upload_service(&harness, None);
    harness
        .uploader
        .fail_transfers(UploadError::transfer_failed("connection reset"));
    let mut session = harness.session();

    session.send_files(vec![photo()]).await;

    assert_eq!(harness.transport.sent_count(), 0);
    assert_eq!(session.timeline().len(), 1);
    let record = session.timeline().records().next().expect("record");
    assert_eq!(record.kind(), RecordKind::Error);
    assert!(record.expires_at().is_some());
    assert!(matches!(record.upload(), Some(UploadState::Failed { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn files_are_sent_in_order(harness: Harness) {
    advertise_upload_service(&harness, None);
    let mut session = harness.session();
    let files = vec![
        FileHandle::new("first.png", 10, "image/png"),
        FileHandle::new("second.png", 20, "image/png"),
    ];

    session.send_files(files).await;

    let uploaded: Vec<String> = harness
        .uploader
        .uploaded()
        .into_iter()
        .map(|file| file.name)
        .collect();
    assert_eq!(uploaded, vec!["first.png", "second.png"]);
    assert_eq!(session.timeline().len(), 2);
    assert_eq!(harness.transport.sent_count(), 2);
}
