//! Integration tests for file selection and upload through the controller.

mod common;

use common::{ASSET_HOST, FakeMedia, harness, healthy_media, photo};
use mugshot_ui::WorkflowState;

#[tokio::test]
async fn controller_upload_tests_success_enables_generation() {
    let mut h = harness(healthy_media(), Vec::new());

    h.controller.select_file(photo()).await;

    let session = h.controller.session();
    assert_eq!(session.state(), WorkflowState::Ready);
    assert!(session.generate.enabled);
    let remote = session.remote_url().expect("remote url should be set");
    assert!(remote.starts_with(&format!("{ASSET_HOST}/media/")));
    assert!(remote.ends_with(".png"));
    assert!(!remote.contains("Signature"));
}

#[tokio::test]
async fn controller_upload_tests_signed_url_failure_resets_to_idle() {
    let mut h = harness(
        FakeMedia {
            signed_status: 500,
            put_status: 200,
        },
        Vec::new(),
    );

    h.controller.select_file(photo()).await;

    assert_eq!(h.controller.session().state(), WorkflowState::Idle);
    assert!(h.controller.session().upload().is_none());
    assert!(h.controller.session().upload_zone.preview.is_none());
    assert_eq!(
        h.controller.take_alerts(),
        vec!["Upload failed: Failed to get signed URL: status 500".to_string()]
    );
}

#[tokio::test]
async fn controller_upload_tests_rejected_transfer_resets_to_idle() {
    let mut h = harness(
        FakeMedia {
            signed_status: 200,
            put_status: 403,
        },
        Vec::new(),
    );

    h.controller.select_file(photo()).await;

    assert_eq!(h.controller.session().state(), WorkflowState::Idle);
    assert!(!h.controller.session().generate.enabled);
    assert_eq!(
        h.controller.take_alerts(),
        vec!["Upload failed: Failed to upload file: status 403".to_string()]
    );
}
