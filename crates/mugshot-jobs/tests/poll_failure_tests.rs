//! Integration tests for server-reported failures during polling.

mod common;

use std::sync::Arc;

use mugshot_core::TextResponse;
use mugshot_jobs::JobError;
use serde_json::json;

#[tokio::test(start_paused = true)]
async fn poll_failure_tests_carries_server_message() {
    let transport = common::ScriptedJobs::polling(
        vec![
            json!({"status": "processing"}),
            json!({"status": "failed", "error": "bad input"}),
        ],
        json!({"status": "processing"}),
    );
    let client = common::client(transport.clone());

    let error = client.poll("job-1", |_| {}).await.expect_err("poll should fail");

    match error {
        JobError::Failed { message } => assert_eq!(message, "bad input"),
        other => panic!("expected job failure, got {other:?}"),
    }
    assert_eq!(transport.status_request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn poll_failure_tests_treats_error_status_as_terminal() {
    let transport = common::ScriptedJobs::polling(
        vec![json!({"status": "error"})],
        json!({"status": "processing"}),
    );
    let client = common::client(transport.clone());

    let error = client.poll("job-1", |_| {}).await.expect_err("poll should fail");

    assert_eq!(error.to_string(), "Job processing failed");
    assert_eq!(transport.status_request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn poll_failure_tests_stops_on_rejected_status_request() {
    struct Rejecting;

    #[async_trait::async_trait]
    impl mugshot_jobs::JobTransport for Rejecting {
        async fn post_json(
            &self,
            _endpoint: &url::Url,
            _body: &serde_json::Value,
        ) -> Result<TextResponse, mugshot_core::TransportError> {
            Ok(TextResponse::new(200, "{}"))
        }

        async fn get_json(
            &self,
            _endpoint: &url::Url,
        ) -> Result<TextResponse, mugshot_core::TransportError> {
            Ok(TextResponse::new(502, "bad gateway"))
        }
    }

    let client = mugshot_jobs::JobClient::new(Default::default(), Arc::new(Rejecting));
    let error = client.poll("job-1", |_| {}).await.expect_err("poll should fail");

    assert!(matches!(error, JobError::StatusCheck { status: 502 }));
}

#[tokio::test(start_paused = true)]
async fn poll_failure_tests_null_status_keeps_polling() {
    let transport = common::ScriptedJobs::polling(
        vec![
            json!({"status": null}),
            json!({"status": "completed", "result": {"image": "https://cdn.test/a.png"}}),
        ],
        json!({"status": "processing"}),
    );
    let client = common::client(transport.clone());
    let mut seen = Vec::new();

    let response = client
        .poll("job-1", |progress| seen.push(progress.status))
        .await
        .expect("null status should not end the job");

    assert_eq!(response.status, mugshot_core::JobStatus::Completed);
    assert_eq!(seen, vec![mugshot_core::JobStatus::Unknown]);
    assert_eq!(transport.status_request_count(), 2);
}
