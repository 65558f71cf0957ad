//! Integration tests for poll cadence, attempt ceiling, and progress reporting.

mod common;

use std::time::Duration;

use mugshot_jobs::{JobError, MAX_POLLS, POLL_INTERVAL};
use serde_json::json;

#[tokio::test(start_paused = true)]
async fn poll_timing_tests_returns_on_nth_request_at_fixed_interval() {
    let transport = common::ScriptedJobs::polling(
        vec![
            json!({"status": "queued"}),
            json!({"status": "processing"}),
            json!({"status": "processing"}),
            json!({"status": "completed", "result": {"mediaUrl": "https://cdn.test/out.png"}}),
        ],
        json!({"status": "processing"}),
    );
    let client = common::client(transport.clone());

    let mut progress = Vec::new();
    let response = client
        .poll("job-1", |update| progress.push(update.attempt))
        .await
        .expect("poll should complete");

    assert_eq!(response.status, mugshot_core::JobStatus::Completed);
    assert_eq!(progress, vec![1, 2, 3]);

    let times = transport.status_request_times();
    assert_eq!(times.len(), 4);
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], POLL_INTERVAL);
    }
}

#[tokio::test(start_paused = true)]
async fn poll_timing_tests_times_out_after_sixty_requests() {
    let transport = common::ScriptedJobs::polling(vec![], json!({"status": "processing"}));
    let client = common::client(transport.clone());
    let started = tokio::time::Instant::now();

    let error = client
        .poll("job-1", |_| {})
        .await
        .expect_err("poll should time out");

    assert!(matches!(error, JobError::Timeout { attempts: 60 }));
    assert_eq!(transport.status_request_count(), MAX_POLLS as usize);
    assert_eq!(started.elapsed(), Duration::from_secs(120));
    assert_eq!(error.to_string(), "Job timed out after 60 polls");
}

#[tokio::test(start_paused = true)]
async fn poll_timing_tests_requests_user_scoped_status_path() {
    let transport = common::ScriptedJobs::polling(
        vec![json!({"status": "completed", "result": {"image": "x"}})],
        json!({"status": "processing"}),
    );
    let client = common::client(transport.clone());

    client.poll("job-42", |_| {}).await.expect("poll should complete");

    let requests = transport.status_requests.lock().expect("request log lock");
    assert_eq!(
        requests[0].0,
        "https://api.chromastudio.ai/image-gen/DObRu1vyStbUynoQmTcHBlhs55z2/job-42/status"
    );
}
