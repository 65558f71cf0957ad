//! Shared scripted transport for job client integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mugshot_core::{ServiceConfig, TextResponse, TransportError};
use mugshot_jobs::{JobClient, JobTransport};
use serde_json::Value;
use tokio::time::Instant;
use url::Url;

/// Replays canned status replies and records when each request arrived.
pub struct ScriptedJobs {
    submit_reply: TextResponse,
    status_replies: Mutex<VecDeque<TextResponse>>,
    fallback_status: TextResponse,
    pub posted: Mutex<Vec<(String, Value)>>,
    pub status_requests: Mutex<Vec<(String, Instant)>>,
}

#[allow(dead_code)]
impl ScriptedJobs {
    /// Every status request answers with `fallback` once `replies` run out.
    pub fn new(submit_reply: TextResponse, replies: Vec<Value>, fallback: Value) -> Arc<Self> {
        Arc::new(Self {
            submit_reply,
            status_replies: Mutex::new(replies.into_iter().map(ok_json).collect()),
            fallback_status: ok_json(fallback),
            posted: Mutex::new(Vec::new()),
            status_requests: Mutex::new(Vec::new()),
        })
    }

    /// Status replies only; submit answers with job `job-1`.
    pub fn polling(replies: Vec<Value>, fallback: Value) -> Arc<Self> {
        Self::new(
            ok_json(serde_json::json!({"jobId": "job-1"})),
            replies,
            fallback,
        )
    }

    pub fn status_request_times(&self) -> Vec<Instant> {
        self.status_requests
            .lock()
            .expect("request log lock")
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }

    pub fn status_request_count(&self) -> usize {
        self.status_requests.lock().expect("request log lock").len()
    }
}

#[async_trait]
impl JobTransport for ScriptedJobs {
    async fn post_json(&self, endpoint: &Url, body: &Value) -> Result<TextResponse, TransportError> {
        self.posted
            .lock()
            .expect("post log lock")
            .push((endpoint.to_string(), body.clone()));
        Ok(self.submit_reply.clone())
    }

    async fn get_json(&self, endpoint: &Url) -> Result<TextResponse, TransportError> {
        self.status_requests
            .lock()
            .expect("request log lock")
            .push((endpoint.to_string(), Instant::now()));
        let next = self.status_replies.lock().expect("reply lock").pop_front();
        Ok(next.unwrap_or_else(|| self.fallback_status.clone()))
    }
}

pub fn ok_json(value: Value) -> TextResponse {
    TextResponse::new(200, value.to_string())
}

pub fn client(transport: Arc<ScriptedJobs>) -> JobClient {
    JobClient::new(ServiceConfig::default(), transport)
}
