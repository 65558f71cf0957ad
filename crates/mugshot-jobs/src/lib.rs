#![warn(missing_docs)]
//! # mugshot-jobs
//!
//! ## Purpose
//! Submits mugshot generation jobs and waits for them to finish.
//!
//! ## Responsibilities
//! - Build the fixed job descriptor for an uploaded asset.
//! - Poll the status endpoint at a fixed cadence until a terminal status.
//! - Extract the result media URL from the terminal payload.
//!
//! ## Data flow
//! Public asset URL -> [`JobClient::submit`] -> [`SubmittedJob`] ->
//! [`JobClient::poll`] -> [`StatusResponse`] -> [`extract_result_url`].
//!
//! ## Error model
//! Each failure mode maps to one [`JobError`] variant. Nothing is retried.
//!
//! ## Compatibility notes
//! The `result` field has appeared both as an object and as an array, and
//! the URL under three different keys. [`extract_result_url`] accepts all of
//! them; it is a shim, not a statement of the service schema.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mugshot_core::{CoreError, JobStatus, MediaKind, ServiceConfig, TextResponse, TransportError};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Delay between status requests.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Maximum number of status requests before giving up.
pub const MAX_POLLS: u32 = 60;

/// Keys inspected for the result URL, highest priority first.
pub const RESULT_URL_KEYS: [&str; 3] = ["mediaUrl", "video", "image"];

const MUGSHOT_MODEL: &str = "image-effects";
const MUGSHOT_EFFECT_ID: &str = "mugshot";
const GENERIC_FAILURE: &str = "Job processing failed";

/// HTTP operations the job client depends on.
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// `POST`s `body` as JSON to `endpoint`.
    async fn post_json(&self, endpoint: &Url, body: &Value) -> Result<TextResponse, TransportError>;

    /// `GET`s `endpoint`, accepting a JSON body.
    async fn get_json(&self, endpoint: &Url) -> Result<TextResponse, TransportError>;
}

/// Job descriptor posted to the job endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    /// Model name.
    pub model: String,
    /// Tool family.
    pub tool_type: String,
    /// Effect applied to the input image.
    pub effect_id: String,
    /// Public URL of the uploaded input.
    pub image_url: String,
    /// Static user id.
    pub user_id: String,
    /// Ask the service to strip its watermark.
    pub remove_watermark: bool,
    /// Keep the output out of public galleries.
    pub is_private: bool,
}

impl JobRequest {
    /// The fixed mugshot descriptor for `image_url`.
    pub fn mugshot(image_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            model: MUGSHOT_MODEL.to_string(),
            tool_type: MUGSHOT_MODEL.to_string(),
            effect_id: MUGSHOT_EFFECT_ID.to_string(),
            image_url: image_url.into(),
            user_id: user_id.into(),
            remove_watermark: true,
            is_private: true,
        }
    }
}

/// Submit response. Fields other than `jobId` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedJob {
    /// Server-assigned job id. Numeric ids are kept in their decimal form.
    #[serde(deserialize_with = "job_id_text")]
    pub job_id: String,
}

/// Status response body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    /// Reported job status; `null` or absent reads as [`JobStatus::Unknown`].
    #[serde(default = "unknown_status", deserialize_with = "status_or_unknown")]
    pub status: JobStatus,
    /// Result payload: an object or an array of objects.
    #[serde(default)]
    pub result: Option<Value>,
    /// Server failure detail.
    #[serde(default)]
    pub error: Option<Value>,
    /// Everything else the service sent.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl StatusResponse {
    /// Message to report for a failed job.
    pub fn failure_message(&self) -> String {
        match &self.error {
            Some(Value::String(message)) if !message.is_empty() => message.clone(),
            Some(Value::Null) | None => GENERIC_FAILURE.to_string(),
            Some(Value::String(_)) => GENERIC_FAILURE.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

fn unknown_status() -> JobStatus {
    JobStatus::Unknown
}

fn status_or_unknown<'de, D>(deserializer: D) -> Result<JobStatus, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<JobStatus>::deserialize(deserializer)?.unwrap_or(JobStatus::Unknown))
}

fn job_id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::invalid_type(
            de::Unexpected::Other(&other.to_string()),
            &"a string or numeric job id",
        )),
    }
}

/// Progress notification for one non-terminal status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollProgress {
    /// 1-based request count.
    pub attempt: u32,
    /// Status reported by that request.
    pub status: JobStatus,
}

/// Result media of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMedia {
    /// Media URL.
    pub url: String,
    /// Image or video, derived from the URL.
    pub kind: MediaKind,
}

impl GeneratedMedia {
    /// Classifies `url` and wraps it.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let kind = MediaKind::from_url(&url);
        Self { url, kind }
    }
}

/// Extracts the result media URL from a terminal status payload.
///
/// # Errors
/// Returns [`JobError::MissingResult`] when no candidate key holds a
/// non-empty string.
pub fn extract_result_url(response: &StatusResponse) -> Result<String, JobError> {
    let item = match response.result.as_ref() {
        Some(Value::Array(items)) => items.first(),
        other => other,
    };

    item.and_then(|item| {
        RESULT_URL_KEYS
            .iter()
            .find_map(|key| item.get(*key).and_then(Value::as_str).filter(|url| !url.is_empty()))
    })
    .map(str::to_string)
    .ok_or(JobError::MissingResult)
}

/// Client for the generation job service.
#[derive(Clone)]
pub struct JobClient {
    config: ServiceConfig,
    transport: Arc<dyn JobTransport>,
}

impl JobClient {
    /// Creates a client using [`POLL_INTERVAL`] and [`MAX_POLLS`].
    pub fn new(config: ServiceConfig, transport: Arc<dyn JobTransport>) -> Self {
        Self { config, transport }
    }

    /// Submits a mugshot job for the uploaded asset at `image_url`.
    ///
    /// # Errors
    /// Returns [`JobError::Submit`] on a non-success status and
    /// [`JobError::InvalidResponse`] when the body lacks a job id.
    pub async fn submit(&self, image_url: &str) -> Result<SubmittedJob, JobError> {
        let endpoint = self.config.submit_endpoint()?;
        let body = serde_json::to_value(JobRequest::mugshot(image_url, self.config.user_id()))?;

        let reply = self.transport.post_json(&endpoint, &body).await?;
        if !reply.is_success() {
            return Err(JobError::Submit {
                status: reply.status,
            });
        }

        let submitted: SubmittedJob = serde_json::from_str(&reply.body)?;
        if submitted.job_id.trim().is_empty() {
            return Err(JobError::InvalidResponse("jobId is empty".to_string()));
        }

        tracing::info!(job_id = %submitted.job_id, "generation job submitted");
        Ok(submitted)
    }

    /// Polls `job_id` until it reaches a terminal status.
    ///
    /// Requests are strictly sequential. After every non-terminal response
    /// `on_progress` is called and the client sleeps for the poll interval.
    ///
    /// # Errors
    /// - [`JobError::Failed`] for `failed`/`error` statuses.
    /// - [`JobError::StatusCheck`] for a non-success HTTP status.
    /// - [`JobError::Timeout`] after the attempt ceiling.
    pub async fn poll<F>(&self, job_id: &str, mut on_progress: F) -> Result<StatusResponse, JobError>
    where
        F: FnMut(PollProgress),
    {
        let endpoint = self.config.status_endpoint(job_id)?;

        for attempt in 1..=MAX_POLLS {
            let reply = self.transport.get_json(&endpoint).await?;
            if !reply.is_success() {
                return Err(JobError::StatusCheck {
                    status: reply.status,
                });
            }

            let response: StatusResponse = serde_json::from_str(&reply.body)?;
            match response.status {
                JobStatus::Completed => {
                    tracing::info!(job_id, attempt, "generation job completed");
                    return Ok(response);
                }
                status if status.is_failure() => {
                    let message = response.failure_message();
                    tracing::warn!(job_id, attempt, %message, "generation job failed");
                    return Err(JobError::Failed { message });
                }
                status => {
                    tracing::debug!(job_id, attempt, ?status, "generation job pending");
                    on_progress(PollProgress { attempt, status });
                }
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }

        Err(JobError::Timeout {
            attempts: MAX_POLLS,
        })
    }
}

/// Job submission and polling failures.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job creation was rejected.
    #[error("Failed to submit job: status {status}")]
    Submit {
        /// HTTP status of the submit request.
        status: u16,
    },
    /// A status request was rejected.
    #[error("Failed to check status: status {status}")]
    StatusCheck {
        /// HTTP status of the status request.
        status: u16,
    },
    /// The service reported the job as failed.
    #[error("{message}")]
    Failed {
        /// Server-supplied message or a generic fallback.
        message: String,
    },
    /// No terminal status within the attempt ceiling.
    #[error("Job timed out after {attempts} polls")]
    Timeout {
        /// Requests made before giving up.
        attempts: u32,
    },
    /// The terminal payload has no usable media URL.
    #[error("No result URL found in response")]
    MissingResult,
    /// A body did not match the expected shape.
    #[error("invalid job response: {0}")]
    InvalidResponse(String),
    /// JSON encoding or decoding failed.
    #[error("job payload codec failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// A request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Endpoint construction failed.
    #[error(transparent)]
    Config(#[from] CoreError),
}
