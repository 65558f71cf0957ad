//! In-memory transports for controller integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mugshot_app::MugshotController;
use mugshot_core::{LocalFile, ServiceConfig, TextResponse, TransportError};
use mugshot_download::{
    DownloadError, DownloadHandler, DownloadSink, FetchedMedia, LinkOpener, MediaFetcher,
};
use mugshot_jobs::JobTransport;
use mugshot_upload::MediaTransport;
use serde_json::Value;
use url::Url;

pub const ASSET_HOST: &str = "https://assets.test";

pub fn config() -> ServiceConfig {
    ServiceConfig::new(
        "https://media.test",
        ASSET_HOST,
        "https://jobs.test",
        "dressr",
        "user-1",
    )
    .expect("test config should be valid")
}

pub fn photo() -> LocalFile {
    LocalFile::new("face.png", "image/png", vec![1, 2, 3])
}

/// Answers the signed-URL request with `signed_status` and every `PUT` with
/// `put_status`.
pub struct FakeMedia {
    pub signed_status: u16,
    pub put_status: u16,
}

#[async_trait]
impl MediaTransport for FakeMedia {
    async fn get_text(&self, _endpoint: &Url) -> Result<TextResponse, TransportError> {
        Ok(TextResponse::new(
            self.signed_status,
            "https://bucket.test/put?X-Signature=secret",
        ))
    }

    async fn put_bytes(
        &self,
        _signed_url: &Url,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<u16, TransportError> {
        Ok(self.put_status)
    }
}

/// Accepts every job as `job-1` and replays status bodies, then repeats the
/// last one.
pub struct FakeJobs {
    statuses: Mutex<VecDeque<Value>>,
    last: Mutex<Value>,
    pub submitted: Mutex<Vec<Value>>,
}

impl FakeJobs {
    pub fn new(statuses: Vec<Value>) -> Arc<Self> {
        let last = statuses
            .last()
            .cloned()
            .unwrap_or_else(|| serde_json::json!({"status": "processing"}));
        Arc::new(Self {
            statuses: Mutex::new(statuses.into()),
            last: Mutex::new(last),
            submitted: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl JobTransport for FakeJobs {
    async fn post_json(&self, _endpoint: &Url, body: &Value) -> Result<TextResponse, TransportError> {
        self.submitted.lock().expect("submit log").push(body.clone());
        Ok(TextResponse::new(200, r#"{"jobId":"job-1"}"#))
    }

    async fn get_json(&self, _endpoint: &Url) -> Result<TextResponse, TransportError> {
        let next = self.statuses.lock().expect("status queue").pop_front();
        let body = match next {
            Some(body) => body,
            None => self.last.lock().expect("last status").clone(),
        };
        Ok(TextResponse::new(200, body.to_string()))
    }
}

/// Fetcher that always fails, so downloads use the fallback tiers.
pub struct BlockedFetcher;

#[async_trait]
impl MediaFetcher for BlockedFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchedMedia, TransportError> {
        Err(TransportError("blocked".to_string()))
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub saved: Mutex<Vec<String>>,
}

impl DownloadSink for MemorySink {
    fn save(&self, file_name: &str, _bytes: &[u8]) -> Result<PathBuf, DownloadError> {
        self.saved.lock().expect("sink log").push(file_name.to_string());
        Ok(PathBuf::from(file_name))
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<String>>,
}

impl LinkOpener for RecordingOpener {
    fn open_in_new_tab(&self, url: &str) -> Result<(), DownloadError> {
        self.opened.lock().expect("opener log").push(url.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub controller: MugshotController,
    pub jobs: Arc<FakeJobs>,
    pub sink: Arc<MemorySink>,
    pub opener: Arc<RecordingOpener>,
}

pub fn harness(media: FakeMedia, statuses: Vec<Value>) -> Harness {
    let jobs = FakeJobs::new(statuses);
    let sink = Arc::new(MemorySink::default());
    let opener = Arc::new(RecordingOpener::default());
    let downloads = DownloadHandler::new(Arc::new(BlockedFetcher), sink.clone(), opener.clone());
    let controller = MugshotController::new(config(), Arc::new(media), jobs.clone(), downloads);

    Harness {
        controller,
        jobs,
        sink,
        opener,
    }
}

pub fn healthy_media() -> FakeMedia {
    FakeMedia {
        signed_status: 200,
        put_status: 200,
    }
}
