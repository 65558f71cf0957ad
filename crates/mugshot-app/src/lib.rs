#![warn(missing_docs)]
//! # mugshot-app
//!
//! ## Purpose
//! Wires the upload, job, workflow, and download crates into one controller
//! for the mugshot generator.
//!
//! ## Responsibilities
//! - Drive [`WorkflowSession`] transitions from real upload and job results.
//! - Provide reqwest-backed transports ([`HttpTransport`]) and platform
//!   adapters for saving and opening results.
//! - Keep signed URLs out of logs.
//! - Expose the build version and tracing setup to the binary.
//!
//! ## Data flow
//! select file -> upload -> `Ready` -> submit job -> poll -> render result ->
//! download through the tiered handler.
//!
//! ## Ownership and lifetimes
//! The controller owns the session and takes `&mut self` for every event, so
//! the session has exactly one writer and remote calls run one at a time.
//!
//! ## Error model
//! Pipeline failures never escape the controller: they are logged and turned
//! into workflow failures with a queued alert. Setup problems (HTTP client,
//! decoding) use [`AppError`].

pub mod http;

use std::path::PathBuf;
use std::sync::Arc;

use mugshot_core::{CoreError, LocalFile, MediaKind, RenderedImage, ServiceConfig};
use mugshot_download::{
    DownloadError, DownloadHandler, DownloadOutcome, DownloadRequest, FileSystemSink, LinkOpener,
};
use mugshot_jobs::{GeneratedMedia, JobClient, JobError, JobTransport, extract_result_url};
use mugshot_ui::{GenerateRejected, WorkflowSession};
use mugshot_upload::{MediaTransport, UploadClient};
use thiserror::Error;
use tokio::time::Instant;

pub use http::HttpTransport;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("MUGSHOT_VERSION");

/// Environment variable overriding the download directory.
pub const DOWNLOAD_DIR_ENV: &str = "MUGSHOT_DOWNLOAD_DIR";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Installs a stderr `tracing` subscriber honoring `RUST_LOG` (default `info`).
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

/// Drops the query string and fragment of a URL so signatures never reach
/// logs.
pub fn redact_signed_url(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    if end == raw.len() {
        return raw.to_string();
    }
    format!("{}?<redacted>", &raw[..end])
}

/// Resolves where downloads are written.
///
/// Order: `MUGSHOT_DOWNLOAD_DIR`, the platform download directory, then the
/// current directory.
pub fn download_dir_from_env() -> PathBuf {
    if let Ok(value) = std::env::var(DOWNLOAD_DIR_ENV)
        && !value.trim().is_empty()
    {
        return PathBuf::from(value.trim());
    }
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Opens URLs in the system browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserOpener;

impl LinkOpener for BrowserOpener {
    fn open_in_new_tab(&self, url: &str) -> Result<(), DownloadError> {
        webbrowser::open(url).map_err(|error| DownloadError::Open(error.to_string()))
    }
}

/// Decodes fetched image bytes into the pixels a renderer would display.
///
/// # Errors
/// Returns [`AppError::Decode`] when the bytes are not a supported image.
pub fn decode_rendered(bytes: &[u8]) -> Result<RenderedImage, AppError> {
    let decoded = image::load_from_memory(bytes)?.to_rgba8();
    Ok(RenderedImage {
        width: decoded.width(),
        height: decoded.height(),
        rgba: decoded.into_raw(),
    })
}

/// Event-driven controller for one generator page.
pub struct MugshotController {
    session: WorkflowSession,
    uploads: UploadClient,
    jobs: JobClient,
    downloads: DownloadHandler,
    epoch: Instant,
}

impl MugshotController {
    /// Creates a controller over explicit transports.
    pub fn new(
        config: ServiceConfig,
        media: Arc<dyn MediaTransport>,
        jobs: Arc<dyn JobTransport>,
        downloads: DownloadHandler,
    ) -> Self {
        Self {
            session: WorkflowSession::new(),
            uploads: UploadClient::new(config.clone(), media),
            jobs: JobClient::new(config, jobs),
            downloads,
            epoch: Instant::now(),
        }
    }

    /// Creates a controller that talks HTTP for everything, saves into
    /// `download_dir`, and falls back to the system browser.
    pub fn with_http(config: ServiceConfig, http: HttpTransport, download_dir: PathBuf) -> Self {
        let http = Arc::new(http);
        let downloads = DownloadHandler::new(
            http.clone(),
            Arc::new(FileSystemSink::new(download_dir)),
            Arc::new(BrowserOpener),
        );
        Self::new(config, http.clone(), http, downloads)
    }

    /// Current session snapshot.
    pub fn session(&self) -> &WorkflowSession {
        &self.session
    }

    /// Drains alerts queued since the last call.
    pub fn take_alerts(&mut self) -> Vec<String> {
        self.session.take_alerts()
    }

    /// Milliseconds since the controller was created.
    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Selects `file` and uploads it.
    ///
    /// On failure the session is reset to `Idle` with an alert queued.
    pub async fn select_file(&mut self, file: LocalFile) {
        tracing::info!(name = %file.name, bytes = file.bytes.len(), "file selected");
        self.session.on_file_selected(file.clone());

        match self.uploads.upload(&file).await {
            Ok(asset) => {
                tracing::info!(url = %asset.public_url, "upload ready");
                self.session.on_upload_succeeded(asset.public_url);
            }
            Err(error) => {
                tracing::error!(error = %error, "upload failed");
                self.session.on_upload_failed(&error.to_string());
            }
        }
    }

    /// Runs one generation: submit, poll, and render the result.
    ///
    /// # Errors
    /// Returns [`GenerateRejected`] when the request is not accepted. Remote
    /// failures are not errors here; they end in `Ready` with an alert.
    pub async fn generate(&mut self) -> Result<(), GenerateRejected> {
        let image_url = self.session.begin_generation()?;

        match self.run_job(&image_url).await {
            Ok(result_url) => {
                let media = GeneratedMedia::from_url(result_url);
                tracing::info!(
                    url = %redact_signed_url(&media.url),
                    kind = ?media.kind,
                    "generation complete"
                );
                let now_ms = self.now_ms();
                self.session.on_generation_complete(media.url, now_ms);
            }
            Err(error) => {
                tracing::error!(error = %error, "generation failed");
                self.session.on_generation_failed(&error.to_string());
            }
        }
        Ok(())
    }

    /// Stores decoded pixels for the rendered result image.
    ///
    /// # Errors
    /// Returns [`AppError::Decode`] for undecodable bytes.
    pub fn show_rendered(&mut self, bytes: &[u8]) -> Result<(), AppError> {
        let Some(url) = self
            .session
            .surface
            .result
            .as_ref()
            .filter(|result| result.kind == MediaKind::Image)
            .map(|result| result.url.clone())
        else {
            return Ok(());
        };

        let image = decode_rendered(bytes)?;
        self.session.attach_rendered_pixels(&url, image);
        Ok(())
    }

    /// Downloads the current result, if the download button is enabled.
    pub async fn download(&mut self) -> Option<DownloadOutcome> {
        let (url, kind) = self.session.download_target()?;
        let rendered = self.session.visible_image().cloned();

        let outcome = self
            .downloads
            .download(
                DownloadRequest {
                    url: &url,
                    kind,
                    rendered: rendered.as_ref(),
                },
                &mut self.session.surface.download,
            )
            .await;

        match &outcome {
            DownloadOutcome::Fetched { path } | DownloadOutcome::Canvas { path } => {
                tracing::info!(path = %path.display(), "result downloaded");
            }
            DownloadOutcome::OpenedInNewTab { alert, .. } => {
                self.session.alert(alert.clone());
            }
        }
        Some(outcome)
    }

    /// Remove button: back to `Idle`.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Advances time-based view state.
    pub fn tick(&mut self) {
        let now_ms = self.now_ms();
        self.session.on_tick(now_ms);
    }

    async fn run_job(&mut self, image_url: &str) -> Result<String, JobError> {
        let submitted = self.jobs.submit(image_url).await?;
        self.session.on_job_submitted(submitted.job_id.clone());

        let session = &mut self.session;
        let response = self
            .jobs
            .poll(&submitted.job_id, |progress| {
                session.on_poll_progress(progress.attempt, progress.status);
            })
            .await?;

        extract_result_url(&response)
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// HTTP client could not be built.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// Configuration or local file problem.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Image bytes could not be decoded.
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
}
