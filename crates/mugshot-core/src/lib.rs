#![warn(missing_docs)]
//! # mugshot-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `mugshot-generator`
//! workspace.
//!
//! ## Responsibilities
//! - Represent the locally selected file and its upload session.
//! - Represent a remote generation job and its status lifecycle.
//! - Classify produced media as image or video exactly once.
//! - Generate random identifiers and destination names for uploads.
//! - Hold the fixed service endpoints and build request URLs from them.
//!
//! ## Data flow
//! The UI layer wraps a [`LocalFile`] in an [`UploadSession`]. The upload
//! client derives a destination with [`asset_file_name`] and fills in the
//! remote URL. The job client creates a [`GenerationJob`] and advances it
//! with [`JobStatus`] values until a terminal status is reached.
//!
//! ## Ownership and lifetimes
//! Files own their bytes (`Vec<u8>`) so sessions can move between async
//! stages without borrowing from a caller's buffer.
//!
//! ## Error model
//! Endpoint and file-access problems return [`CoreError`].
//!
//! ## Example
//! ```rust
//! use mugshot_core::{MediaKind, asset_file_name};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let name = asset_file_name("portrait.png", &mut rng);
//! assert!(name.starts_with("media/") && name.ends_with(".png"));
//! assert_eq!(MediaKind::from_url("https://cdn.test/out.MP4?sig=1"), MediaKind::Video);
//! ```

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Alphabet used by [`nano_id`].
pub const NANO_ID_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Identifier length used for uploaded asset names.
pub const UPLOAD_ID_LEN: usize = 21;

/// Identifier length used for local download file names.
pub const DOWNLOAD_ID_LEN: usize = 8;

/// Extension used when a file name carries none.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Directory prefix for uploaded assets on the media host.
pub const MEDIA_PREFIX: &str = "media/";

const VIDEO_EXTENSIONS: [&str; 2] = [".mp4", ".webm"];

/// A file selected or dropped by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Original file name, used to derive the upload extension.
    pub name: String,
    /// Declared MIME type, sent as `Content-Type` on transfer.
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// Creates a file handle from in-memory bytes.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, inferring its content type from the extension.
    ///
    /// # Errors
    /// Returns [`CoreError::Io`] when the file cannot be read.
    pub fn read_from_path(path: &Path) -> Result<Self, CoreError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = content_type_for_extension(file_extension(&name)).to_string();

        Ok(Self {
            name,
            content_type,
            bytes,
        })
    }
}

/// Local file plus the public URL it was uploaded to, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    file: LocalFile,
    remote_url: Option<String>,
}

impl UploadSession {
    /// Starts a session for a freshly selected file.
    pub fn new(file: LocalFile) -> Self {
        Self {
            file,
            remote_url: None,
        }
    }

    /// The selected file.
    pub fn file(&self) -> &LocalFile {
        &self.file
    }

    /// Public URL of the uploaded asset once the upload succeeded.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    /// Records the public URL returned by the upload client.
    pub fn set_remote_url(&mut self, url: impl Into<String>) {
        self.remote_url = Some(url.into());
    }
}

/// Job status as reported by the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted but not started.
    Queued,
    /// Running.
    Processing,
    /// Finished with a result.
    Completed,
    /// Finished without a result.
    Failed,
    /// Alternate failure spelling used by some service versions.
    Error,
    /// Any status string this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Returns `true` once polling must stop.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Error)
    }

    /// Returns `true` for server-reported failures.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }
}

/// One remote generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    /// Server-assigned job id.
    pub job_id: String,
    /// Latest known status.
    pub status: JobStatus,
    /// Result media URL, set on completion.
    pub result_url: Option<String>,
}

impl GenerationJob {
    /// Creates a queued job for a freshly submitted id.
    pub fn queued(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Queued,
            result_url: None,
        }
    }

    /// Applies one poll observation. Terminal jobs ignore further updates.
    pub fn apply_status(&mut self, status: JobStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
    }

    /// Marks the job completed with its result URL.
    pub fn complete(&mut self, result_url: impl Into<String>) {
        self.status = JobStatus::Completed;
        self.result_url = Some(result_url.into());
    }
}

/// Kind of media produced by a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video clip.
    Video,
}

impl MediaKind {
    /// Classifies a result URL by its file suffix.
    ///
    /// `.mp4` and `.webm`, case-insensitive and optionally followed by a
    /// query string, are video; everything else is an image.
    pub fn from_url(url: &str) -> Self {
        let path = url.split_once('?').map_or(url, |(path, _)| path);
        let path = path.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            Self::Video
        } else {
            Self::Image
        }
    }
}

/// Decoded pixels of a rendered result image at natural resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    /// RGBA pixel buffer, row-major (`width * height * 4` bytes).
    pub rgba: Vec<u8>,
}

impl RenderedImage {
    /// Returns `true` when the buffer length matches the declared geometry.
    pub fn is_well_formed(&self) -> bool {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .is_some_and(|expected| expected == self.rgba.len() && expected > 0)
    }
}

/// Generates a random identifier of `len` alphanumeric characters.
///
/// Characters are drawn uniformly from [`NANO_ID_ALPHABET`]. Not suitable for
/// secrets.
pub fn nano_id<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| {
            let index = rng.random_range(0..NANO_ID_ALPHABET.len());
            char::from(NANO_ID_ALPHABET[index])
        })
        .collect()
}

/// Returns the text after the last `.` of `name`, or [`DEFAULT_EXTENSION`].
///
/// A dotless name such as `portrait` uploads as `.jpg`; the bare name is
/// never used as an extension.
pub fn file_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.trim().is_empty() => ext,
        _ => DEFAULT_EXTENSION,
    }
}

/// Builds the destination name `media/<id>.<ext>` for an upload.
pub fn asset_file_name<R: Rng>(original_name: &str, rng: &mut R) -> String {
    format!(
        "{MEDIA_PREFIX}{}.{}",
        nano_id(rng, UPLOAD_ID_LEN),
        file_extension(original_name)
    )
}

/// Maps a file extension to the MIME type declared on upload.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Default media API host.
pub const DEFAULT_MEDIA_API: &str = "https://core.faceswapper.ai";
/// Default public asset host.
pub const DEFAULT_ASSET_HOST: &str = "https://assets.dressr.ai";
/// Default job API host.
pub const DEFAULT_JOB_API: &str = "https://api.chromastudio.ai";
/// Default media project id.
pub const DEFAULT_PROJECT_ID: &str = "dressr";
/// Static user id attached to every job.
pub const DEFAULT_USER_ID: &str = "DObRu1vyStbUynoQmTcHBlhs55z2";

/// Endpoints and identity used by the remote workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    media_api: String,
    asset_host: String,
    job_api: String,
    project_id: String,
    user_id: String,
}

impl ServiceConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidEndpoint`] when a base URL is not an
    /// absolute `http`/`https` URL, or [`CoreError::EmptyIdentity`] for a
    /// blank project or user id.
    pub fn new(
        media_api: impl Into<String>,
        asset_host: impl Into<String>,
        job_api: impl Into<String>,
        project_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let config = Self {
            media_api: normalize_base(media_api.into())?,
            asset_host: normalize_base(asset_host.into())?,
            job_api: normalize_base(job_api.into())?,
            project_id: project_id.into(),
            user_id: user_id.into(),
        };

        if config.project_id.trim().is_empty() {
            return Err(CoreError::EmptyIdentity("project id"));
        }
        if config.user_id.trim().is_empty() {
            return Err(CoreError::EmptyIdentity("user id"));
        }

        Ok(config)
    }

    /// Same as [`ServiceConfig::default`] but with every host pointing at
    /// `base`. Used to aim the whole workflow at one test server.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidEndpoint`] for an invalid `base`.
    pub fn with_single_host(base: &str) -> Result<Self, CoreError> {
        Self::new(base, base, base, DEFAULT_PROJECT_ID, DEFAULT_USER_ID)
    }

    /// Static user id sent with jobs.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Media project id.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// `GET` endpoint returning a signed write URL for `file_name`.
    pub fn signed_upload_endpoint(&self, file_name: &str) -> Result<Url, CoreError> {
        let mut url = parse_endpoint(&format!("{}/media/get-upload-url", self.media_api))?;
        url.query_pairs_mut()
            .append_pair("fileName", file_name)
            .append_pair("projectId", &self.project_id);
        Ok(url)
    }

    /// Public URL an uploaded asset is served from.
    pub fn asset_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.asset_host, file_name)
    }

    /// `POST` endpoint accepting generation jobs.
    pub fn submit_endpoint(&self) -> Result<Url, CoreError> {
        parse_endpoint(&format!("{}/image-gen", self.job_api))
    }

    /// `GET` endpoint reporting the status of `job_id`.
    pub fn status_endpoint(&self, job_id: &str) -> Result<Url, CoreError> {
        let mut url = self.submit_endpoint()?;
        url.path_segments_mut()
            .map_err(|()| CoreError::InvalidEndpoint("job api cannot be a base url".to_string()))?
            .pop_if_empty()
            .extend([self.user_id.as_str(), job_id, "status"]);
        Ok(url)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            media_api: DEFAULT_MEDIA_API.to_string(),
            asset_host: DEFAULT_ASSET_HOST.to_string(),
            job_api: DEFAULT_JOB_API.to_string(),
            project_id: DEFAULT_PROJECT_ID.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }
}

/// Status line and text body of one HTTP exchange, as seen by the clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

impl TextResponse {
    /// Builds a response from parts.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A request that never produced an HTTP status (DNS, TLS, connection reset).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

fn normalize_base(raw: String) -> Result<String, CoreError> {
    let parsed = parse_endpoint(&raw)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CoreError::InvalidEndpoint(format!(
            "{raw}: scheme must be http or https"
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_endpoint(raw: &str) -> Result<Url, CoreError> {
    Url::parse(raw).map_err(|error| CoreError::InvalidEndpoint(format!("{raw}: {error}")))
}

/// Error type for core model failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A configured endpoint is not a usable URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// A required identity value is blank.
    #[error("{0} must not be empty")]
    EmptyIdentity(&'static str),
    /// Local file could not be read.
    #[error("file read failure: {0}")]
    Io(#[from] std::io::Error),
}
