#![warn(missing_docs)]
//! # mugshot-download
//!
//! ## Purpose
//! Saves a generated image or video to local storage.
//!
//! ## Responsibilities
//! Try three strategies in strict order, each only after the previous one
//! failed:
//! 1. Fetch the media bytes directly and save them.
//! 2. For images, re-encode the rendered pixels as PNG and save that.
//! 3. Open the URL in a new browsing context and ask the user to save it.
//!
//! The download button shows a busy label for the duration and is restored
//! by [`ButtonRestore`] on every exit path.
//!
//! ## Error model
//! Tier failures are logged and fall through. Exhausting all tiers is not an
//! error for the caller: it is reported as
//! [`DownloadOutcome::OpenedInNewTab`] with an alert to show.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::{ImageFormat, RgbaImage};
use mugshot_core::{DOWNLOAD_ID_LEN, MediaKind, RenderedImage, TransportError, nano_id};
use mugshot_ui::ButtonState;
use thiserror::Error;

/// Busy label shown while a download runs.
pub const DOWNLOADING_LABEL: &str = "Downloading...";

/// Alert shown when only the new-tab fallback was left.
pub const NEW_TAB_ALERT: &str =
    "Direct download not supported. Opening in new tab. Please right-click and \"Save As\".";

/// Body and headers of a direct media fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    /// HTTP status.
    pub status: u16,
    /// Declared `Content-Type`, if any.
    pub content_type: Option<String>,
    /// Response body.
    pub bytes: Vec<u8>,
}

/// Fetches media without credentials.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Retrieves `url` as binary data.
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, TransportError>;
}

/// Destination for saved downloads.
pub trait DownloadSink: Send + Sync {
    /// Persists `bytes` under `file_name`; returns where they landed.
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError>;
}

/// Opens a URL in a new browsing context.
pub trait LinkOpener: Send + Sync {
    /// Opens `url`.
    fn open_in_new_tab(&self, url: &str) -> Result<(), DownloadError>;
}

/// Which tier delivered the file, or that none did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Tier 1: original bytes saved.
    Fetched {
        /// Saved location.
        path: PathBuf,
    },
    /// Tier 2: rendered pixels saved as PNG.
    Canvas {
        /// Saved location.
        path: PathBuf,
    },
    /// Tier 3: URL handed to the browser; the user must save it manually.
    OpenedInNewTab {
        /// Whether the opener reported success.
        opened: bool,
        /// Alert to show the user.
        alert: String,
    },
}

/// Sets a button busy and restores its previous state when dropped.
pub struct ButtonRestore<'a> {
    button: &'a mut ButtonState,
    original: ButtonState,
}

impl<'a> ButtonRestore<'a> {
    /// Marks `button` as downloading.
    pub fn engage(button: &'a mut ButtonState) -> Self {
        let original = button.clone();
        button.label = DOWNLOADING_LABEL.to_string();
        button.enabled = false;
        Self { button, original }
    }

    /// Button state while the guard is held.
    pub fn current(&self) -> &ButtonState {
        &*self.button
    }
}

impl Drop for ButtonRestore<'_> {
    fn drop(&mut self) {
        *self.button = self.original.clone();
    }
}

/// What to download.
#[derive(Debug, Clone, Copy)]
pub struct DownloadRequest<'a> {
    /// Result URL.
    pub url: &'a str,
    /// Kind inferred when the result was rendered.
    pub kind: MediaKind,
    /// Currently visible rendered image, if any.
    pub rendered: Option<&'a RenderedImage>,
}

/// Runs the three-tier download strategy.
#[derive(Clone)]
pub struct DownloadHandler {
    fetcher: Arc<dyn MediaFetcher>,
    sink: Arc<dyn DownloadSink>,
    opener: Arc<dyn LinkOpener>,
}

impl DownloadHandler {
    /// Creates a handler.
    pub fn new(
        fetcher: Arc<dyn MediaFetcher>,
        sink: Arc<dyn DownloadSink>,
        opener: Arc<dyn LinkOpener>,
    ) -> Self {
        Self {
            fetcher,
            sink,
            opener,
        }
    }

    /// Downloads `request`, keeping `button` busy until this returns.
    pub async fn download(
        &self,
        request: DownloadRequest<'_>,
        button: &mut ButtonState,
    ) -> DownloadOutcome {
        let _restore = ButtonRestore::engage(button);

        let fetch_error = match self.fetch_and_save(&request).await {
            Ok(path) => return DownloadOutcome::Fetched { path },
            Err(error) => error,
        };
        tracing::warn!(error = %fetch_error, "fetch download failed, trying canvas fallback");

        let canvas_error = match self.canvas_and_save(&request) {
            Ok(path) => return DownloadOutcome::Canvas { path },
            Err(error) => error,
        };
        tracing::error!(error = %canvas_error, "canvas download failed");

        let opened = match self.opener.open_in_new_tab(request.url) {
            Ok(()) => true,
            Err(error) => {
                tracing::error!(error = %error, "opening result in new tab failed");
                false
            }
        };

        DownloadOutcome::OpenedInNewTab {
            opened,
            alert: NEW_TAB_ALERT.to_string(),
        }
    }

    async fn fetch_and_save(&self, request: &DownloadRequest<'_>) -> Result<PathBuf, DownloadError> {
        let fetched = self.fetcher.fetch(request.url).await?;
        if !(200..300).contains(&fetched.status) {
            return Err(DownloadError::Status(fetched.status));
        }

        let ext = extension_for(fetched.content_type.as_deref(), request.kind);
        self.sink.save(&download_file_name(ext), &fetched.bytes)
    }

    fn canvas_and_save(&self, request: &DownloadRequest<'_>) -> Result<PathBuf, DownloadError> {
        let image = match (request.kind, request.rendered) {
            (MediaKind::Image, Some(image)) => image,
            _ => return Err(DownloadError::NotAnImage),
        };

        let png = encode_png(image)?;
        self.sink.save(&download_file_name("png"), &png)
    }
}

/// Picks the saved file extension from the response type and media kind.
pub fn extension_for(content_type: Option<&str>, kind: MediaKind) -> &'static str {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
    if content_type.contains("video") || kind == MediaKind::Video {
        "mp4"
    } else if content_type.contains("png") {
        "png"
    } else {
        "jpg"
    }
}

/// `mugshot_<8 random chars>.<ext>`.
pub fn download_file_name(ext: &str) -> String {
    format!("mugshot_{}.{ext}", nano_id(&mut rand::rng(), DOWNLOAD_ID_LEN))
}

/// Encodes rendered pixels as PNG at their natural resolution.
///
/// # Errors
/// Returns [`DownloadError::NotAnImage`] for an empty or inconsistent buffer
/// and [`DownloadError::Encode`] when encoding fails.
pub fn encode_png(image: &RenderedImage) -> Result<Vec<u8>, DownloadError> {
    if !image.is_well_formed() {
        return Err(DownloadError::NotAnImage);
    }
    let buffer = RgbaImage::from_raw(image.width, image.height, image.rgba.clone())
        .ok_or(DownloadError::NotAnImage)?;

    let mut encoded = Cursor::new(Vec::new());
    buffer.write_to(&mut encoded, ImageFormat::Png)?;
    Ok(encoded.into_inner())
}

/// Saves downloads into one directory.
#[derive(Debug, Clone)]
pub struct FileSystemSink {
    directory: PathBuf,
}

impl FileSystemSink {
    /// Creates a sink writing into `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Target directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl DownloadSink for FileSystemSink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(file_name);
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "download saved");
        Ok(path)
    }
}

/// Failures of individual download tiers.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Fetch returned a non-success status.
    #[error("Network response was not ok: status {0}")]
    Status(u16),
    /// Fetch never completed.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// No visible rendered image to draw.
    #[error("Not an image or image not loaded")]
    NotAnImage,
    /// PNG encoding failed.
    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    /// Writing the file failed.
    #[error("saving download failed: {0}")]
    Save(#[from] std::io::Error),
    /// The new-tab opener failed.
    #[error("opening url failed: {0}")]
    Open(String),
}
