#![warn(missing_docs)]
//! # mugshot-upload
//!
//! ## Purpose
//! Moves a locally selected file onto the public media host.
//!
//! ## Responsibilities
//! - Derive a random destination name for each upload.
//! - Request a pre-signed write location from the media service.
//! - Transfer the raw bytes to that location with the declared content type.
//! - Return the deterministic public asset URL.
//!
//! ## Data flow
//! [`LocalFile`] -> [`UploadClient::upload`] -> `GET get-upload-url` through
//! [`MediaTransport`] -> `PUT <signed url>` -> [`UploadedAsset`].
//!
//! ## Error model
//! Every failure is reported once as [`UploadError`]. There is no retry; the
//! caller decides what to do with the failed selection.
//!
//! ## Security and privacy notes
//! Signed URLs carry write credentials in their query string. They are never
//! returned to callers and are logged only with the query removed.

use std::sync::Arc;

use async_trait::async_trait;
use mugshot_core::{
    CoreError, LocalFile, ServiceConfig, TextResponse, TransportError, asset_file_name,
};
use thiserror::Error;
use url::Url;

/// HTTP operations the upload client depends on.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// `GET`s `endpoint`, expecting the signed write URL as a text body.
    async fn get_text(&self, endpoint: &Url) -> Result<TextResponse, TransportError>;

    /// `PUT`s `bytes` to `signed_url` with the given `Content-Type`; returns
    /// the response status.
    async fn put_bytes(
        &self,
        signed_url: &Url,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<u16, TransportError>;
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Destination name on the media host (`media/<id>.<ext>`).
    pub file_name: String,
    /// Public URL the asset is served from.
    pub public_url: String,
}

/// Uploads files through a signed write location.
#[derive(Clone)]
pub struct UploadClient {
    config: ServiceConfig,
    transport: Arc<dyn MediaTransport>,
}

impl UploadClient {
    /// Creates an upload client.
    pub fn new(config: ServiceConfig, transport: Arc<dyn MediaTransport>) -> Self {
        Self { config, transport }
    }

    /// Uploads `file` and returns its public URL.
    ///
    /// # Errors
    /// - [`UploadError::SignedUrl`] when the signed-location request fails or
    ///   returns an unusable body.
    /// - [`UploadError::Transfer`] when the `PUT` is rejected.
    /// - [`UploadError::Transport`] when either request never completes.
    pub async fn upload(&self, file: &LocalFile) -> Result<UploadedAsset, UploadError> {
        let file_name = asset_file_name(&file.name, &mut rand::rng());
        let endpoint = self.config.signed_upload_endpoint(&file_name)?;

        let reply = self.transport.get_text(&endpoint).await?;
        if !reply.is_success() {
            return Err(UploadError::SignedUrl(format!("status {}", reply.status)));
        }
        let signed_url = parse_signed_url(&reply.body)?;

        tracing::debug!(
            file_name = %file_name,
            signed_host = signed_url.host_str().unwrap_or_default(),
            bytes = file.bytes.len(),
            "transferring upload"
        );

        let status = self
            .transport
            .put_bytes(&signed_url, &file.content_type, file.bytes.clone())
            .await?;
        if !(200..300).contains(&status) {
            return Err(UploadError::Transfer { status });
        }

        Ok(UploadedAsset {
            public_url: self.config.asset_url(&file_name),
            file_name,
        })
    }
}

fn parse_signed_url(body: &str) -> Result<Url, UploadError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(UploadError::SignedUrl("empty signed url".to_string()));
    }
    Url::parse(trimmed)
        .map_err(|error| UploadError::SignedUrl(format!("unparseable signed url: {error}")))
}

/// Upload failures.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The signed write location could not be obtained.
    #[error("Failed to get signed URL: {0}")]
    SignedUrl(String),
    /// The storage host rejected the file transfer.
    #[error("Failed to upload file: status {status}")]
    Transfer {
        /// HTTP status of the `PUT`.
        status: u16,
    },
    /// A request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Endpoint construction failed.
    #[error(transparent)]
    Config(#[from] CoreError),
}
