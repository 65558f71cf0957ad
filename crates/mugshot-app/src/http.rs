//! reqwest-backed transports for the media API, job API, and result fetch.

use async_trait::async_trait;
use mugshot_core::{TextResponse, TransportError};
use mugshot_download::{FetchedMedia, MediaFetcher};
use mugshot_jobs::JobTransport;
use mugshot_upload::MediaTransport;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use url::Url;

use crate::{APP_VERSION, AppError, redact_signed_url};

/// `Accept` header sent to the job API.
pub const JOB_ACCEPT: &str = "application/json, text/plain, */*";

/// One shared HTTP client for every remote call.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a client identifying as `mugshot-generator/<version>`.
    ///
    /// # Errors
    /// Returns [`AppError::Http`] when the TLS backend cannot initialize.
    pub fn new() -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(format!("mugshot-generator/{APP_VERSION}"))
            .build()?;
        Ok(Self { client })
    }

    async fn text_response(
        request: reqwest::RequestBuilder,
    ) -> Result<TextResponse, TransportError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        Ok(TextResponse::new(status, body))
    }
}

#[async_trait]
impl MediaTransport for HttpTransport {
    async fn get_text(&self, endpoint: &Url) -> Result<TextResponse, TransportError> {
        tracing::debug!(url = %redact_signed_url(endpoint.as_str()), "requesting signed upload url");
        Self::text_response(self.client.get(endpoint.clone())).await
    }

    async fn put_bytes(
        &self,
        signed_url: &Url,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<u16, TransportError> {
        tracing::debug!(
            url = %redact_signed_url(signed_url.as_str()),
            content_type,
            bytes = bytes.len(),
            "uploading asset"
        );
        let response = self
            .client
            .put(signed_url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(transport_error)?;
        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl JobTransport for HttpTransport {
    async fn post_json(&self, endpoint: &Url, body: &Value) -> Result<TextResponse, TransportError> {
        tracing::debug!(url = %endpoint, "submitting job");
        Self::text_response(
            self.client
                .post(endpoint.clone())
                .header(ACCEPT, JOB_ACCEPT)
                .json(body),
        )
        .await
    }

    async fn get_json(&self, endpoint: &Url) -> Result<TextResponse, TransportError> {
        Self::text_response(self.client.get(endpoint.clone()).header(ACCEPT, JOB_ACCEPT)).await
    }
}

#[async_trait]
impl MediaFetcher for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, TransportError> {
        tracing::debug!(url = %redact_signed_url(url), "fetching result media");
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(transport_error)?.to_vec();

        Ok(FetchedMedia {
            status,
            content_type,
            bytes,
        })
    }
}

fn transport_error(error: reqwest::Error) -> TransportError {
    TransportError(error.without_url().to_string())
}
