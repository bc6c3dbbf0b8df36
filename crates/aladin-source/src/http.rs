//! HTTP transport behind an injectable trait
//!
//! The pipeline never talks to reqwest directly; it goes through
//! [`Transport`], so tests can substitute a scripted stub and the host
//! can wrap its own client policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client};

use crate::error::FetchError;

pub const USER_AGENT: &str = concat!("aladin-source/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a page and decode it as UTF-8, replacing invalid bytes.
    /// The origin's description endpoint requires a Referer header.
    async fn get_html(
        &self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<String, FetchError>;

    /// Fetch a binary body (cover images).
    async fn get_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError>;

    /// HEAD request returning the Content-Length header, used as a
    /// cover liveness probe.
    async fn content_length(&self, url: &str, timeout: Duration)
        -> Result<Option<u64>, FetchError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<reqwest::Response, FetchError> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e))?;

        match response.status().as_u16() {
            404 => Err(FetchError::NotFound),
            status if !response.status().is_success() => Err(FetchError::Status { status }),
            _ => Ok(response),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_html(
        &self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header("Referer", referer);
        }

        let response = self.send(request, timeout).await?;
        let bytes = response.bytes().await.map_err(|e| map_reqwest_error(&e))?;

        // The origin mixes encodings and declares them inconsistently;
        // lossy UTF-8 matches how the host application decodes.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn get_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let response = self.send(self.client.get(url), timeout).await?;
        let bytes = response.bytes().await.map_err(|e| map_reqwest_error(&e))?;
        Ok(bytes.to_vec())
    }

    async fn content_length(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<Option<u64>, FetchError> {
        let response = self.send(self.client.head(url), timeout).await?;
        // `Response::content_length()` reports the body size, which is
        // zero for a HEAD response; the header carries the real value.
        Ok(response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok()))
    }
}

fn map_reqwest_error(e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_builder() {
        FetchError::InvalidUrl {
            url: e.url().map(|u| u.to_string()).unwrap_or_default(),
        }
    } else {
        FetchError::RequestFailed {
            message: e.to_string(),
        }
    }
}
