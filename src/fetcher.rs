use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("radar_scraper/", env!("CARGO_PKG_VERSION"));
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Raw image bytes handed back as-is, with the origin's content type.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Plain HTTP GET with a per-call timeout. No retries.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Fetch a document body as text. Invalid UTF-8 is replaced, not rejected.
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let bytes = self.get_bytes(url, timeout).await?.0;
        debug!(%url, bytes = bytes.len(), "Fetched document");
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Pass-through retrieval of an image for the proxy collaborator.
    pub async fn fetch_image(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<ImagePayload, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if parsed.host_str().is_none() {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }
        let (bytes, content_type) = self.get_bytes(parsed.as_str(), timeout).await?;
        Ok(ImagePayload {
            bytes,
            content_type: content_type.unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string()),
        })
    }

    async fn get_bytes(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let timeout_ms = timeout.as_millis();
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, timeout_ms, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, timeout_ms, e))?;
        Ok((bytes.to_vec(), content_type))
    }
}
