use crate::error::ScrapeError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Browser-like user agent; several release pages reject unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Fetches the body of a URL.
///
/// Shared by every strategy. Implementations must turn non-2xx responses
/// into [`ScrapeError::Status`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Fetches a URL and deserializes its JSON body.
pub async fn get_json<T: DeserializeOwned>(
    transport: &dyn Transport,
    url: &str,
) -> Result<T, ScrapeError> {
    let body = transport.get_text(url).await?;
    serde_json::from_str(&body).map_err(|e| {
        warn!("Failed to parse JSON from {}: {}", url, e);
        ScrapeError::InvalidResponse(e.to_string())
    })
}

/// [`Transport`] backed by a single shared `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with the given user agent and per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("{} returned status {}", url, status);
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
