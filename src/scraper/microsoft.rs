use super::transport::Transport;
use super::{scrape_element, Release, ScrapeStrategy};
use crate::error::ScrapeError;
use crate::model::ApplicationDescriptor;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};

const RELEASES_URL: &str =
    "https://learn.microsoft.com/en-us/visualstudio/releases/2022/release-notes";
const DOWNLOAD_URL: &str = "https://visualstudio.microsoft.com/downloads/";

static THREE_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+").expect("valid regex"));

/// Visual Studio: the first `.release-version` heading of the release notes.
pub struct MicrosoftStrategy {
    transport: Arc<dyn Transport>,
    url: String,
}

impl MicrosoftStrategy {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_url(transport, RELEASES_URL)
    }

    pub fn with_url(transport: Arc<dyn Transport>, url: &str) -> Self {
        Self {
            transport,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl ScrapeStrategy for MicrosoftStrategy {
    fn name(&self) -> &'static str {
        "Visual Studio Release Notes"
    }

    fn publisher_key(&self) -> &str {
        "Microsoft"
    }

    fn source_url(&self) -> &str {
        &self.url
    }

    async fn fetch_latest(&self, _app: &ApplicationDescriptor) -> Result<Release, ScrapeError> {
        let text = scrape_element(self.transport.as_ref(), &self.url, "release-version").await?;
        let version = THREE_PART
            .find(&text)
            .ok_or_else(|| ScrapeError::NotFound(self.url.clone()))?;

        Ok(Release::new(version.as_str()).with_download_url(DOWNLOAD_URL))
    }
}
