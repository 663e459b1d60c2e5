use super::transport::Transport;
use super::{scrape_element, Release, ScrapeStrategy};
use crate::error::ScrapeError;
use crate::model::ApplicationDescriptor;
use crate::version::extract_version;
use async_trait::async_trait;
use std::sync::Arc;

const RELEASES_URL: &str = "https://www.mozilla.org/en-US/firefox/releases/";
const DOWNLOAD_URL: &str = "https://www.mozilla.org/firefox/download/thanks/";

/// Firefox: the first `.c-release-version` entry of the release index.
pub struct MozillaStrategy {
    transport: Arc<dyn Transport>,
    url: String,
}

impl MozillaStrategy {
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
impl ScrapeStrategy for MozillaStrategy {
    fn name(&self) -> &'static str {
        "Firefox Releases"
    }

    fn publisher_key(&self) -> &str {
        "Mozilla"
    }

    fn source_url(&self) -> &str {
        &self.url
    }

    async fn fetch_latest(&self, _app: &ApplicationDescriptor) -> Result<Release, ScrapeError> {
        let text = scrape_element(self.transport.as_ref(), &self.url, "c-release-version").await?;
        let version = extract_version(&text).unwrap_or(&text).to_string();

        Ok(Release::new(version).with_download_url(DOWNLOAD_URL))
    }
}
