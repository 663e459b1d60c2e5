use super::transport::Transport;
use super::{scrape_element, Release, ScrapeStrategy};
use crate::error::ScrapeError;
use crate::model::ApplicationDescriptor;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};

const RELEASES_URL: &str = "https://chromereleases.googleblog.com/";
const DOWNLOAD_URL: &str = "https://www.google.com/chrome/";

/// Chrome versions always have four components.
static CHROME_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+\.\d+").expect("valid regex"));

/// Chrome: the version in the newest post title of the releases blog.
pub struct GoogleStrategy {
    transport: Arc<dyn Transport>,
    url: String,
}

impl GoogleStrategy {
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
impl ScrapeStrategy for GoogleStrategy {
    fn name(&self) -> &'static str {
        "Chrome Releases Blog"
    }

    fn publisher_key(&self) -> &str {
        "Google"
    }

    fn source_url(&self) -> &str {
        &self.url
    }

    async fn fetch_latest(&self, _app: &ApplicationDescriptor) -> Result<Release, ScrapeError> {
        let title = scrape_element(self.transport.as_ref(), &self.url, "post-title").await?;
        let version = CHROME_VERSION
            .find(&title)
            .ok_or_else(|| ScrapeError::NotFound(self.url.clone()))?;

        Ok(Release::new(version.as_str()).with_download_url(DOWNLOAD_URL))
    }
}
