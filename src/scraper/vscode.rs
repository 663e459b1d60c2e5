use super::transport::Transport;
use super::{scrape_element, Release, ScrapeStrategy};
use crate::error::ScrapeError;
use crate::model::ApplicationDescriptor;
use crate::version;
use async_trait::async_trait;
use std::sync::Arc;

const UPDATES_URL: &str = "https://code.visualstudio.com/updates";
const DOWNLOAD_URL: &str = "https://code.visualstudio.com/download";
const PRODUCT: &str = "Visual Studio Code";

/// VS Code: the first `.updates-version` heading of the release notes.
///
/// Claims applications by product name as well as publisher, since VS Code
/// ships under the same publisher as Visual Studio.
pub struct VsCodeStrategy {
    transport: Arc<dyn Transport>,
    url: String,
}

impl VsCodeStrategy {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_url(transport, UPDATES_URL)
    }

    pub fn with_url(transport: Arc<dyn Transport>, url: &str) -> Self {
        Self {
            transport,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl ScrapeStrategy for VsCodeStrategy {
    fn name(&self) -> &'static str {
        "VS Code Updates"
    }

    fn publisher_key(&self) -> &str {
        PRODUCT
    }

    fn product_key(&self) -> Option<&str> {
        Some(PRODUCT)
    }

    fn source_url(&self) -> &str {
        &self.url
    }

    async fn fetch_latest(&self, _app: &ApplicationDescriptor) -> Result<Release, ScrapeError> {
        let text = scrape_element(self.transport.as_ref(), &self.url, "updates-version").await?;
        let token = version::extract_version(&text)
            .ok_or_else(|| ScrapeError::NotFound(self.url.clone()))?;

        Ok(Release::new(token).with_download_url(DOWNLOAD_URL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::transport::HttpTransport;
    use mockito::Server;
    use std::time::Duration;

    fn strategy(url: &str) -> VsCodeStrategy {
        let transport = HttpTransport::new("upwatch-test", Duration::from_secs(5)).unwrap();
        VsCodeStrategy::with_url(Arc::new(transport), url)
    }

    fn vscode() -> ApplicationDescriptor {
        ApplicationDescriptor::new(
            "Microsoft Visual Studio Code",
            "Microsoft Corporation",
            "1.94.2",
            "/usr/share/code/code",
        )
    }

    #[tokio::test]
    async fn test_fetch_latest_reads_updates_heading() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/updates")
            .with_status(200)
            .with_body(
                r#"<h1 class="updates-version">version 1.95</h1>
                   <p>October 2024 (version 1.95)</p>"#,
            )
            .create_async()
            .await;

        let release = strategy(&format!("{}/updates", server.url()))
            .fetch_latest(&vscode())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(release.version, "1.95");
        assert_eq!(release.download_url.as_deref(), Some(DOWNLOAD_URL));
    }

    #[tokio::test]
    async fn test_fetch_latest_without_version_heading() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/updates")
            .with_status(200)
            .with_body(r#"<h1 class="updates-version">Coming soon</h1>"#)
            .create_async()
            .await;

        let result = strategy(&format!("{}/updates", server.url()))
            .fetch_latest(&vscode())
            .await;

        assert!(matches!(result, Err(ScrapeError::NotFound(_))));
    }
}
