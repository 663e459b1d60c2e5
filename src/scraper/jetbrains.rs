use super::transport::{get_json, Transport};
use super::{Release, ScrapeStrategy};
use crate::error::ScrapeError;
use crate::model::ApplicationDescriptor;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const RELEASES_URL: &str = "https://data.services.jetbrains.com/products/releases";
const DOWNLOAD_URL: &str = "https://www.jetbrains.com/pycharm/download/";

/// Product code queried by default (PyCharm Professional).
const DEFAULT_PRODUCT_CODE: &str = "PCP";

/// Response from the JetBrains products API, keyed by product code.
type ReleasesResponse = HashMap<String, Vec<ProductRelease>>;

#[derive(Debug, Deserialize)]
struct ProductRelease {
    version: Option<String>,
}

/// JetBrains: the latest release reported by the public products API.
pub struct JetBrainsStrategy {
    transport: Arc<dyn Transport>,
    base_url: String,
    product_code: String,
    source_url: String,
}

impl JetBrainsStrategy {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_url(transport, RELEASES_URL, DEFAULT_PRODUCT_CODE)
    }

    pub fn with_url(transport: Arc<dyn Transport>, base_url: &str, product_code: &str) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
            product_code: product_code.to_string(),
            source_url: format!("{base_url}?code={product_code}&latest=true&type=release"),
        }
    }
}

#[async_trait]
impl ScrapeStrategy for JetBrainsStrategy {
    fn name(&self) -> &'static str {
        "JetBrains Products API"
    }

    fn publisher_key(&self) -> &str {
        "JetBrains"
    }

    fn source_url(&self) -> &str {
        &self.source_url
    }

    async fn fetch_latest(&self, _app: &ApplicationDescriptor) -> Result<Release, ScrapeError> {
        let releases: ReleasesResponse =
            get_json(self.transport.as_ref(), &self.source_url).await?;

        let version = releases
            .get(&self.product_code)
            .and_then(|list| list.first())
            .and_then(|release| release.version.clone())
            .ok_or_else(|| ScrapeError::NotFound(self.base_url.clone()))?;

        Ok(Release::new(version).with_download_url(DOWNLOAD_URL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::transport::HttpTransport;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn strategy(base_url: &str) -> JetBrainsStrategy {
        let transport = HttpTransport::new("upwatch-test", Duration::from_secs(5)).unwrap();
        JetBrainsStrategy::with_url(Arc::new(transport), base_url, "PCP")
    }

    fn pycharm() -> ApplicationDescriptor {
        ApplicationDescriptor::new("PyCharm", "JetBrains s.r.o.", "2023.2", "/opt/pycharm/bin/pycharm.sh")
    }

    #[tokio::test]
    async fn test_fetch_latest_reads_product_version() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/products/releases")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("code".into(), "PCP".into()),
                Matcher::UrlEncoded("latest".into(), "true".into()),
                Matcher::UrlEncoded("type".into(), "release".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"PCP": [{"date": "2024-12-12", "type": "release", "version": "2024.3.1"}]}"#)
            .create_async()
            .await;

        let release = strategy(&format!("{}/products/releases", server.url()))
            .fetch_latest(&pycharm())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(release.version, "2024.3.1");
        assert_eq!(release.download_url.as_deref(), Some(DOWNLOAD_URL));
    }

    #[tokio::test]
    async fn test_fetch_latest_fails_when_product_missing() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/products/releases")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"PCP": []}"#)
            .create_async()
            .await;

        let result = strategy(&format!("{}/products/releases", server.url()))
            .fetch_latest(&pycharm())
            .await;

        assert!(matches!(result, Err(ScrapeError::NotFound(_))));
    }

    #[test]
    fn test_source_url_includes_query() {
        let transport = HttpTransport::new("upwatch-test", Duration::from_secs(5)).unwrap();
        let strategy = JetBrainsStrategy::new(Arc::new(transport));

        assert_eq!(
            strategy.source_url(),
            "https://data.services.jetbrains.com/products/releases?code=PCP&latest=true&type=release"
        );
    }
}
