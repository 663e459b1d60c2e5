use super::html;
use super::transport::Transport;
use super::{Release, ScrapeStrategy};
use crate::error::ScrapeError;
use crate::model::ApplicationDescriptor;
use crate::version;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Url;
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Default search endpoint; the query goes into `q`.
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search";

static VERSION_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+(?:\.\d+)?").expect("valid regex"));

/// Fallback for publishers without a dedicated strategy.
///
/// Searches for `{name} {publisher} latest version download` and takes the
/// highest version number mentioned anywhere on the result page. Best
/// effort only: search pages mention plenty of numbers that are not
/// versions of the application.
pub struct GenericStrategy {
    transport: Arc<dyn Transport>,
    search_url: String,
}

impl GenericStrategy {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_search_url(transport, DEFAULT_SEARCH_URL)
    }

    pub fn with_search_url(transport: Arc<dyn Transport>, search_url: &str) -> Self {
        Self {
            transport,
            search_url: search_url.to_string(),
        }
    }

    fn query_url(&self, app: &ApplicationDescriptor) -> String {
        format!(
            "{}?q={}",
            self.search_url,
            urlencoding::encode(&app.search_query())
        )
    }
}

/// Highest valid version mentioned in `text`.
fn highest_version(text: &str) -> Option<String> {
    let candidates: BTreeSet<&str> = VERSION_CANDIDATE
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|candidate| version::is_valid(candidate))
        .collect();

    candidates
        .into_iter()
        .max_by(|a, b| version::compare(a, b))
        .map(str::to_string)
}

/// First link on the page that stays on the page's host and points at a
/// download path.
fn download_link(page_url: &str, page: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    let host = base.host_str()?;

    html::links(page)
        .iter()
        .filter_map(|href| base.join(href).ok())
        .find(|link| link.host_str() == Some(host) && link.path().contains("download"))
        .map(String::from)
}

#[async_trait]
impl ScrapeStrategy for GenericStrategy {
    fn name(&self) -> &'static str {
        "Web Search"
    }

    fn publisher_key(&self) -> &str {
        "*"
    }

    fn source_url(&self) -> &str {
        &self.search_url
    }

    async fn fetch_latest(&self, app: &ApplicationDescriptor) -> Result<Release, ScrapeError> {
        let url = self.query_url(app);
        let page = self.transport.get_text(&url).await?;

        let version = highest_version(&html::visible_text(&page)).ok_or(ScrapeError::NoCandidates)?;
        let download_url = download_link(&url, &page);
        debug!(
            "Search for {} found version {} (download link: {:?})",
            app.name, version, download_url
        );

        let release = Release::new(version);
        Ok(match download_url {
            Some(link) => release.with_download_url(link),
            None => release,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::transport::HttpTransport;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn strategy(search_url: &str) -> GenericStrategy {
        let transport = HttpTransport::new("upwatch-test", Duration::from_secs(5)).unwrap();
        GenericStrategy::with_search_url(Arc::new(transport), search_url)
    }

    fn blender() -> ApplicationDescriptor {
        ApplicationDescriptor::new("Blender", "Blender Foundation", "3.6.0", "/opt/blender/blender")
    }

    #[test]
    fn test_highest_version() {
        let text = "Blender 4.2 LTS, 4.3.1 released; older 3.6.18 and 2.79";
        assert_eq!(highest_version(text).as_deref(), Some("4.3.1"));
        assert_eq!(highest_version("no numbers"), None);
    }

    #[test]
    fn test_highest_version_compares_numerically() {
        assert_eq!(highest_version("1.9 and 1.10").as_deref(), Some("1.10"));
    }

    #[test]
    fn test_download_link_same_host_only() {
        let page = r#"
            <a href="https://elsewhere.org/download/blender">mirror</a>
            <a href="/about">about</a>
            <a href="/download/blender-4.3.1.zip">get</a>"#;

        assert_eq!(
            download_link("https://search.example/search?q=x", page).as_deref(),
            Some("https://search.example/download/blender-4.3.1.zip")
        );
        assert_eq!(download_link("https://search.example/search", "<p>none</p>"), None);
    }

    #[tokio::test]
    async fn test_fetch_latest_searches_for_application() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "Blender Blender Foundation latest version download".into(),
            ))
            .with_status(200)
            .with_body(
                r#"<html><body>
                     <div class="g">Blender 4.3.1 is out. Upgrade from 3.6 LTS today.</div>
                     <div class="g"><a href="/download/blender">Download Blender 4.3</a></div>
                   </body></html>"#,
            )
            .create_async()
            .await;

        let release = strategy(&format!("{}/search", server.url()))
            .fetch_latest(&blender())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(release.version, "4.3.1");
        assert_eq!(
            release.download_url,
            Some(format!("{}/download/blender", server.url()))
        );
    }

    #[tokio::test]
    async fn test_fetch_latest_without_versions_is_no_candidates() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html><body>No results</body></html>")
            .create_async()
            .await;

        let result = strategy(&format!("{}/search", server.url()))
            .fetch_latest(&blender())
            .await;

        assert!(matches!(result, Err(ScrapeError::NoCandidates)));
    }
}
