//! Per-publisher release page scrapers.
//!
//! This module provides the [`ScrapeStrategy`] trait, one implementation
//! per supported publisher, and the [`ScraperRegistry`] that picks a
//! strategy for an application's publisher.
//!
//! # Built-in Strategies
//!
//! | Publisher key | Strategy | Source |
//! |---------------|----------|--------|
//! | `Mozilla` | [`MozillaStrategy`] | Firefox release index |
//! | `Google` | [`GoogleStrategy`] | Chrome releases blog |
//! | `JetBrains` | [`JetBrainsStrategy`] | JetBrains products API |
//! | `Visual Studio Code` | [`VsCodeStrategy`] | VS Code release notes |
//! | `Microsoft` | [`MicrosoftStrategy`] | Visual Studio release notes |
//! | (fallback) | [`GenericStrategy`] | Web search results |
//!
//! Publisher keys are matched case-insensitively as substrings of the
//! application's publisher, in registration order. A strategy may also
//! claim a product by name (see [`ScrapeStrategy::product_key`]); product
//! matches take precedence over publisher matches in
//! [`ScraperRegistry::select_for`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use upwatch::scraper::{HttpTransport, ScraperRegistry, DEFAULT_USER_AGENT};
//!
//! let transport = HttpTransport::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap();
//! let registry = ScraperRegistry::with_defaults(Arc::new(transport));
//!
//! let strategy = registry.find_strategy("Mozilla Foundation").unwrap();
//! assert_eq!(strategy.publisher_key(), "Mozilla");
//! ```

mod generic;
mod google;
pub mod html;
mod jetbrains;
mod microsoft;
mod mozilla;
mod transport;
mod vscode;

pub use generic::{GenericStrategy, DEFAULT_SEARCH_URL};
pub use google::GoogleStrategy;
pub use jetbrains::JetBrainsStrategy;
pub use microsoft::MicrosoftStrategy;
pub use mozilla::MozillaStrategy;
pub use vscode::VsCodeStrategy;
pub use transport::{
    get_json, HttpTransport, Transport, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};

use crate::error::ScrapeError;
use crate::model::ApplicationDescriptor;
use async_trait::async_trait;
use std::sync::Arc;

/// A version found upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Raw version token as it appeared on the page.
    pub version: String,
    pub download_url: Option<String>,
}

impl Release {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            download_url: None,
        }
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }
}

/// Fetches the latest upstream version for one publisher.
///
/// Each strategy performs a single request and extracts a version token
/// with a source-specific rule. Failures come back as [`ScrapeError`]
/// values; strategies never panic on bad pages.
#[async_trait]
pub trait ScrapeStrategy: Send + Sync {
    /// Returns the human-readable name of this strategy.
    fn name(&self) -> &'static str;

    /// Substring of the publisher name this strategy handles.
    fn publisher_key(&self) -> &str;

    /// Substring of the application name this strategy handles regardless
    /// of publisher. Used when one publisher ships products with unrelated
    /// release channels.
    fn product_key(&self) -> Option<&str> {
        None
    }

    /// Page or endpoint the version is read from.
    fn source_url(&self) -> &str;

    /// Fetches the latest release.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or no version token can be
    /// extracted from the response.
    async fn fetch_latest(&self, app: &ApplicationDescriptor) -> Result<Release, ScrapeError>;
}

/// Fetches `url` and returns the text of its first element with `class`.
pub(crate) async fn scrape_element(
    transport: &dyn Transport,
    url: &str,
    class: &str,
) -> Result<String, ScrapeError> {
    let page = transport.get_text(url).await?;
    html::element_text(&page, class).ok_or_else(|| ScrapeError::NotFound(url.to_string()))
}

/// Publisher strategies in match order, plus an optional fallback.
#[derive(Default)]
pub struct ScraperRegistry {
    strategies: Vec<Box<dyn ScrapeStrategy>>,
    fallback: Option<Box<dyn ScrapeStrategy>>,
}

impl ScraperRegistry {
    /// Creates an empty registry without a fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the built-in strategies and the web search fallback.
    pub fn with_defaults(transport: Arc<dyn Transport>) -> Self {
        Self::with_defaults_and_search(transport, DEFAULT_SEARCH_URL)
    }

    /// Like [`with_defaults`](Self::with_defaults) with a custom search endpoint.
    pub fn with_defaults_and_search(transport: Arc<dyn Transport>, search_url: &str) -> Self {
        Self::new()
            .register(MozillaStrategy::new(transport.clone()))
            .register(GoogleStrategy::new(transport.clone()))
            .register(JetBrainsStrategy::new(transport.clone()))
            .register(VsCodeStrategy::new(transport.clone()))
            .register(MicrosoftStrategy::new(transport.clone()))
            .with_fallback(GenericStrategy::with_search_url(transport, search_url))
    }

    /// Appends a strategy. Earlier registrations win on overlapping keys.
    pub fn register(mut self, strategy: impl ScrapeStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn with_fallback(mut self, strategy: impl ScrapeStrategy + 'static) -> Self {
        self.fallback = Some(Box::new(strategy));
        self
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    /// Finds the first strategy whose key occurs in `publisher`, ignoring case.
    ///
    /// ```
    /// use upwatch::scraper::{ScraperRegistry, HttpTransport, DEFAULT_USER_AGENT};
    /// use std::{sync::Arc, time::Duration};
    ///
    /// let transport = HttpTransport::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap();
    /// let registry = ScraperRegistry::with_defaults(Arc::new(transport));
    ///
    /// assert!(registry.find_strategy("Unknown Corp").is_none());
    /// ```
    pub fn find_strategy(&self, publisher: &str) -> Option<&dyn ScrapeStrategy> {
        let publisher = publisher.trim().to_lowercase();
        if publisher.is_empty() {
            return None;
        }

        self.strategies
            .iter()
            .find(|strategy| {
                let key = strategy.publisher_key().to_lowercase();
                !key.is_empty() && publisher.contains(&key)
            })
            .map(|strategy| strategy.as_ref())
    }

    /// The matching publisher strategy, or the fallback when none matches.
    pub fn select(&self, publisher: &str) -> Option<&dyn ScrapeStrategy> {
        self.find_strategy(publisher).or(self.fallback.as_deref())
    }

    /// Finds the strategy for an application.
    ///
    /// A strategy whose product key occurs in the application name wins;
    /// otherwise this is [`find_strategy`](Self::find_strategy) on the
    /// publisher.
    pub fn find_for(&self, app: &ApplicationDescriptor) -> Option<&dyn ScrapeStrategy> {
        let name = app.name.to_lowercase();

        self.strategies
            .iter()
            .find(|strategy| {
                strategy.product_key().is_some_and(|key| {
                    let key = key.to_lowercase();
                    !key.is_empty() && name.contains(&key)
                })
            })
            .map(|strategy| strategy.as_ref())
            .or_else(|| self.find_strategy(&app.publisher))
    }

    /// Like [`select`](Self::select), but also honors product keys.
    pub fn select_for(&self, app: &ApplicationDescriptor) -> Option<&dyn ScrapeStrategy> {
        self.find_for(app).or(self.fallback.as_deref())
    }

    /// Registered publisher strategies in match order.
    pub fn strategies(&self) -> impl Iterator<Item = &dyn ScrapeStrategy> {
        self.strategies.iter().map(|strategy| strategy.as_ref())
    }

    pub fn fallback(&self) -> Option<&dyn ScrapeStrategy> {
        self.fallback.as_deref()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned strategies for resolver and registry tests.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone)]
    pub(crate) enum Behavior {
        Version(&'static str),
        Fail,
        Hang,
        Slow(&'static str, Duration),
    }

    /// Strategy that returns a fixed outcome and counts its calls.
    pub(crate) struct StubStrategy {
        key: &'static str,
        product: Option<&'static str>,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl StubStrategy {
        pub(crate) fn new(key: &'static str, behavior: Behavior) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let stub = Self {
                key,
                product: None,
                behavior,
                calls: calls.clone(),
            };
            (stub, calls)
        }

        pub(crate) fn for_product(mut self, product: &'static str) -> Self {
            self.product = Some(product);
            self
        }
    }

    #[async_trait]
    impl ScrapeStrategy for StubStrategy {
        fn name(&self) -> &'static str {
            "Stub"
        }

        fn publisher_key(&self) -> &str {
            self.key
        }

        fn product_key(&self) -> Option<&str> {
            self.product
        }

        fn source_url(&self) -> &str {
            "https://stub.invalid/"
        }

        async fn fetch_latest(&self, _app: &ApplicationDescriptor) -> Result<Release, ScrapeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Version(version) => Ok(Release::new(*version)),
                Behavior::Fail => Err(ScrapeError::Status {
                    status: 500,
                    url: self.source_url().to_string(),
                }),
                Behavior::Hang => std::future::pending().await,
                Behavior::Slow(version, delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(Release::new(*version))
                }
            }
        }
    }
}
