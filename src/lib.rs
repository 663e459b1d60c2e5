pub mod cache;
pub mod config;
pub mod error;
pub mod inventory;
pub mod model;
pub mod output;
pub mod resolver;
pub mod scraper;
pub mod version;

pub use cache::TtlCache;
pub use config::Config;
pub use error::{ResolveError, ScrapeError};
pub use model::{ApplicationDescriptor, CheckReport, UpdateDecision};
pub use resolver::{ResolverConfig, UpdateResolver};
pub use scraper::{ScrapeStrategy, ScraperRegistry};
pub use version::SemanticVersion;
