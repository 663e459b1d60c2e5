//! Configuration file handling.
//!
//! This module provides loading and saving of upwatch configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/upwatch/config.toml`
//! - macOS: `~/Library/Application Support/upwatch/config.toml`
//! - Windows: `%APPDATA%\upwatch\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! cache_ttl_secs = 3600
//! resolve_timeout_secs = 15
//! request_timeout_secs = 5
//! max_checks_per_session = 1
//! generic_fallback = true
//! search_url = "https://www.google.com/search"
//!
//! [ignore]
//! publishers = ["Internal*"]
//! applications = ["*Helper"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::DEFAULT_TTL_SECS;
use crate::model::ApplicationDescriptor;
use crate::resolver::{ResolverConfig, DEFAULT_MAX_CHECKS, DEFAULT_RESOLVE_TIMEOUT_SECS};
use crate::scraper::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SEARCH_URL, DEFAULT_USER_AGENT};

/// Application configuration.
///
/// This struct represents all configurable options for upwatch.
/// It can be loaded from a TOML file or created with default values.
///
/// # Example
///
/// ```no_run
/// use upwatch::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Cache TTL: {} seconds", config.cache_ttl_secs);
/// println!("Checks per session: {}", config.max_checks_per_session);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long a decision is cached, in seconds.
    ///
    /// Default: 3600 (one hour)
    pub cache_ttl_secs: u64,

    /// Deadline for resolving one application, in seconds.
    ///
    /// Default: 15
    pub resolve_timeout_secs: u64,

    /// Timeout for a single HTTP request, in seconds.
    ///
    /// Default: 5
    pub request_timeout_secs: u64,

    /// How many applications may be checked online per session.
    ///
    /// Further requests are answered from the last known decision or
    /// reported as skipped. Default: 1
    pub max_checks_per_session: usize,

    /// Whether publishers without a dedicated strategy fall back to a
    /// web search.
    ///
    /// Default: true
    pub generic_fallback: bool,

    /// Search endpoint used by the fallback strategy.
    pub search_url: String,

    /// User agent sent with every request.
    pub user_agent: String,

    /// Applications and publishers that are never checked.
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

/// Configuration for skipping specific applications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Publisher names to skip. Supports glob patterns (e.g., "Internal*").
    pub publishers: Vec<String>,

    /// Application names to skip. Supports glob patterns (e.g., "*Helper").
    pub applications: Vec<String>,
}

impl IgnoreConfig {
    /// Check if an application should not be resolved.
    pub fn should_ignore(&self, app: &ApplicationDescriptor) -> bool {
        matches_any(&self.publishers, &app.publisher)
            || matches_any(&self.applications, &app.name)
    }
}

fn matches_any(patterns: &[String], text: &str) -> bool {
    patterns.iter().any(|pattern| {
        if pattern.contains('*') {
            glob_match(pattern, text)
        } else {
            pattern == text
        }
    })
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    // Check prefix (before first *)
    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    // Check suffix (after last *)
    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    // Check middle parts
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_TTL_SECS,
            resolve_timeout_secs: DEFAULT_RESOLVE_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_checks_per_session: DEFAULT_MAX_CHECKS,
            generic_fallback: true,
            search_url: DEFAULT_SEARCH_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from an explicit path, falling back to defaults
    /// when the file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use upwatch::Config;
    ///
    /// let path = Config::config_path();
    /// println!("Config file: {}", path.display());
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("upwatch")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// Engine settings derived from this configuration.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            timeout: Duration::from_secs(self.resolve_timeout_secs),
            max_checks: self.max_checks_per_session,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str, publisher: &str) -> ApplicationDescriptor {
        ApplicationDescriptor::new(name, publisher, "1.0", format!("/apps/{name}"))
    }

    #[test]
    fn test_glob_match_exact() {
        assert!(glob_match("Firefox", "Firefox"));
        assert!(!glob_match("Firefox", "Chrome"));
    }

    #[test]
    fn test_glob_match_prefix() {
        assert!(glob_match("Internal*", "Internal"));
        assert!(glob_match("Internal*", "Internal Tools Ltd"));
        assert!(!glob_match("Internal*", "External"));
    }

    #[test]
    fn test_glob_match_suffix() {
        assert!(glob_match("*Helper", "Update Helper"));
        assert!(!glob_match("*Helper", "Helper Daemon"));
    }

    #[test]
    fn test_glob_match_contains() {
        assert!(glob_match("*Beta*", "Beta"));
        assert!(glob_match("*Beta*", "Firefox Beta Edition"));
        assert!(!glob_match("*Beta*", "Firefox"));
    }

    #[test]
    fn test_ignore_config() {
        let config = IgnoreConfig {
            publishers: vec!["Internal*".to_string()],
            applications: vec!["*Helper".to_string(), "Notepad".to_string()],
        };

        assert!(config.should_ignore(&app("Tool", "Internal Tools")));
        assert!(config.should_ignore(&app("Crash Helper", "Mozilla")));
        assert!(config.should_ignore(&app("Notepad", "Microsoft")));
        assert!(!config.should_ignore(&app("Firefox", "Mozilla")));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.resolve_timeout_secs, 15);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.max_checks_per_session, 1);
        assert!(config.generic_fallback);
        assert!(config.ignore.publishers.is_empty());
    }

    #[test]
    fn test_resolver_config() {
        let config = Config {
            max_checks_per_session: 20,
            ..Config::default()
        };
        let resolver = config.resolver_config();

        assert_eq!(resolver.cache_ttl, Duration::from_secs(3600));
        assert_eq!(resolver.timeout, Duration::from_secs(15));
        assert_eq!(resolver.max_checks, 20);
    }

    #[test]
    fn test_huge_cache_ttl_is_usable() {
        let config: Config = toml::from_str("cache_ttl_secs = 9223372036854775807").unwrap();
        let mut cache = crate::cache::TtlCache::new(config.resolver_config().cache_ttl);

        cache.set("k", 1);

        assert_eq!(cache.get("k"), Some(1));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_checks_per_session = 50\n[ignore]\npublishers = [\"Acme\"]\n").unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.max_checks_per_session, 50);
        assert_eq!(config.ignore.publishers, vec!["Acme".to_string()]);
        assert_eq!(config.resolve_timeout_secs, 15);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            generic_fallback: false,
            ..Config::default()
        };

        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_checks_per_session = \"many\"").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
