//! Update resolution engine.
//!
//! [`UpdateResolver`] answers "is there a newer version of this
//! application?" for one [`ApplicationDescriptor`] at a time. Each request
//! moves through the same steps:
//!
//! 1. **Cache hit**: a live cached decision for the application path is
//!    returned as is.
//! 2. **Throttle**: once the session check budget is spent, the last known
//!    decision for the path is returned, or a "skipped" decision if there
//!    is none. No network traffic happens.
//! 3. **Resolve**: a strategy is selected by publisher and raced against the
//!    resolution deadline. Timeouts, missing strategies, fetch and parse
//!    failures all become decisions with a note.
//! 4. **Cache write**: the decision replaces the cache entry for the path.
//!
//! The resolver never returns an error. All shared state (cache, last
//! decisions, in-flight checks, session counter) sits behind one lock, so
//! a single resolver can serve concurrent requests by reference. Concurrent
//! requests for the same path share one network check: later callers wait
//! for the first one's decision instead of spending another slot.
//!
//! The default budget of one check per session mirrors the behavior this
//! engine was built to reproduce. It is very aggressive; raise
//! [`ResolverConfig::max_checks`] for batch use.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use upwatch::resolver::{ResolverConfig, UpdateResolver};
//! use upwatch::scraper::{HttpTransport, ScraperRegistry, DEFAULT_USER_AGENT};
//! use upwatch::ApplicationDescriptor;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let transport = HttpTransport::new(DEFAULT_USER_AGENT, Duration::from_secs(5))?;
//!     let registry = ScraperRegistry::with_defaults(Arc::new(transport));
//!     let resolver = UpdateResolver::new(registry, ResolverConfig::default());
//!
//!     let firefox = ApplicationDescriptor::new("Firefox", "Mozilla", "100.0", "/usr/bin/firefox");
//!     let decision = resolver.resolve_update(&firefox).await;
//!     println!("update available: {}", decision.has_update);
//!     Ok(())
//! }
//! ```

use crate::cache::{TtlCache, DEFAULT_TTL_SECS};
use crate::error::ResolveError;
use crate::model::{ApplicationDescriptor, UpdateDecision};
use crate::scraper::ScraperRegistry;
use crate::version;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default deadline for a single resolution, in seconds.
pub const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 15;

/// Default number of network checks allowed per session.
pub const DEFAULT_MAX_CHECKS: usize = 1;

/// Tuning knobs for [`UpdateResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// How long a decision stays in the cache.
    pub cache_ttl: Duration,
    /// Deadline for one strategy fetch.
    pub timeout: Duration,
    /// Network checks allowed before the resolver stops fetching.
    pub max_checks: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            timeout: Duration::from_secs(DEFAULT_RESOLVE_TIMEOUT_SECS),
            max_checks: DEFAULT_MAX_CHECKS,
        }
    }
}

/// Published once the first request for a path has its decision.
type Pending = watch::Receiver<Option<UpdateDecision>>;

struct SessionState {
    cache: TtlCache<PathBuf, UpdateDecision>,
    /// Most recent decision per path, kept past cache expiry for throttled
    /// requests. Holds one entry per distinct path until [`UpdateResolver::reset`].
    last: HashMap<PathBuf, UpdateDecision>,
    in_flight: HashMap<PathBuf, Pending>,
    checks: usize,
}

enum Admission {
    Cached(UpdateDecision),
    Throttled(Option<UpdateDecision>),
    InFlight(Pending),
    Proceed(watch::Sender<Option<UpdateDecision>>),
}

/// Resolves update decisions with caching, throttling and a deadline.
pub struct UpdateResolver {
    registry: ScraperRegistry,
    config: ResolverConfig,
    state: Mutex<SessionState>,
}

impl UpdateResolver {
    pub fn new(registry: ScraperRegistry, config: ResolverConfig) -> Self {
        let state = SessionState {
            cache: TtlCache::new(config.cache_ttl),
            last: HashMap::new(),
            in_flight: HashMap::new(),
            checks: 0,
        };

        Self {
            registry,
            config,
            state: Mutex::new(state),
        }
    }

    pub fn registry(&self) -> &ScraperRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Number of network checks started this session.
    pub fn checks_performed(&self) -> usize {
        self.state().checks
    }

    /// Forgets all cached decisions and restores the session check budget.
    ///
    /// Checks already running still complete and record their decision.
    pub fn reset(&self) {
        let mut state = self.state();
        state.cache.clear();
        state.last.clear();
        state.in_flight.clear();
        state.checks = 0;
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decides whether `app` has a newer upstream version.
    ///
    /// Never fails. Anything that prevents a decision is reported through
    /// [`UpdateDecision::note`]. Does not wait longer than the configured
    /// timeout on the network.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if `app.version` is empty: callers must not
    /// submit descriptors without an installed version.
    pub async fn resolve_update(&self, app: &ApplicationDescriptor) -> UpdateDecision {
        debug_assert!(
            !app.version.trim().is_empty(),
            "application descriptor for {} has no version",
            app.path.display()
        );
        if app.version.trim().is_empty() {
            warn!("Refusing to resolve {} without a version", app.path.display());
            return UpdateDecision::unresolved(
                &app.version,
                ResolveError::InvalidVersion(app.version.clone()).to_string(),
            );
        }

        let publish = loop {
            match self.admit(&app.path) {
                Admission::Cached(decision) => {
                    debug!("Cache hit for {}", app.path.display());
                    return decision;
                }
                Admission::Throttled(last) => {
                    info!(
                        "Check budget of {} exhausted, not checking {}",
                        self.config.max_checks, app.name
                    );
                    return last.unwrap_or_else(|| UpdateDecision::skipped(&app.version));
                }
                Admission::InFlight(mut pending) => {
                    debug!("Waiting for running check of {}", app.path.display());
                    if let Ok(decision) = pending.wait_for(Option::is_some).await {
                        if let Some(decision) = decision.clone() {
                            return decision;
                        }
                    }
                    // The running check was dropped before deciding; try again.
                }
                Admission::Proceed(publish) => break publish,
            }
        };

        let decision = match self.fetch_decision(app).await {
            Ok(decision) => decision,
            Err(err) => {
                info!("No version for {} ({}): {}", app.name, app.publisher, err);
                UpdateDecision::unresolved(&app.version, err.to_string())
            }
        };

        self.record(&app.path, decision.clone());
        publish.send_replace(Some(decision.clone()));
        decision
    }

    /// Checks the cache, running checks and the session budget, reserving a
    /// check slot when the request may go to the network.
    fn admit(&self, path: &Path) -> Admission {
        let mut state = self.state();

        if let Some(decision) = state.cache.get(path) {
            return Admission::Cached(decision);
        }

        // A closed channel means the check that owned it was cancelled.
        let pending = state
            .in_flight
            .get(path)
            .map(|pending| (pending.has_changed().is_ok(), pending.clone()));
        match pending {
            Some((true, pending)) => return Admission::InFlight(pending),
            Some((false, _)) => {
                state.in_flight.remove(path);
            }
            None => {}
        }

        if state.checks >= self.config.max_checks {
            return Admission::Throttled(state.last.get(path).cloned());
        }

        state.checks += 1;
        let (publish, pending) = watch::channel(None);
        state.in_flight.insert(path.to_path_buf(), pending);
        Admission::Proceed(publish)
    }

    fn record(&self, path: &Path, decision: UpdateDecision) {
        let mut state = self.state();
        state.in_flight.remove(path);
        state.last.insert(path.to_path_buf(), decision.clone());
        state.cache.set(path.to_path_buf(), decision);
    }

    async fn fetch_decision(&self, app: &ApplicationDescriptor) -> Result<UpdateDecision, ResolveError> {
        let strategy = self
            .registry
            .select_for(app)
            .ok_or(ResolveError::NoStrategy)?;

        debug!(
            "Checking {} with {} ({})",
            app.name,
            strategy.name(),
            strategy.source_url()
        );

        let release = tokio::time::timeout(self.config.timeout, strategy.fetch_latest(app))
            .await
            .map_err(|_| ResolveError::Timeout)??;

        if !version::is_valid(&release.version) {
            return Err(ResolveError::InvalidVersion(release.version));
        }

        Ok(UpdateDecision::resolved(
            &app.version,
            &release.version,
            release.download_url,
        ))
    }
}
