//! Non-blocking release check
//!
//! [`check`] validates its options, starts the resolution on its own task and
//! returns an [`UpdateCheck`] right away. The host program does its real work
//! and reads the answer afterwards:
//!
//! ```no_run
//! use release_watch::check::{CheckOptions, check};
//!
//! # async fn run() -> Result<(), release_watch::version::error::ConfigError> {
//! let mut pending = check(CheckOptions::new("v0.1.0").slug("you/your-app"))?;
//!
//! // ... the program's main work ...
//!
//! if let Some(version) = pending.get().await {
//!     eprintln!("new release available: {version}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! When no Tokio runtime is running, the check gets a dedicated thread with a
//! current-thread runtime, and [`UpdateCheck::blocking_get`] reads the answer.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::config::{
    CheckConfig, DEFAULT_CHECK_INTERVAL, DEFAULT_GITHUB_API_URL, DEFAULT_TIMEOUT,
    default_cache_path,
};
use crate::version::error::{ConfigError, ReleaseError};
use crate::version::file_cache::FileCache;
use crate::version::resolver::{FetchBound, Resolution};
use crate::version::source::ReleaseSource;
use crate::version::sources::GitHubReleases;
use crate::version::store::{CacheStore, NoopCache};
use crate::version::types::ReleaseList;

/// Required and optional settings for a release check
///
/// The cache is either a file path or a custom [`CacheStore`], and the
/// release source is either a GitHub slug or a custom [`ReleaseSource`].
/// Setting both halves of either pair is a [`ConfigError`].
#[derive(Clone)]
pub struct CheckOptions {
    /// Semver version of the running program, e.g. `v1.2.3`
    pub current_version: String,
    /// GitHub repository slug, e.g. `owner/repo`
    pub slug: Option<String>,
    /// Full path to the JSON cache file. Defaults to a file under
    /// [`crate::config::data_dir`] named after the slug. Without a slug,
    /// path or custom store nothing is cached.
    pub cache_path: Option<PathBuf>,
    /// How often the release source may be consulted
    pub check_interval: Duration,
    /// Bound on waiting for the release source; `None` waits indefinitely
    /// and a zero duration means [`DEFAULT_TIMEOUT`]
    pub timeout: Option<Duration>,
    /// GitHub API base URL used with `slug`
    pub api_url: String,
    pub cache: Option<Arc<dyn CacheStore>>,
    pub source: Option<Arc<dyn ReleaseSource>>,
    /// Cancelling this token abandons the fetch like a timeout would
    pub cancel: Option<CancellationToken>,
}

impl CheckOptions {
    pub fn new(current_version: &str) -> Self {
        Self {
            current_version: current_version.to_string(),
            slug: None,
            cache_path: None,
            check_interval: DEFAULT_CHECK_INTERVAL,
            timeout: Some(DEFAULT_TIMEOUT),
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            cache: None,
            source: None,
            cancel: None,
        }
    }

    /// Build options from a file configuration
    pub fn from_config(current_version: &str, config: &CheckConfig) -> Self {
        let mut options = Self::new(current_version);
        options.slug = config.slug.clone();
        options.cache_path = config.cache_path.clone();
        options.check_interval = config.check_interval();
        options.timeout = config.timeout();
        if let Some(api_url) = &config.api_url {
            options.api_url = api_url.clone();
        }
        options
    }

    pub fn slug(mut self, slug: &str) -> Self {
        self.slug = Some(slug.to_string());
        self
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.to_string();
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn source(mut self, source: Arc<dyn ReleaseSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Validate the options and build the default collaborators
    fn resolve(self) -> Result<ResolvedCheck, ConfigError> {
        if self.cache.is_some() && self.cache_path.is_some() {
            return Err(ConfigError::ConflictingCache);
        }
        if self.source.is_some() && self.slug.is_some() {
            return Err(ConfigError::ConflictingSource);
        }

        let source: Arc<dyn ReleaseSource> = match (self.source, &self.slug) {
            (Some(source), _) => source,
            (None, Some(slug)) => {
                // A client that fails to build surfaces as a failed fetch later
                match GitHubReleases::with_base_url(&self.api_url, slug) {
                    Ok(github) => Arc::new(github),
                    Err(e) => Arc::new(Unavailable(e.to_string())),
                }
            }
            (None, None) => return Err(ConfigError::MissingSource),
        };

        let cache: Arc<dyn CacheStore> = match (self.cache, self.cache_path) {
            (Some(cache), _) => cache,
            (None, Some(path)) => Arc::new(FileCache::new(path)),
            (None, None) => match &self.slug {
                Some(slug) => Arc::new(FileCache::new(default_cache_path(slug))),
                None => {
                    debug!("No slug or cache path for custom source, caching disabled");
                    Arc::new(NoopCache)
                }
            },
        };

        Ok(ResolvedCheck {
            cache,
            source,
            current_version: self.current_version,
            check_interval: self.check_interval,
            timeout: self.timeout.map(|t| if t.is_zero() { DEFAULT_TIMEOUT } else { t }),
            cancel: self.cancel,
        })
    }
}

/// Options after validation, owned by the worker task
struct ResolvedCheck {
    cache: Arc<dyn CacheStore>,
    source: Arc<dyn ReleaseSource>,
    current_version: String,
    check_interval: Duration,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl ResolvedCheck {
    async fn run(self) -> Option<String> {
        let resolution = Resolution {
            cache: self.cache.as_ref(),
            source: self.source.as_ref(),
            current_version: &self.current_version,
            check_interval: self.check_interval,
            bound: FetchBound::new(self.timeout, self.cancel.clone()),
        };
        resolution.resolve(Utc::now()).await
    }
}

/// Stand-in source for a GitHub client that could not be constructed
struct Unavailable(String);

#[async_trait::async_trait]
impl ReleaseSource for Unavailable {
    async fn fetch_releases(&self, _etag: &str) -> Result<ReleaseList, ReleaseError> {
        Err(ReleaseError::InvalidResponse(self.0.clone()))
    }
}

/// Start a release check without blocking the caller.
///
/// Only option validation can fail; every later problem degrades to
/// "no update" and is logged.
pub fn check(options: CheckOptions) -> Result<UpdateCheck, ConfigError> {
    let resolved = options.resolve()?;
    let (tx, rx) = oneshot::channel();

    let work = async move {
        let newer = resolved.run().await;
        if tx.send(newer).is_err() {
            debug!("Release check finished after its handle was dropped");
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(work);
        }
        Err(_) => {
            let spawned = thread::Builder::new()
                .name("release-watch".to_string())
                .spawn(move || {
                    match tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                    {
                        Ok(runtime) => runtime.block_on(work),
                        Err(e) => error!("Failed to start release check runtime: {}", e),
                    }
                });
            if let Err(e) = spawned {
                error!("Failed to spawn release check thread: {}", e);
            }
        }
    }

    Ok(UpdateCheck {
        receiver: Some(rx),
        outcome: None,
    })
}

/// Handle to a running release check
///
/// The first read waits for the check to finish; every read after that
/// returns the same answer without running the check again.
#[derive(Debug)]
pub struct UpdateCheck {
    receiver: Option<oneshot::Receiver<Option<String>>>,
    outcome: Option<Option<String>>,
}

impl UpdateCheck {
    /// Wait for the check and return the newer version, if any.
    ///
    /// Cancel safe: dropping this future before it completes leaves the
    /// check running, and a later read still gets its answer.
    pub async fn get(&mut self) -> Option<&str> {
        if self.outcome.is_none() {
            let received = match self.receiver.as_mut() {
                Some(rx) => rx.await.unwrap_or_else(|_| {
                    warn!("Release check ended without an answer");
                    None
                }),
                None => None,
            };
            self.receiver = None;
            self.outcome = Some(received);
        }
        self.cached()
    }

    /// Blocking variant of [`UpdateCheck::get`] for synchronous callers.
    ///
    /// # Panics
    /// Panics if called from inside an async execution context.
    pub fn blocking_get(&mut self) -> Option<&str> {
        if self.outcome.is_none() {
            let received = match self.receiver.take() {
                Some(rx) => rx.blocking_recv().unwrap_or_else(|_| {
                    warn!("Release check ended without an answer");
                    None
                }),
                None => None,
            };
            self.outcome = Some(received);
        }
        self.cached()
    }

    /// The answer if it has already been read, without waiting
    pub fn cached(&self) -> Option<&str> {
        self.outcome.as_ref().and_then(|newer| newer.as_deref())
    }

    /// True once the answer has been read into the handle
    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }
}
