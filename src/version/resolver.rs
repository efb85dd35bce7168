//! Update resolution
//!
//! Combines the cached [`CacheRecord`], an optional conditional fetch from a
//! [`ReleaseSource`] and semver comparison into a single answer: the newest
//! release tag that is strictly newer than the running version, or nothing.
//!
//! A run moves through these steps exactly once:
//!
//! ```text
//! load cache ──▶ fresh? ──yes──▶ cached version ─────────────┐
//!                  │                                         ▼
//!                  no ──▶ fetch ──error──▶ cached version ──▶ compare with current
//!                           │                                ▲
//!                           ├─ unchanged ─▶ cached version ──┤ (cache rewritten)
//!                           └─ releases ──▶ max(selected, cached) (cache rewritten)
//! ```
//!
//! Cache and fetch failures never fail a run; they only push it onto the
//! fallback path and are reported through `tracing`.

use std::cmp::Ordering;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::version::error::ReleaseError;
use crate::version::semver::{VersionTag, compare_parsed};
use crate::version::source::ReleaseSource;
use crate::version::store::CacheStore;
use crate::version::types::{CacheRecord, Release};

/// Deadline and cancellation applied to the network-dependent part of a run
#[derive(Debug, Clone, Default)]
pub struct FetchBound {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl FetchBound {
    /// No deadline and no cancellation
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// The deadline starts counting now. `None` disables it.
    pub fn new(timeout: Option<Duration>, cancel: Option<CancellationToken>) -> Self {
        Self {
            deadline: timeout.and_then(|t| Instant::now().checked_add(t)),
            cancel,
        }
    }

    /// Drive `fut` until it completes, the deadline passes or the token fires.
    pub async fn run<T>(&self, fut: impl Future<Output = T>) -> Result<T, ReleaseError> {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        // A future that is already done wins over an expired bound
        tokio::select! {
            biased;
            output = fut => Ok(output),
            () = deadline => Err(ReleaseError::TimedOut),
            () = cancelled => Err(ReleaseError::Cancelled),
        }
    }
}

/// Everything one resolution run needs
pub struct Resolution<'a> {
    pub cache: &'a dyn CacheStore,
    pub source: &'a dyn ReleaseSource,
    pub current_version: &'a str,
    pub check_interval: Duration,
    pub bound: FetchBound,
}

impl Resolution<'_> {
    /// Run the resolution with `now` as the single clock reading.
    ///
    /// Returns the newer release tag, with its original prefix, or `None`
    /// when no newer release is known.
    pub async fn resolve(&self, now: DateTime<Utc>) -> Option<String> {
        let cached = self.load_cache().await;
        let cached_tag = VersionTag::parse(&cached.version);

        let candidate = if self.is_fresh(&cached, now) {
            debug!(
                "Last release check at {} is fresh, skipping fetch",
                cached.check_time
            );
            cached_tag
        } else {
            self.refresh(&cached, cached_tag, now).await
        };

        newer_than_current(candidate, self.current_version)
    }

    async fn load_cache(&self) -> CacheRecord {
        match self.bound.run(self.cache.load()).await {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                debug!("Treating release check cache as empty: {}", e);
                CacheRecord::default()
            }
            Err(e) => {
                warn!("Release check cache read interrupted: {}", e);
                CacheRecord::default()
            }
        }
    }

    fn is_fresh(&self, cached: &CacheRecord, now: DateTime<Utc>) -> bool {
        let interval = TimeDelta::from_std(self.check_interval).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(cached.check_time) < interval
    }

    async fn refresh(
        &self,
        cached: &CacheRecord,
        cached_tag: Option<VersionTag>,
        now: DateTime<Utc>,
    ) -> Option<VersionTag> {
        let fetched = self
            .bound
            .run(self.source.fetch_releases(&cached.etag))
            .await
            .and_then(|result| result);

        let list = match fetched {
            Ok(list) => list,
            Err(e) => {
                warn!("Release check failed, falling back to cache: {}", e);
                return cached_tag;
            }
        };

        if list.is_unchanged() {
            debug!("Releases unchanged since last check");
            self.save_cache(CacheRecord {
                check_time: now,
                version: cached.version.clone(),
                etag: list.etag,
            })
            .await;
            return cached_tag;
        }

        let selected = select_latest(&list.releases);
        // The remote maximum is stored as-is so a downgrade is noticed later
        self.save_cache(CacheRecord {
            check_time: now,
            version: selected.as_ref().map(ToString::to_string).unwrap_or_default(),
            etag: list.etag,
        })
        .await;

        match selected {
            Some(tag) if compare_parsed(Some(&tag), cached_tag.as_ref()) == Ordering::Greater => {
                Some(tag)
            }
            _ => cached_tag,
        }
    }

    async fn save_cache(&self, record: CacheRecord) {
        if let Err(e) = self.cache.store(&record).await {
            warn!("Failed to save release check: {}", e);
        }
    }
}

/// Pick the greatest stable release
///
/// Drafts, tags that are not semver and prereleases (flagged or by tag) are
/// skipped. On equal precedence the earlier entry wins.
pub fn select_latest(releases: &[Release]) -> Option<VersionTag> {
    let mut latest: Option<VersionTag> = None;

    for release in releases {
        if release.draft {
            debug!("Skipping draft release {}", release.tag_name);
            continue;
        }
        let Some(tag) = VersionTag::parse(&release.tag_name) else {
            debug!("Skipping non-semver release tag {:?}", release.tag_name);
            continue;
        };
        if release.prerelease || tag.is_prerelease() {
            debug!("Skipping prerelease {}", release.tag_name);
            continue;
        }
        if latest
            .as_ref()
            .is_none_or(|best| tag.precedence(best) == Ordering::Greater)
        {
            latest = Some(tag);
        }
    }

    latest
}

/// Keep `candidate` only if it is strictly newer than `current_version`
pub fn newer_than_current(candidate: Option<VersionTag>, current_version: &str) -> Option<String> {
    let current = VersionTag::parse(current_version);
    if compare_parsed(candidate.as_ref(), current.as_ref()) != Ordering::Greater {
        return None;
    }

    let newer = candidate.map(|tag| tag.to_string());
    if let Some(version) = &newer {
        info!("Newer release available: {} (running {})", version, current_version);
    }
    newer
}
