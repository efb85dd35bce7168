use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default interval between release checks (one week)
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default bound on how long a check may spend waiting on the network
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default base URL for the GitHub API
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// File-based check configuration
///
/// Durations are in milliseconds. Zero means "use the default"; a negative
/// `timeout` disables the timeout.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckConfig {
    /// GitHub repository slug, e.g. `owner/repo`
    pub slug: Option<String>,
    /// Cache file path; derived from the slug when absent
    pub cache_path: Option<PathBuf>,
    pub check_interval: i64,
    pub timeout: i64,
    pub api_url: Option<String>,
}

impl CheckConfig {
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let contents = std::fs::read(path)?;
        serde_json::from_slice(&contents).map_err(std::io::Error::from)
    }

    pub fn check_interval(&self) -> Duration {
        match self.check_interval {
            ms if ms > 0 => Duration::from_millis(ms.unsigned_abs()),
            _ => DEFAULT_CHECK_INTERVAL,
        }
    }

    /// `None` means the check runs without a deadline
    pub fn timeout(&self) -> Option<Duration> {
        timeout_from_millis(self.timeout)
    }
}

/// Map a millisecond timeout setting: 0 is the default, negative disables it.
pub fn timeout_from_millis(ms: i64) -> Option<Duration> {
    match ms {
        0 => Some(DEFAULT_TIMEOUT),
        ms if ms < 0 => None,
        ms => Some(Duration::from_millis(ms.unsigned_abs())),
    }
}

/// Returns the path to the data directory for release-watch.
/// Uses $XDG_CACHE_HOME/release-watch if XDG_CACHE_HOME is set,
/// otherwise falls back to ~/.cache/release-watch,
/// or ./release-watch if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_CACHE_HOME").ok(), dirs::home_dir())
}

/// Returns the default cache file for a repository slug.
pub fn default_cache_path(slug: &str) -> PathBuf {
    data_dir().join(cache_file_name(slug))
}

/// Returns the default database path used by `--db` without a value.
pub fn db_path() -> PathBuf {
    data_dir().join("release-checks.db")
}

fn data_dir_with_env(xdg_cache_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_cache_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("release-watch")
}

fn cache_file_name(slug: &str) -> String {
    let stem: String = slug
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.json")
}
