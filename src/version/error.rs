use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,
}

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Repository not found: {0}")]
    NotFound(String),

    #[error("Not modified, but no etag was sent")]
    UnexpectedNotModified,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timed out waiting for releases")]
    TimedOut,

    #[error("Release check cancelled")]
    Cancelled,
}

/// Returned by [`crate::check::check`] when options contradict each other.
///
/// This is the only failure a caller ever sees; everything after a
/// successful launch degrades to "no update".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid options provided: both a cache path and a cache store were set")]
    ConflictingCache,

    #[error("invalid options provided: both a slug and a release source were set")]
    ConflictingSource,

    #[error("invalid options provided: neither a slug nor a release source was set")]
    MissingSource,
}
