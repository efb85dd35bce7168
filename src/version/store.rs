//! Cache store trait for persisting the last release check

#[cfg(test)]
use mockall::automock;

use crate::version::error::CacheError;
use crate::version::types::CacheRecord;

/// Trait for loading and saving the cached [`CacheRecord`]
///
/// Implement this to change where release checks are persisted, or to
/// disable persistence altogether (see [`NoopCache`]).
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Load the last saved record
    ///
    /// Errors (missing, unreadable or corrupt data) are treated as an empty
    /// record by the caller.
    async fn load(&self) -> Result<CacheRecord, CacheError>;

    /// Replace the saved record
    async fn store(&self, record: &CacheRecord) -> Result<(), CacheError>;
}

/// A store that remembers nothing, so every check hits the release source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait::async_trait]
impl CacheStore for NoopCache {
    async fn load(&self) -> Result<CacheRecord, CacheError> {
        Ok(CacheRecord::default())
    }

    async fn store(&self, _record: &CacheRecord) -> Result<(), CacheError> {
        Ok(())
    }
}
