//! Release source trait for fetching candidate releases

#[cfg(test)]
use mockall::automock;

use crate::version::error::ReleaseError;
use crate::version::types::ReleaseList;

/// Trait for fetching the list of published releases
///
/// Implement this to check private repositories or releases hosted
/// somewhere other than GitHub.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches the first page of releases
    ///
    /// # Arguments
    /// * `etag` - Revalidation token from the previous fetch, empty if none
    ///
    /// # Returns
    /// * `Ok(ReleaseList)` - Releases in source order with a fresh token. If
    ///   nothing changed since `etag`, an empty list and the token to keep.
    /// * `Err(ReleaseError)` - If the fetch fails
    async fn fetch_releases(&self, etag: &str) -> Result<ReleaseList, ReleaseError>;
}
