//! Fixed release list source

use crate::version::error::ReleaseError;
use crate::version::source::ReleaseSource;
use crate::version::types::{Release, ReleaseList};

/// Release source that always answers with the same releases.
///
/// Useful for demos and for pinning a known release in tests. The etag it
/// returns is constant, so it never reports "unchanged".
pub struct StaticReleases {
    releases: Vec<Release>,
    etag: String,
}

impl StaticReleases {
    pub fn new(releases: Vec<Release>) -> Self {
        Self {
            releases,
            etag: String::new(),
        }
    }

    pub fn with_etag(mut self, etag: &str) -> Self {
        self.etag = etag.to_string();
        self
    }
}

#[async_trait::async_trait]
impl ReleaseSource for StaticReleases {
    async fn fetch_releases(&self, _etag: &str) -> Result<ReleaseList, ReleaseError> {
        Ok(ReleaseList::new(self.releases.clone(), self.etag.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_configured_releases_regardless_of_etag() {
        let source = StaticReleases::new(vec![Release::new("v0.99.0")]).with_etag("some-etag");

        let result = source.fetch_releases("anything").await.unwrap();

        assert_eq!(
            result,
            ReleaseList::new(vec![Release::new("v0.99.0")], "some-etag")
        );
    }
}
