use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached information about the newest release seen by the last check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheRecord {
    /// When the release source was last consulted successfully
    pub check_time: DateTime<Utc>,
    /// The newest eligible release tag seen, independent of what is installed
    pub version: String,
    /// Revalidation token returned by the release source
    pub etag: String,
}

impl Default for CacheRecord {
    fn default() -> Self {
        Self {
            check_time: DateTime::<Utc>::UNIX_EPOCH,
            version: String::new(),
            etag: String::new(),
        }
    }
}

/// A single release entry, modeled after GitHub's release objects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
}

impl Release {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            ..Self::default()
        }
    }

    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    pub fn prerelease(mut self) -> Self {
        self.prerelease = true;
        self
    }
}

/// One page of releases plus the token to revalidate it with.
///
/// An empty `releases` list means nothing changed since the token that was
/// passed to the source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReleaseList {
    pub releases: Vec<Release>,
    pub etag: String,
}

impl ReleaseList {
    pub fn new(releases: Vec<Release>, etag: impl Into<String>) -> Self {
        Self {
            releases,
            etag: etag.into(),
        }
    }

    pub fn unchanged(etag: impl Into<String>) -> Self {
        Self::new(Vec::new(), etag)
    }

    pub fn is_unchanged(&self) -> bool {
        self.releases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_record_deserializes_with_missing_fields() {
        let record: CacheRecord = serde_json::from_str(r#"{"version": "v1.0.0"}"#).unwrap();

        assert_eq!(record.version, "v1.0.0");
        assert_eq!(record.etag, "");
        assert_eq!(record.check_time, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn release_deserializes_from_github_object() {
        let release: Release = serde_json::from_str(
            r#"{"tag_name": "v2.0.0-rc.1", "draft": false, "prerelease": true, "name": "RC"}"#,
        )
        .unwrap();

        assert_eq!(release, Release::new("v2.0.0-rc.1").prerelease());
    }
}
