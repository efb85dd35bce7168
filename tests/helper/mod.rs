//! Shared helpers for end-to-end release checks

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use mockito::{Mock, ServerGuard};
use tempfile::TempDir;

use release_watch::check::CheckOptions;
use release_watch::version::types::CacheRecord;

pub const SLUG: &str = "you/your-app";
pub const RELEASES_PATH: &str = "/repos/you/your-app/releases";

/// Temp dir holding the JSON cache for one test
pub struct CacheDir {
    _dir: TempDir,
    path: PathBuf,
}

impl CacheDir {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("update-cache.json");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, record: &CacheRecord) {
        std::fs::write(&self.path, serde_json::to_vec(record).unwrap()).unwrap();
    }

    pub fn read(&self) -> CacheRecord {
        serde_json::from_slice(&std::fs::read(&self.path).unwrap()).unwrap()
    }
}

pub fn stale_record(version: &str, etag: &str) -> CacheRecord {
    CacheRecord {
        check_time: Utc::now() - Duration::days(30),
        version: version.to_string(),
        etag: etag.to_string(),
    }
}

/// Options for a GitHub-backed check against the mock server
pub fn options(server: &ServerGuard, cache: &CacheDir, current: &str) -> CheckOptions {
    CheckOptions::new(current)
        .slug(SLUG)
        .api_url(&server.url())
        .cache_path(cache.path())
}

/// Mock a 200 response listing `body` with the given etag
pub async fn mock_releases(server: &mut ServerGuard, body: &str, etag: &str) -> Mock {
    server
        .mock("GET", RELEASES_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("etag", etag)
        .with_body(body)
        .create_async()
        .await
}
