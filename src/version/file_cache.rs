//! JSON file cache, the default [`CacheStore`]

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::version::error::CacheError;
use crate::version::store::CacheStore;
use crate::version::types::CacheRecord;

pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    /// `path` should be a full file path, normally ending in `.json`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl CacheStore for FileCache {
    async fn load(&self) -> Result<CacheRecord, CacheError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let record = serde_json::from_slice(&bytes)?;
        Ok(record)
    }

    async fn store(&self, record: &CacheRecord) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut json = serde_json::to_vec_pretty(record)?;
        json.push(b'\n');
        tokio::fs::write(&self.path, json).await?;

        debug!("Saved release check to {:?}", self.path);
        Ok(())
    }
}
