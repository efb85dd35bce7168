use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::version::error::CacheError;
use crate::version::store::CacheStore;
use crate::version::types::CacheRecord;

/// SQLite-backed [`CacheStore`]
///
/// One database can hold the release checks of several applications; each
/// `SqliteCache` reads and writes the single row named by its key.
pub struct SqliteCache {
    conn: Mutex<Connection>,
    key: String,
}

impl SqliteCache {
    pub fn new(db_path: &Path, key: &str) -> Result<Self, CacheError> {
        info!("Opening release check database at {:?}", db_path);

        let conn = Connection::open(db_path)?;

        // Several host processes may check at once
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let cache = Self {
            conn: Mutex::new(conn),
            key: key.to_string(),
        };

        cache.create_schema()?;
        Ok(cache)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Acquire database connection lock with proper error handling
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), CacheError> {
        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS release_checks (
                key TEXT PRIMARY KEY,
                check_time INTEGER NOT NULL,
                version TEXT NOT NULL,
                etag TEXT NOT NULL
            )
            "#,
            [],
        )?;

        debug!("Release check schema ready");
        Ok(())
    }

    fn load_record(&self) -> Result<CacheRecord, CacheError> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                "SELECT check_time, version, etag FROM release_checks WHERE key = ?1",
                [&self.key],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((check_time_ms, version, etag)) = row else {
            debug!("No release check stored for {}", self.key);
            return Ok(CacheRecord::default());
        };

        Ok(CacheRecord {
            check_time: DateTime::<Utc>::from_timestamp_millis(check_time_ms).unwrap_or_default(),
            version,
            etag,
        })
    }

    fn store_record(&self, record: &CacheRecord) -> Result<(), CacheError> {
        let conn = self.lock_conn()?;
        conn.execute(
            r#"
            INSERT INTO release_checks (key, check_time, version, etag)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key) DO UPDATE SET
                check_time = excluded.check_time,
                version = excluded.version,
                etag = excluded.etag
            "#,
            (
                &self.key,
                record.check_time.timestamp_millis(),
                &record.version,
                &record.etag,
            ),
        )?;

        debug!("Saved release check for {}", self.key);
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheStore for SqliteCache {
    async fn load(&self) -> Result<CacheRecord, CacheError> {
        self.load_record()
    }

    async fn store(&self, record: &CacheRecord) -> Result<(), CacheError> {
        self.store_record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record(version: &str, etag: &str) -> CacheRecord {
        CacheRecord {
            check_time: Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(),
            version: version.to_string(),
            etag: etag.to_string(),
        }
    }

    #[tokio::test]
    async fn load_returns_empty_record_for_unknown_key() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SqliteCache::new(&temp_dir.path().join("test.db"), "you/your-app").unwrap();

        assert_eq!(cache.load().await.unwrap(), CacheRecord::default());
    }

    #[tokio::test]
    async fn store_then_load_returns_same_record() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SqliteCache::new(&temp_dir.path().join("test.db"), "you/your-app").unwrap();

        let saved = record("v1.2.3", r#""etag-1""#);
        cache.store(&saved).await.unwrap();

        assert_eq!(cache.load().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn store_replaces_existing_record() {
        let temp_dir = TempDir::new().unwrap();
        let cache = SqliteCache::new(&temp_dir.path().join("test.db"), "you/your-app").unwrap();

        cache.store(&record("v1.0.0", "a")).await.unwrap();
        cache.store(&record("v2.0.0", "b")).await.unwrap();

        assert_eq!(cache.load().await.unwrap(), record("v2.0.0", "b"));
    }

    #[tokio::test]
    async fn keys_do_not_share_records() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let first = SqliteCache::new(&db_path, "you/first").unwrap();
        let second = SqliteCache::new(&db_path, "you/second").unwrap();

        first.store(&record("v1.0.0", "a")).await.unwrap();

        assert_eq!(second.load().await.unwrap(), CacheRecord::default());
        assert_eq!(first.load().await.unwrap(), record("v1.0.0", "a"));
    }

    #[tokio::test]
    async fn record_survives_reopening_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        SqliteCache::new(&db_path, "you/your-app")
            .unwrap()
            .store(&record("v3.1.4", "pi"))
            .await
            .unwrap();

        let reopened = SqliteCache::new(&db_path, "you/your-app").unwrap();
        assert_eq!(reopened.load().await.unwrap(), record("v3.1.4", "pi"));
    }
}
