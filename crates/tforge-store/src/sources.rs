//! Trend source table.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use tforge_models::TrendSource;

use crate::error::{StoreError, StoreResult};

/// Database file used when `TFORGE_DB_PATH` is unset.
pub const DEFAULT_DB_PATH: &str = "tubeforge.db";

/// Schema version for migrations
const SCHEMA_VERSION: i32 = 1;

/// Trend source rows, shared between the API and the trend stage.
#[derive(Clone)]
pub struct TrendSourceStore {
    conn: Arc<Mutex<Connection>>,
}

impl TrendSourceStore {
    /// Open the database at `TFORGE_DB_PATH` (or the default file).
    pub fn from_env() -> StoreResult<Self> {
        let path = std::env::var("TFORGE_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
        Self::open_at(path)
    }

    /// Open or create the database at `path`.
    pub fn open_at<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self::wrap(Connection::open(path)?);
        store.init()?;
        info!("Trend source store opened at {}", path.display());
        Ok(store)
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let store = Self::wrap(Connection::open_in_memory()?);
        store.init()?;
        Ok(store)
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Create the schema if needed. Idempotent.
    pub fn init(&self) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
            [],
        )?;

        let current_version: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;

        if current_version < 1 {
            conn.execute(
                r#"
                CREATE TABLE IF NOT EXISTS trend_sources (
                    name TEXT PRIMARY KEY,
                    url TEXT NOT NULL,
                    api_key TEXT
                )
                "#,
                [],
            )?;
            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
            debug!("Applied trend source schema v{}", SCHEMA_VERSION);
        }

        Ok(())
    }

    /// Insert a row, or replace the url and key of an existing one.
    ///
    /// An updated row keeps its original position in [`list`](Self::list).
    pub fn upsert(&self, source: &TrendSource) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO trend_sources (name, url, api_key) VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET url = excluded.url, api_key = excluded.api_key
            "#,
            params![source.name, source.url, source.api_key],
        )?;
        Ok(())
    }

    /// All rows in insertion order.
    pub fn list(&self) -> StoreResult<Vec<TrendSource>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name, url, api_key FROM trend_sources ORDER BY rowid")?;
        let rows = stmt.query_map([], source_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn get(&self, name: &str) -> StoreResult<Option<TrendSource>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT name, url, api_key FROM trend_sources WHERE name = ?1",
            [name],
            source_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Delete a row. Returns whether it existed.
    pub fn remove(&self, name: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM trend_sources WHERE name = ?1", [name])?;
        Ok(deleted > 0)
    }

    /// Write the default Google and YouTube rows.
    ///
    /// A key already stored for a default row is kept when `youtube_api_key` is `None`.
    pub fn seed_defaults(&self, youtube_api_key: Option<String>) -> StoreResult<()> {
        let conn = self.lock()?;
        for source in TrendSource::defaults(youtube_api_key) {
            conn.execute(
                r#"
                INSERT INTO trend_sources (name, url, api_key) VALUES (?1, ?2, ?3)
                ON CONFLICT(name) DO UPDATE SET
                    url = excluded.url,
                    api_key = COALESCE(excluded.api_key, trend_sources.api_key)
                "#,
                params![source.name, source.url, source.api_key],
            )?;
        }
        Ok(())
    }
}

fn source_from_row(row: &Row<'_>) -> rusqlite::Result<TrendSource> {
    Ok(TrendSource::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?).with_api_key(row.get(2)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tforge_models::{GOOGLE_TRENDS, X_TRENDS, YOUTUBE_TRENDS};

    #[test]
    fn test_upsert_and_get() {
        let store = TrendSourceStore::open_in_memory().unwrap();
        let source = TrendSource::new(X_TRENDS, "https://x.com").with_api_key(Some("bearer".into()));
        store.upsert(&source).unwrap();

        assert_eq!(store.get(X_TRENDS).unwrap(), Some(source));
        assert_eq!(store.get("Missing").unwrap(), None);
    }

    #[test]
    fn test_list_keeps_insertion_order_across_updates() {
        let store = TrendSourceStore::open_in_memory().unwrap();
        store.upsert(&TrendSource::new("B", "https://b.example")).unwrap();
        store.upsert(&TrendSource::new("A", "https://a.example")).unwrap();
        store.upsert(&TrendSource::new("B", "https://b2.example")).unwrap();

        let rows = store.list().unwrap();
        let names: Vec<&str> = rows.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(rows[0].url, "https://b2.example");
    }

    #[test]
    fn test_remove() {
        let store = TrendSourceStore::open_in_memory().unwrap();
        store.upsert(&TrendSource::new("A", "https://a.example")).unwrap();

        assert!(store.remove("A").unwrap());
        assert!(!store.remove("A").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_seed_defaults_keeps_existing_key() {
        let store = TrendSourceStore::open_in_memory().unwrap();
        store.seed_defaults(Some("yt-key".into())).unwrap();
        store.seed_defaults(None).unwrap();

        let rows = store.list().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, GOOGLE_TRENDS);
        assert_eq!(rows[1].name, YOUTUBE_TRENDS);
        assert_eq!(rows[1].api_key.as_deref(), Some("yt-key"));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tubeforge.db");

        {
            let store = TrendSourceStore::open_at(&path).unwrap();
            store.upsert(&TrendSource::new("Custom", "https://c.example")).unwrap();
        }

        let store = TrendSourceStore::open_at(&path).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
        store.init().unwrap();
    }
}
