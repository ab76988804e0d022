//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, WclError};

/// A single unexpired cache entry.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  pub value: Value,
  /// When the entry was written
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
///
/// Entries past their TTL must read as absent.
pub trait CacheStorage: Send + Sync {
  /// Get the value stored under `key`, if present and unexpired.
  fn get(&self, key: &str) -> Result<Option<CachedEntry>>;

  /// Store `value` under `key`, replacing any previous entry.
  fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> Result<Option<CachedEntry>> {
    Ok(None) // Always miss
  }

  fn set(&self, _key: &str, _value: &Value, _ttl: Duration) -> Result<()> {
    Ok(()) // Discard
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the cache database at `path`, or at the default location.
  pub fn open(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| WclError::Cache(format!("Failed to create cache directory: {}", e)))?;
    }

    let conn = Connection::open(&path).map_err(|e| {
      WclError::Cache(format!(
        "Failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    tracing::info!(path = %path.display(), "Opened response cache");
    Self::from_connection(conn)
  }

  /// Open a private in-memory database. Contents are lost on drop.
  pub fn open_in_memory() -> Result<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    let purged = storage.purge_expired()?;
    if purged > 0 {
      tracing::debug!(purged, "Removed expired cache entries");
    }
    Ok(storage)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| WclError::Cache("Could not determine data directory".to_string()))?;

    Ok(data_dir.join("wcl-proxy").join("cache.db"))
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| WclError::Cache(format!("Lock poisoned: {}", e)))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| WclError::Cache(format!("Failed to run cache migrations: {}", e)))?;

    Ok(())
  }

  /// Delete every entry whose TTL has elapsed. Returns the number of rows removed.
  pub fn purge_expired(&self) -> Result<usize> {
    let conn = self.lock()?;
    let removed = conn.execute(
      "DELETE FROM response_cache WHERE expires_at <= ?",
      params![Utc::now().timestamp()],
    )?;
    Ok(removed)
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- Flat key/value store of serialized JSON responses
CREATE TABLE IF NOT EXISTS response_cache (
    cache_key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_response_cache_expires
    ON response_cache(expires_at);
"#;

impl CacheStorage for SqliteStorage {
  fn get(&self, key: &str) -> Result<Option<CachedEntry>> {
    let conn = self.lock()?;

    let row: Option<(Vec<u8>, String)> = conn
      .query_row(
        "SELECT data, cached_at FROM response_cache
         WHERE cache_key = ? AND expires_at > ?",
        params![key, Utc::now().timestamp()],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()?;

    match row {
      Some((data, cached_at_str)) => {
        let value: Value = serde_json::from_slice(&data)
          .map_err(|e| WclError::Cache(format!("Failed to deserialize entry {}: {}", key, e)))?;
        let cached_at = parse_datetime(&cached_at_str)?;
        Ok(Some(CachedEntry { value, cached_at }))
      }
      None => Ok(None),
    }
  }

  fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
    let conn = self.lock()?;
    let data = serde_json::to_vec(value)
      .map_err(|e| WclError::Cache(format!("Failed to serialize entry {}: {}", key, e)))?;
    let expires_at = (Utc::now() + ttl).timestamp();

    conn
      .execute(
        "INSERT OR REPLACE INTO response_cache (cache_key, data, cached_at, expires_at)
         VALUES (?, ?, datetime('now'), ?)",
        params![key, data, expires_at],
      )
      .map_err(|e| WclError::Cache(format!("Failed to store entry {}: {}", key, e)))?;

    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| WclError::Cache(format!("Failed to parse datetime '{}': {}", s, e)))
}
