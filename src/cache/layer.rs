//! Cache layer that orchestrates caching logic with upstream fetching.

use chrono::Duration;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::storage::CacheStorage;
use super::traits::CacheResult;
use crate::error::Result;

/// Default time-to-live for cached responses: 12 hours.
pub const DEFAULT_TTL_SECS: i64 = 12 * 60 * 60;

/// Cache layer that manages get-or-populate around a fetcher.
///
/// Storage failures never fail a request: a failed read is a miss, and a
/// failed write still hands the fetched value back to the caller.
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
  /// Time-to-live applied when the caller gives no override
  ttl: Duration,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: impl CacheStorage + 'static) -> Self {
    Self {
      storage: Arc::new(storage),
      ttl: Duration::seconds(DEFAULT_TTL_SECS),
    }
  }

  /// Set the default time-to-live for written entries.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  /// Fetch a value with a cache-first strategy.
  ///
  /// 1. Check cache - if a non-null value is present, return it
  /// 2. Otherwise run the fetcher
  /// 3. Store the result with `ttl` or the layer default
  pub async fn fetch<F, Fut>(
    &self,
    key: &str,
    ttl: Option<Duration>,
    fetcher: F,
  ) -> Result<CacheResult<Value>>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
  {
    match self.storage.get(key) {
      Ok(Some(entry)) if !entry.value.is_null() => {
        tracing::debug!(key, cached_at = %entry.cached_at, "Cache hit");
        return Ok(CacheResult::from_cache(entry.value, entry.cached_at));
      }
      Ok(_) => tracing::debug!(key, "Cache miss"),
      Err(e) => tracing::warn!(key, error = %e, "Cache read failed, fetching from upstream"),
    }

    let data = fetcher().await?;

    if let Err(e) = self.storage.set(key, &data, ttl.unwrap_or(self.ttl)) {
      tracing::warn!(key, error = %e, "Cache write failed");
    }

    Ok(CacheResult::from_network(data))
  }
}

impl Clone for CacheLayer {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      ttl: self.ttl,
    }
  }
}
