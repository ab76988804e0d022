//! Cached WCL client that wraps WclClient with transparent response caching.

use chrono::Duration;
use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheLayer, CacheResult};
use crate::error::Result;

use super::api_types::parse_guild_response;
use super::cache::QueryKey;
use super::client::WclClient;
use super::queries::{GuildVariables, GUILD_KEY_PREFIX, GUILD_QUERY};
use super::types::{Guild, GuildLookup};

/// WCL client with get-or-populate caching.
///
/// Only guild lookups go through the cache; member rankings always hit
/// upstream via the plain client.
#[derive(Clone)]
pub struct CachedWclClient {
  inner: WclClient,
  cache: CacheLayer,
}

impl CachedWclClient {
  pub fn new(inner: WclClient, cache: CacheLayer) -> Self {
    Self { inner, cache }
  }

  /// Run a query, answering from the cache under `prefix:hash(variables)` when possible.
  pub async fn query_with_cache<V: Serialize + Sync + ?Sized>(
    &self,
    key_prefix: &str,
    document: &str,
    variables: &V,
    ttl: Option<Duration>,
  ) -> Result<CacheResult<Value>> {
    let key = QueryKey::new(key_prefix, variables)?.cache_key();

    self
      .cache
      .fetch(&key, ttl, || self.inner.query(document, variables))
      .await
  }

  /// Look up a guild by id or by name/server/region.
  pub async fn lookup_guild(&self, lookup: &GuildLookup) -> Result<CacheResult<Guild>> {
    let variables = GuildVariables::from(lookup);

    let result = self
      .query_with_cache(GUILD_KEY_PREFIX, GUILD_QUERY, &variables, None)
      .await?;

    let guild = parse_guild_response(result.data.clone())?;
    Ok(result.map(|_| guild))
  }
}
