//! Read-through cache orchestrator with tag bookkeeping
//!
//! The population path is write-through on miss: the value write lands
//! first, tag writes follow, and only then is the value returned. A reader
//! that sees the value before its tags are recorded gets a correct, if
//! not-yet-evictable, read. The flip side is a narrow race: an invalidation
//! that reads a tag's members between those two writes will not evict the
//! fresh entry. No lock closes this window; per-entry TTLs are the backstop.

use common_redis::{Client, CustomRedisError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

use crate::keys::{CacheKey, TagName};
use crate::tag_index::TagIndex;
use crate::types::{CacheError, CacheResult, CacheSource};

/// The cache core's application-facing surface: get-or-populate, tagged
/// writes, direct reads/deletes, tag invalidation, and counter helpers.
///
/// Holds an explicitly constructed store client; create one per process and
/// share it (`TagCache` is cheap to clone behind an `Arc` if needed).
pub struct TagCache {
    client: Arc<dyn Client + Send + Sync>,
    tags: TagIndex,
}

impl TagCache {
    pub fn new(client: Arc<dyn Client + Send + Sync>) -> Self {
        let tags = TagIndex::new(client.clone());
        Self { client, tags }
    }

    /// Look up `key`; on a miss, compute the value with `loader`, cache it
    /// under `tags`, and return it.
    ///
    /// - A present key is a hit even if its value is empty or falsy; the
    ///   loader never runs and no tag bookkeeping happens.
    /// - Loader failures propagate unchanged; nothing is cached for them.
    /// - A corrupt stored value is deleted and recomputed.
    /// - If the store is unavailable the loader result is returned uncached,
    ///   degrading to direct-source reads.
    pub async fn get_or_populate<V, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl_seconds: Option<u64>,
        tags: &[TagName],
        loader: F,
    ) -> Result<CacheResult<V>, E>
    where
        V: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Send + Sync,
    {
        match self.fetch(key).await {
            Ok(value) => Ok(CacheResult::hit(value)),
            Err(CustomRedisError::NotFound) => {
                let value = loader().await?;
                self.write_back(key, &value, ttl_seconds, tags).await;
                Ok(CacheResult::loaded(value, CacheSource::LoaderCacheMiss))
            }
            Err(CustomRedisError::ParseError(err)) => {
                warn!(key = %key, error = %err, "corrupt cached value, refreshing from source");
                if let Err(e) = self.client.del(key.as_str().to_string()).await {
                    warn!(key = %key, error = %e, "failed to delete corrupt cache entry");
                }
                let value = loader().await?;
                self.write_back(key, &value, ttl_seconds, tags).await;
                Ok(CacheResult::loaded(value, CacheSource::LoaderCacheCorrupted))
            }
            Err(err) => {
                warn!(key = %key, error = %err, "cache unavailable, reading from source uncached");
                let value = loader().await?;
                Ok(CacheResult::loaded(
                    value,
                    CacheSource::LoaderStoreUnavailable,
                ))
            }
        }
    }

    /// Read and deserialize `key`. Absent keys, corrupt values (which are
    /// deleted), and an unavailable store all read as `None`.
    pub async fn get<V: DeserializeOwned>(&self, key: &CacheKey) -> Option<V> {
        match self.fetch(key).await {
            Ok(value) => Some(value),
            Err(CustomRedisError::NotFound) => None,
            Err(CustomRedisError::ParseError(err)) => {
                warn!(key = %key, error = %err, "corrupt cached value, dropping entry");
                if let Err(e) = self.client.del(key.as_str().to_string()).await {
                    warn!(key = %key, error = %e, "failed to delete corrupt cache entry");
                }
                None
            }
            Err(err) => {
                warn!(key = %key, error = %err, "cache unavailable, treating as miss");
                None
            }
        }
    }

    /// Write a value under `key`, then record it under each tag. The value
    /// write is strict; tag writes are best-effort (see [`TagIndex::attach`]).
    pub async fn set_with_tags<V: Serialize>(
        &self,
        key: &CacheKey,
        value: &V,
        ttl_seconds: Option<u64>,
        tags: &[TagName],
    ) -> Result<(), CacheError> {
        let serialized = serde_json::to_string(value)?;
        match ttl_seconds {
            Some(ttl) => {
                self.client
                    .setex(key.as_str().to_string(), serialized, ttl)
                    .await?
            }
            None => {
                self.client
                    .set(key.as_str().to_string(), serialized)
                    .await?
            }
        }
        self.tags.attach(key, tags).await;
        Ok(())
    }

    /// Delete a single entry; returns whether it was present. Does not touch
    /// tag sets - the dangling member is harmless and swept on invalidation.
    pub async fn delete_key(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.client.del(key.as_str().to_string()).await?)
    }

    /// Evict every entry under `tag`; returns whether any were evicted.
    pub async fn invalidate_tag(&self, tag: &TagName) -> Result<bool, CacheError> {
        Ok(self.tags.invalidate(tag).await?)
    }

    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.client.exists(key.to_string()).await?)
    }

    /// Atomic counter bump on a raw key (rate counters and the like),
    /// auto-creating at 0.
    pub async fn increment(&self, key: &str) -> Result<i64, CacheError> {
        Ok(self.client.incr(key.to_string()).await?)
    }

    pub async fn decrement(&self, key: &str) -> Result<i64, CacheError> {
        Ok(self.client.decr(key.to_string()).await?)
    }

    /// Attach or refresh a TTL on an existing raw key.
    pub async fn expire(&self, key: &str, ttl_seconds: i64) -> Result<bool, CacheError> {
        Ok(self.client.expire(key.to_string(), ttl_seconds).await?)
    }

    async fn fetch<V: DeserializeOwned>(&self, key: &CacheKey) -> Result<V, CustomRedisError> {
        let raw = self.client.get(key.as_str().to_string()).await?;
        serde_json::from_str(&raw).map_err(|e| {
            CustomRedisError::ParseError(format!("failed to deserialize cached value: {e}"))
        })
    }

    // Population writes are best-effort: the caller already has the value,
    // so a failed write degrades to an uncached read rather than an error.
    async fn write_back<V: Serialize>(
        &self,
        key: &CacheKey,
        value: &V,
        ttl_seconds: Option<u64>,
        tags: &[TagName],
    ) {
        if let Err(e) = self.set_with_tags(key, value, ttl_seconds, tags).await {
            warn!(key = %key, error = %e, "failed to populate cache entry");
        }
    }
}
