//! Metrics wrapper for TagCache
//!
//! Wraps a [`TagCache`] and emits Prometheus-style counters for reads,
//! hits/misses, loader invocations, degraded reads, and tag invalidations,
//! keeping the core cache free of metrics coupling.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::keys::{CacheKey, TagName};
use crate::read_through::TagCache;
use crate::types::{CacheError, CacheResult};

/// Counter-emitting wrapper around [`TagCache`].
///
/// All metrics use the pattern `tag_cache_{metric}_total` with labels
/// `namespace` and `cache_name` plus any additional labels:
///
/// - `tag_cache_reads_total` - read attempts
/// - `tag_cache_hit_total{cache_hit="true|false"}` - hit/miss tracking
/// - `tag_cache_loader_invoked_total` - loader invocations
/// - `tag_cache_degraded_total{reason="..."}` - corrupt or unavailable store
/// - `tag_cache_invalidations_total{any_members="true|false"}` - tag sweeps
pub struct TagCacheWithMetrics {
    inner: Arc<TagCache>,
    namespace: &'static str,
    cache_name: &'static str,
    additional_labels: Vec<(String, String)>,
}

impl TagCacheWithMetrics {
    pub fn new(
        inner: Arc<TagCache>,
        namespace: &'static str,
        cache_name: &'static str,
        additional_labels: &[(String, String)],
    ) -> Self {
        Self {
            inner,
            namespace,
            cache_name,
            additional_labels: additional_labels.to_vec(),
        }
    }

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
        let result = self
            .inner
            .get_or_populate(key, ttl_seconds, tags, loader)
            .await?;

        self.emit_read_metrics(&result);

        Ok(result)
    }

    pub async fn invalidate_tag(&self, tag: &TagName) -> Result<bool, CacheError> {
        let any_members = self.inner.invalidate_tag(tag).await?;

        let mut labels = self.base_labels();
        labels.push(("any_members".to_string(), any_members.to_string()));
        inc("tag_cache_invalidations_total", &labels, 1);

        Ok(any_members)
    }

    pub async fn delete_key(&self, key: &CacheKey) -> Result<bool, CacheError> {
        self.inner.delete_key(key).await
    }

    fn base_labels(&self) -> Vec<(String, String)> {
        let mut labels = vec![
            ("namespace".to_string(), self.namespace.to_string()),
            ("cache_name".to_string(), self.cache_name.to_string()),
        ];
        labels.extend(self.additional_labels.clone());
        labels
    }

    fn emit_read_metrics<V>(&self, result: &CacheResult<V>) {
        let base_labels = self.base_labels();

        inc("tag_cache_reads_total", &base_labels, 1);

        let mut hit_labels = base_labels.clone();
        hit_labels.push(("cache_hit".to_string(), result.was_cached().to_string()));
        inc("tag_cache_hit_total", &hit_labels, 1);

        if result.invoked_loader() {
            inc("tag_cache_loader_invoked_total", &base_labels, 1);
        }

        if result.had_cache_problem() {
            let mut degraded_labels = base_labels;
            degraded_labels.push(("reason".to_string(), result.source.to_string()));
            inc("tag_cache_degraded_total", &degraded_labels, 1);
        }
    }
}

fn inc(name: &'static str, labels: &[(String, String)], value: u64) {
    let labels = labels.to_vec();
    metrics::counter!(name, &labels).increment(value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CacheSource;
    use common_redis::MockRedisClient;

    fn wrapped(client: MockRedisClient) -> TagCacheWithMetrics {
        TagCacheWithMetrics::new(
            Arc::new(TagCache::new(Arc::new(client))),
            "jobs",
            "job_list",
            &[("cache_type".to_string(), "shared".to_string())],
        )
    }

    #[tokio::test]
    async fn test_wrapper_passes_through_miss() {
        let cache = wrapped(MockRedisClient::new());

        let result = cache
            .get_or_populate(&CacheKey::new("k1"), Some(60), &[], || async {
                Ok::<String, String>("value".to_string())
            })
            .await
            .unwrap();

        assert_eq!(result.value, "value");
        assert!(result.invoked_loader());
    }

    #[tokio::test]
    async fn test_wrapper_passes_through_hit() {
        let client = MockRedisClient::new().get_ret("k1", Ok("\"cached\"".to_string()));
        let cache = wrapped(client);

        let result = cache
            .get_or_populate(&CacheKey::new("k1"), Some(60), &[], || async {
                Ok::<String, String>("fallback".to_string())
            })
            .await
            .unwrap();

        assert_eq!(result.value, "cached");
        assert_eq!(result.source, CacheSource::Hit);
    }

    #[tokio::test]
    async fn test_wrapper_passes_through_invalidation() {
        let client = MockRedisClient::new()
            .smembers_ret("tag:jobs", Ok(vec!["job:list:a".to_string()]));
        let cache = wrapped(client);

        assert!(cache.invalidate_tag(&TagName::new("jobs")).await.unwrap());
        assert!(!cache.invalidate_tag(&TagName::new("ghost")).await.unwrap());
    }
}
