//! Tag index: which cache keys belong to which tag
//!
//! Each tag owns a store-side set of entry keys. Membership is best-effort:
//! tag writes happen after the entry write and are not atomic with it, so
//! the index can briefly lag the keyspace in either direction. A missing
//! index entry only means a future invalidation will not evict that entry;
//! its TTL still will.

use common_redis::{Client, CustomRedisError};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::keys::{CacheKey, TagName};

pub struct TagIndex {
    client: Arc<dyn Client + Send + Sync>,
}

impl TagIndex {
    pub fn new(client: Arc<dyn Client + Send + Sync>) -> Self {
        Self { client }
    }

    /// Record `key` as a member of each tag's set.
    ///
    /// Each tag is an independent set-add. On the first failure the rest are
    /// skipped and a warning is logged; the entry stays indexed under the
    /// tags written so far. This is accepted staleness risk, not an error.
    pub async fn attach(&self, key: &CacheKey, tags: &[TagName]) {
        for tag in tags {
            if let Err(e) = self
                .client
                .sadd(tag.set_key(), key.as_str().to_string())
                .await
            {
                warn!(key = %key, tag = %tag, error = %e, "failed to attach tag, entry will miss future invalidations of it");
                return;
            }
        }
        if !tags.is_empty() {
            debug!(key = %key, tags = tags.len(), "tagged cache entry");
        }
    }

    /// Evict every entry recorded under `tag`, then drop the tag set itself.
    /// Returns whether any entries were actually evicted; a tag whose listed
    /// members were all deleted some other way reports `false`.
    ///
    /// This is a read-then-delete sequence, not an atomic sweep: entries
    /// tagged between the member read and the bulk delete survive until
    /// their TTL or the next invalidation.
    pub async fn invalidate(&self, tag: &TagName) -> Result<bool, CustomRedisError> {
        let set_key = tag.set_key();
        let members = self.client.smembers(set_key.clone()).await?;

        let mut removed = 0;
        if !members.is_empty() {
            removed = self.client.del_many(members.clone()).await?;
            debug!(tag = %tag, members = members.len(), removed, "invalidated tag");
        }
        self.client.del(set_key).await?;

        Ok(removed > 0)
    }
}
