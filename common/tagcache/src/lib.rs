//! Tag-based cache invalidation layer over Redis
//!
//! This crate caches derived query results behind deterministically derived
//! keys, associates each entry with zero or more semantic tags, and evicts
//! everything under a tag in one sweep when the underlying data changes.
//! It supports:
//!
//! - Deterministic key derivation from a prefix and structured parameters
//! - Read-through population with caller-supplied async loaders
//! - Tag sets maintained in the store, invalidated with a single call
//! - Graceful degradation when Redis is unavailable (fall through to loader)
//! - Rich return types indicating cache source for observability
//!
//! # Example
//!
//! ```rust,ignore
//! use common_tagcache::{derive_key, TagCache, TagName, CacheSource};
//!
//! let cache = TagCache::new(redis_client);
//! let key = derive_key("job:list", &(&filters, page))?;
//!
//! let result = cache
//!     .get_or_populate(&key, Some(300), &[TagName::new("jobs")], || async {
//!         load_jobs(&filters, page).await
//!     })
//!     .await?;
//!
//! match result.source {
//!     CacheSource::Hit => println!("Cache hit!"),
//!     _ => println!("Loaded from source: {}", result.source),
//! }
//!
//! // Later, after a job is written:
//! cache.invalidate_tag(&TagName::new("jobs")).await?;
//! ```
//!
//! Consistency is deliberately best-effort: entry writes and tag-set writes
//! are separate operations, so a concurrent invalidation can miss an entry
//! whose tags are not yet recorded. Populated entries should always carry a
//! TTL so a missed eviction self-heals.

pub mod config;
pub mod keys;
pub mod metrics;
pub mod read_through;
pub mod tag_index;
pub mod types;

pub use config::CacheSettings;
pub use keys::{derive_key, CacheKey, TagName};
pub use metrics::TagCacheWithMetrics;
pub use read_through::TagCache;
pub use tag_index::TagIndex;
pub use types::{CacheError, CacheResult, CacheSource};
