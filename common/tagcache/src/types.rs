//! Core result and error types for cache operations
//!
//! - [`CacheError`]: failures of the cache's own operations (serialization,
//!   store access)
//! - [`CacheSource`]: where a value came from (for logging and metrics)
//! - [`CacheResult`]: a value plus its source

use common_redis::CustomRedisError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    /// A value could not be canonicalized for key derivation or encoded for
    /// storage. Loader failures are never wrapped here; they propagate as the
    /// caller's own error type.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] CustomRedisError),
}

/// Indicates where a returned value came from and what the cache had to do
/// to produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// Value was found in the store; the loader never ran
    Hit,
    /// Cache miss - value computed by the loader and written back
    LoaderCacheMiss,
    /// Stored value was corrupt - entry deleted, value recomputed and rewritten
    LoaderCacheCorrupted,
    /// Store was unavailable - value computed by the loader, nothing written
    LoaderStoreUnavailable,
}

impl fmt::Display for CacheSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheSource::Hit => write!(f, "hit"),
            CacheSource::LoaderCacheMiss => write!(f, "loader_cache_miss"),
            CacheSource::LoaderCacheCorrupted => write!(f, "loader_cache_corrupted"),
            CacheSource::LoaderStoreUnavailable => write!(f, "loader_store_unavailable"),
        }
    }
}

/// Result of a get-or-populate operation with source information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResult<V> {
    pub value: V,
    pub source: CacheSource,
}

impl<V> CacheResult<V> {
    pub fn hit(value: V) -> Self {
        Self {
            value,
            source: CacheSource::Hit,
        }
    }

    pub fn loaded(value: V, source: CacheSource) -> Self {
        Self { value, source }
    }

    /// True when the value came straight from the store.
    pub fn was_cached(&self) -> bool {
        matches!(self.source, CacheSource::Hit)
    }

    /// True when the loader function ran.
    pub fn invoked_loader(&self) -> bool {
        !self.was_cached()
    }

    /// True when the store misbehaved (corruption or unavailability).
    pub fn had_cache_problem(&self) -> bool {
        matches!(
            self.source,
            CacheSource::LoaderCacheCorrupted | CacheSource::LoaderStoreUnavailable
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_result_helpers() {
        let result = CacheResult::hit(42);
        assert_eq!(result.value, 42);
        assert!(result.was_cached());
        assert!(!result.invoked_loader());
        assert!(!result.had_cache_problem());

        let result = CacheResult::loaded(42, CacheSource::LoaderCacheMiss);
        assert!(!result.was_cached());
        assert!(result.invoked_loader());
        assert!(!result.had_cache_problem());

        let result = CacheResult::loaded(42, CacheSource::LoaderCacheCorrupted);
        assert!(result.invoked_loader());
        assert!(result.had_cache_problem());

        let result = CacheResult::loaded(42, CacheSource::LoaderStoreUnavailable);
        assert!(result.invoked_loader());
        assert!(result.had_cache_problem());
    }

    #[test]
    fn test_cache_source_display() {
        assert_eq!(CacheSource::Hit.to_string(), "hit");
        assert_eq!(
            CacheSource::LoaderCacheMiss.to_string(),
            "loader_cache_miss"
        );
        assert_eq!(
            CacheSource::LoaderCacheCorrupted.to_string(),
            "loader_cache_corrupted"
        );
        assert_eq!(
            CacheSource::LoaderStoreUnavailable.to_string(),
            "loader_store_unavailable"
        );
    }
}
