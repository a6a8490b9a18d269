//! Cache key derivation and tag naming
//!
//! Entry keys and tag-set keys live in the same Redis namespace, so the two
//! families are kept apart by construction: derived entry keys end in a hex
//! digest, and tag-set keys carry the reserved `tag:` prefix. The newtypes
//! here make it a type error to pass one where the other is expected.

use serde::Serialize;

use crate::types::CacheError;

/// Reserved namespace for tag sets; never used for entry keys.
const TAG_SET_PREFIX: &str = "tag:";

/// An opaque cache-entry key, normally produced by [`derive_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an externally derived key. Prefer [`derive_key`] for keys built
    /// from query parameters.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A logical grouping of cache entries, e.g. `jobs` or `company-all:42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagName(String);

impl TagName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The store key under which this tag's member set lives.
    pub fn set_key(&self) -> String {
        format!("{TAG_SET_PREFIX}{}", self.0)
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive a cache key from a prefix and the parameters that identify the
/// query, e.g. `derive_key("job:list", &(&filters, page))`.
///
/// Parameters are JSON-encoded in their natural order and absorbed into a
/// 128-bit MD5 digest, so arbitrarily complex filters produce a
/// bounded-length key while the prefix keeps keys debuggable per query
/// family. Callers must pass parameters in a consistent order for two calls
/// to derive the same key.
pub fn derive_key<P: Serialize + ?Sized>(prefix: &str, parts: &P) -> Result<CacheKey, CacheError> {
    let raw = serde_json::to_string(parts)?;
    let digest = md5::compute(raw.as_bytes());
    Ok(CacheKey(format!("{prefix}:{digest:x}")))
}
