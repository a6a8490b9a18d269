use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CustomRedisError {
    #[error("Not found in redis")]
    NotFound,
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout error")]
    Timeout,
    #[error(transparent)]
    Redis(#[from] Arc<redis::RedisError>),
}

impl From<redis::RedisError> for CustomRedisError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            CustomRedisError::Timeout
        } else {
            CustomRedisError::Redis(Arc::new(err))
        }
    }
}

impl From<std::string::FromUtf8Error> for CustomRedisError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        CustomRedisError::ParseError(err.to_string())
    }
}

impl CustomRedisError {
    /// True when the store itself is unreachable or timing out, as opposed to
    /// a miss or bad data. Callers degrade to their source of truth on these.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CustomRedisError::Timeout | CustomRedisError::Redis(_))
    }
}

/// Operational contract over the key-value store.
///
/// Every method is a suspension point; implementations must not block a
/// thread. `get` distinguishes "key absent" (`NotFound`) from "key present
/// with an empty value" - presence, not truthiness, decides a hit.
#[async_trait]
pub trait Client {
    async fn get(&self, k: String) -> Result<String, CustomRedisError>;
    async fn set(&self, k: String, v: String) -> Result<(), CustomRedisError>;
    /// Set with a TTL in seconds; the entry expires without renewal.
    async fn setex(&self, k: String, v: String, seconds: u64) -> Result<(), CustomRedisError>;
    /// Returns whether the key was present.
    async fn del(&self, k: String) -> Result<bool, CustomRedisError>;
    /// Bulk delete; returns the number of keys that existed.
    async fn del_many(&self, keys: Vec<String>) -> Result<u64, CustomRedisError>;
    async fn exists(&self, k: String) -> Result<bool, CustomRedisError>;
    /// Atomic counter increment, auto-creating at 0.
    async fn incr(&self, k: String) -> Result<i64, CustomRedisError>;
    async fn decr(&self, k: String) -> Result<i64, CustomRedisError>;
    /// Attach or refresh a TTL on an existing key; returns whether it applied.
    async fn expire(&self, k: String, seconds: i64) -> Result<bool, CustomRedisError>;
    async fn sadd(&self, k: String, member: String) -> Result<(), CustomRedisError>;
    /// Members of a set; an absent set is empty, not an error.
    async fn smembers(&self, k: String) -> Result<Vec<String>, CustomRedisError>;
    /// Remove members from a set; returns how many were removed.
    async fn srem(&self, k: String, members: Vec<String>) -> Result<u64, CustomRedisError>;
    async fn scard(&self, k: String) -> Result<u64, CustomRedisError>;
}

mod client;
mod mem;
mod mock;

pub use client::RedisClient;
pub use mem::InMemoryRedisClient;
pub use mock::{MockRedisCall, MockRedisClient, MockRedisValue};
