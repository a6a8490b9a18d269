use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

use crate::{Client, CustomRedisError};

pub struct RedisClient {
    connection: MultiplexedConnection,
}

impl RedisClient {
    /// Create a new RedisClient with no command or connection timeouts.
    ///
    /// For timeout configuration, use `with_config()`.
    pub async fn new(addr: String) -> Result<RedisClient, CustomRedisError> {
        Self::with_config(addr, None, None).await
    }

    /// Create a new RedisClient with full configuration control.
    ///
    /// # Arguments
    /// * `addr` - Redis connection string (`redis://` or `rediss://` for TLS)
    /// * `response_timeout` - Optional timeout for command responses. `None` blocks indefinitely.
    /// * `connection_timeout` - Optional timeout for establishing connections. `None` blocks indefinitely.
    ///
    /// # Errors
    /// Returns `CustomRedisError::InvalidConfiguration` if `Some(Duration::ZERO)` is
    /// passed - use `None` for no timeout instead.
    ///
    /// The connection is multiplexed and process-wide: it is established once
    /// here and cloned per operation; the driver reconnects with backoff on
    /// transient disconnects.
    pub async fn with_config(
        addr: String,
        response_timeout: Option<Duration>,
        connection_timeout: Option<Duration>,
    ) -> Result<RedisClient, CustomRedisError> {
        let client = redis::Client::open(addr)?;

        if let Some(timeout) = response_timeout {
            if timeout.is_zero() {
                return Err(CustomRedisError::InvalidConfiguration(
                    "Redis response timeout cannot be Duration::ZERO - use None for no timeout"
                        .to_string(),
                ));
            }
        }
        if let Some(timeout) = connection_timeout {
            if timeout.is_zero() {
                return Err(CustomRedisError::InvalidConfiguration(
                    "Redis connection timeout cannot be Duration::ZERO - use None for no timeout"
                        .to_string(),
                ));
            }
        }

        let mut config = redis::AsyncConnectionConfig::new();

        if let Some(timeout) = response_timeout {
            config = config.set_response_timeout(timeout);
        }

        if let Some(timeout) = connection_timeout {
            config = config.set_connection_timeout(timeout);
        }

        let connection = client
            .get_multiplexed_async_connection_with_config(&config)
            .await?;

        Ok(RedisClient { connection })
    }
}

#[async_trait]
impl Client for RedisClient {
    async fn get(&self, k: String) -> Result<String, CustomRedisError> {
        let mut conn = self.connection.clone();
        // Absence and empty value are different things: a cached empty
        // string is still a hit, so only nil maps to NotFound.
        let raw: Option<Vec<u8>> = conn.get(&k).await?;
        debug!(key = %k, hit = raw.is_some(), "redis GET");

        match raw {
            Some(bytes) => Ok(String::from_utf8(bytes)?),
            None => Err(CustomRedisError::NotFound),
        }
    }

    async fn set(&self, k: String, v: String) -> Result<(), CustomRedisError> {
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(&k, v).await?;
        debug!(key = %k, "redis SET");
        Ok(())
    }

    async fn setex(&self, k: String, v: String, seconds: u64) -> Result<(), CustomRedisError> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(&k, v, seconds).await?;
        debug!(key = %k, ttl = seconds, "redis SETEX");
        Ok(())
    }

    async fn del(&self, k: String) -> Result<bool, CustomRedisError> {
        let mut conn = self.connection.clone();
        let removed: u64 = conn.del(&k).await?;
        debug!(key = %k, removed = removed > 0, "redis DEL");
        Ok(removed > 0)
    }

    async fn del_many(&self, keys: Vec<String>) -> Result<u64, CustomRedisError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection.clone();
        let removed: u64 = conn.del(&keys).await?;
        debug!(requested = keys.len(), removed, "redis DEL (bulk)");
        Ok(removed)
    }

    async fn exists(&self, k: String) -> Result<bool, CustomRedisError> {
        let mut conn = self.connection.clone();
        let present: bool = conn.exists(&k).await?;
        Ok(present)
    }

    async fn incr(&self, k: String) -> Result<i64, CustomRedisError> {
        let mut conn = self.connection.clone();
        let count: i64 = conn.incr(&k, 1).await?;
        debug!(key = %k, count, "redis INCR");
        Ok(count)
    }

    async fn decr(&self, k: String) -> Result<i64, CustomRedisError> {
        let mut conn = self.connection.clone();
        let count: i64 = conn.decr(&k, 1).await?;
        debug!(key = %k, count, "redis DECR");
        Ok(count)
    }

    async fn expire(&self, k: String, seconds: i64) -> Result<bool, CustomRedisError> {
        let mut conn = self.connection.clone();
        let applied: bool = conn.expire(&k, seconds).await?;
        debug!(key = %k, ttl = seconds, applied, "redis EXPIRE");
        Ok(applied)
    }

    async fn sadd(&self, k: String, member: String) -> Result<(), CustomRedisError> {
        let mut conn = self.connection.clone();
        conn.sadd::<_, _, ()>(&k, member).await?;
        Ok(())
    }

    async fn smembers(&self, k: String) -> Result<Vec<String>, CustomRedisError> {
        let mut conn = self.connection.clone();
        let members: Vec<String> = conn.smembers(&k).await?;
        Ok(members)
    }

    async fn srem(&self, k: String, members: Vec<String>) -> Result<u64, CustomRedisError> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection.clone();
        let removed: u64 = conn.srem(&k, &members).await?;
        Ok(removed)
    }

    async fn scard(&self, k: String) -> Result<u64, CustomRedisError> {
        let mut conn = self.connection.clone();
        let count: u64 = conn.scard(&k).await?;
        Ok(count)
    }
}
