use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::{Client, CustomRedisError};

enum Value {
    Str(String),
    Set(HashSet<String>),
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process stand-in for a real Redis keyspace, with honest semantics for
/// TTL expiry, set membership, counters, and type mismatches. Used by
/// integration tests that exercise full cache flows without a server.
///
/// Unlike [`MockRedisClient`](crate::MockRedisClient), which returns
/// programmed responses, this client actually stores what it is given.
#[derive(Clone, Default)]
pub struct InMemoryRedisClient {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl InMemoryRedisClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    // Expired entries are reaped lazily, on the next touch of their key.
    fn purge_if_expired(entries: &mut HashMap<String, Entry>, key: &str) {
        if entries.get(key).is_some_and(Entry::expired) {
            entries.remove(key);
        }
    }

    fn wrong_type() -> CustomRedisError {
        CustomRedisError::ParseError(
            "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
        )
    }
}

#[async_trait]
impl Client for InMemoryRedisClient {
    async fn get(&self, k: String) -> Result<String, CustomRedisError> {
        let mut entries = self.lock();
        Self::purge_if_expired(&mut entries, &k);
        match entries.get(&k) {
            Some(entry) => match &entry.value {
                Value::Str(s) => Ok(s.clone()),
                Value::Set(_) => Err(Self::wrong_type()),
            },
            None => Err(CustomRedisError::NotFound),
        }
    }

    async fn set(&self, k: String, v: String) -> Result<(), CustomRedisError> {
        self.lock().insert(
            k,
            Entry {
                value: Value::Str(v),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn setex(&self, k: String, v: String, seconds: u64) -> Result<(), CustomRedisError> {
        self.lock().insert(
            k,
            Entry {
                value: Value::Str(v),
                expires_at: Some(Instant::now() + Duration::from_secs(seconds)),
            },
        );
        Ok(())
    }

    async fn del(&self, k: String) -> Result<bool, CustomRedisError> {
        let mut entries = self.lock();
        Self::purge_if_expired(&mut entries, &k);
        Ok(entries.remove(&k).is_some())
    }

    async fn del_many(&self, keys: Vec<String>) -> Result<u64, CustomRedisError> {
        let mut entries = self.lock();
        let mut removed = 0;
        for key in keys {
            Self::purge_if_expired(&mut entries, &key);
            if entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn exists(&self, k: String) -> Result<bool, CustomRedisError> {
        let mut entries = self.lock();
        Self::purge_if_expired(&mut entries, &k);
        Ok(entries.contains_key(&k))
    }

    async fn incr(&self, k: String) -> Result<i64, CustomRedisError> {
        let mut entries = self.lock();
        Self::purge_if_expired(&mut entries, &k);
        let current = match entries.get(&k) {
            Some(entry) => match &entry.value {
                Value::Str(s) => s
                    .parse::<i64>()
                    .map_err(|_| CustomRedisError::ParseError("value is not an integer".to_string()))?,
                Value::Set(_) => return Err(Self::wrong_type()),
            },
            None => 0,
        };
        let next = current + 1;
        let expires_at = entries.get(&k).and_then(|e| e.expires_at);
        entries.insert(
            k,
            Entry {
                value: Value::Str(next.to_string()),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn decr(&self, k: String) -> Result<i64, CustomRedisError> {
        let mut entries = self.lock();
        Self::purge_if_expired(&mut entries, &k);
        let current = match entries.get(&k) {
            Some(entry) => match &entry.value {
                Value::Str(s) => s
                    .parse::<i64>()
                    .map_err(|_| CustomRedisError::ParseError("value is not an integer".to_string()))?,
                Value::Set(_) => return Err(Self::wrong_type()),
            },
            None => 0,
        };
        let next = current - 1;
        let expires_at = entries.get(&k).and_then(|e| e.expires_at);
        entries.insert(
            k,
            Entry {
                value: Value::Str(next.to_string()),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn expire(&self, k: String, seconds: i64) -> Result<bool, CustomRedisError> {
        let mut entries = self.lock();
        Self::purge_if_expired(&mut entries, &k);
        if !entries.contains_key(&k) {
            return Ok(false);
        }
        if seconds <= 0 {
            // Redis treats a non-positive TTL as an immediate delete
            entries.remove(&k);
        } else if let Some(entry) = entries.get_mut(&k) {
            entry.expires_at = Some(Instant::now() + Duration::from_secs(seconds as u64));
        }
        Ok(true)
    }

    async fn sadd(&self, k: String, member: String) -> Result<(), CustomRedisError> {
        let mut entries = self.lock();
        Self::purge_if_expired(&mut entries, &k);
        match entries.get_mut(&k) {
            Some(entry) => match &mut entry.value {
                Value::Set(members) => {
                    members.insert(member);
                    Ok(())
                }
                Value::Str(_) => Err(Self::wrong_type()),
            },
            None => {
                let mut members = HashSet::new();
                members.insert(member);
                entries.insert(
                    k,
                    Entry {
                        value: Value::Set(members),
                        expires_at: None,
                    },
                );
                Ok(())
            }
        }
    }

    async fn smembers(&self, k: String) -> Result<Vec<String>, CustomRedisError> {
        let mut entries = self.lock();
        Self::purge_if_expired(&mut entries, &k);
        match entries.get(&k) {
            Some(entry) => match &entry.value {
                Value::Set(members) => Ok(members.iter().cloned().collect()),
                Value::Str(_) => Err(Self::wrong_type()),
            },
            None => Ok(Vec::new()),
        }
    }

    async fn srem(&self, k: String, members: Vec<String>) -> Result<u64, CustomRedisError> {
        let mut entries = self.lock();
        Self::purge_if_expired(&mut entries, &k);
        let removed = match entries.get_mut(&k) {
            Some(entry) => match &mut entry.value {
                Value::Set(set) => {
                    let mut removed = 0;
                    for member in &members {
                        if set.remove(member) {
                            removed += 1;
                        }
                    }
                    removed
                }
                Value::Str(_) => return Err(Self::wrong_type()),
            },
            None => 0,
        };
        // Redis drops a set key once its last member is gone
        if let Some(entry) = entries.get(&k) {
            if let Value::Set(set) = &entry.value {
                if set.is_empty() {
                    entries.remove(&k);
                }
            }
        }
        Ok(removed)
    }

    async fn scard(&self, k: String) -> Result<u64, CustomRedisError> {
        let mut entries = self.lock();
        Self::purge_if_expired(&mut entries, &k);
        match entries.get(&k) {
            Some(entry) => match &entry.value {
                Value::Set(members) => Ok(members.len() as u64),
                Value::Str(_) => Err(Self::wrong_type()),
            },
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_get_distinguishes_absent_from_empty() {
        let client = InMemoryRedisClient::new();

        let missing = client.get("nope".to_string()).await;
        assert!(matches!(missing, Err(CustomRedisError::NotFound)));

        client.set("k".to_string(), "".to_string()).await.unwrap();
        assert_eq!(client.get("k".to_string()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_setex_expires() {
        let client = InMemoryRedisClient::new();
        client
            .setex("k".to_string(), "v".to_string(), 1)
            .await
            .unwrap();
        assert!(client.exists("k".to_string()).await.unwrap());

        sleep(Duration::from_millis(1100)).await;
        assert!(!client.exists("k".to_string()).await.unwrap());
        assert!(matches!(
            client.get("k".to_string()).await,
            Err(CustomRedisError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_del_reports_presence() {
        let client = InMemoryRedisClient::new();
        client.set("k".to_string(), "v".to_string()).await.unwrap();

        assert!(client.del("k".to_string()).await.unwrap());
        assert!(!client.del("k".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_counters_autocreate_and_keep_ttl() {
        let client = InMemoryRedisClient::new();

        assert_eq!(client.incr("c".to_string()).await.unwrap(), 1);
        assert_eq!(client.incr("c".to_string()).await.unwrap(), 2);
        assert_eq!(client.decr("c".to_string()).await.unwrap(), 1);

        assert!(client.expire("c".to_string(), 30).await.unwrap());
        assert_eq!(client.incr("c".to_string()).await.unwrap(), 2);
        assert!(client.exists("c".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_on_missing_key_is_not_applied() {
        let client = InMemoryRedisClient::new();
        assert!(!client.expire("nope".to_string(), 5).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_membership() {
        let client = InMemoryRedisClient::new();
        client
            .sadd("s".to_string(), "a".to_string())
            .await
            .unwrap();
        client
            .sadd("s".to_string(), "b".to_string())
            .await
            .unwrap();
        client
            .sadd("s".to_string(), "a".to_string())
            .await
            .unwrap();

        let mut members = client.smembers("s".to_string()).await.unwrap();
        members.sort();
        assert_eq!(members, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(client.scard("s".to_string()).await.unwrap(), 2);

        let removed = client
            .srem("s".to_string(), vec!["a".to_string(), "zzz".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);

        // Removing the last member drops the key entirely
        client
            .srem("s".to_string(), vec!["b".to_string()])
            .await
            .unwrap();
        assert!(!client.exists("s".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_smembers_of_absent_set_is_empty() {
        let client = InMemoryRedisClient::new();
        assert!(client.smembers("nope".to_string()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_type_mismatch_is_an_error() {
        let client = InMemoryRedisClient::new();
        client.set("k".to_string(), "v".to_string()).await.unwrap();

        let err = client.sadd("k".to_string(), "m".to_string()).await;
        assert!(matches!(err, Err(CustomRedisError::ParseError(_))));
    }
}
