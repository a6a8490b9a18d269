use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{Client, CustomRedisError};

/// Programmable stub client that records every call it receives.
///
/// Reads default to `NotFound` / empty unless a return value is programmed;
/// writes default to success. Tests assert on `get_calls()` to verify
/// operation ordering (e.g. that a value write lands before its tag writes).
#[derive(Clone, Default)]
pub struct MockRedisClient {
    get_ret: HashMap<String, Result<String, CustomRedisError>>,
    set_ret: HashMap<String, Result<(), CustomRedisError>>,
    setex_ret: HashMap<String, Result<(), CustomRedisError>>,
    del_ret: HashMap<String, Result<bool, CustomRedisError>>,
    del_many_ret: Option<Result<u64, CustomRedisError>>,
    exists_ret: HashMap<String, Result<bool, CustomRedisError>>,
    incr_ret: HashMap<String, Result<i64, CustomRedisError>>,
    decr_ret: HashMap<String, Result<i64, CustomRedisError>>,
    expire_ret: HashMap<String, Result<bool, CustomRedisError>>,
    sadd_ret: HashMap<String, Result<(), CustomRedisError>>,
    smembers_ret: HashMap<String, Result<Vec<String>, CustomRedisError>>,
    srem_ret: HashMap<String, Result<u64, CustomRedisError>>,
    scard_ret: HashMap<String, Result<u64, CustomRedisError>>,
    calls: Arc<Mutex<Vec<MockRedisCall>>>,
}

impl MockRedisClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<MockRedisCall>> {
        match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get_ret(&mut self, key: &str, ret: Result<String, CustomRedisError>) -> Self {
        self.get_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn set_ret(&mut self, key: &str, ret: Result<(), CustomRedisError>) -> Self {
        self.set_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn setex_ret(&mut self, key: &str, ret: Result<(), CustomRedisError>) -> Self {
        self.setex_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn del_ret(&mut self, key: &str, ret: Result<bool, CustomRedisError>) -> Self {
        self.del_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn del_many_ret(&mut self, ret: Result<u64, CustomRedisError>) -> Self {
        self.del_many_ret = Some(ret);
        self.clone()
    }

    pub fn exists_ret(&mut self, key: &str, ret: Result<bool, CustomRedisError>) -> Self {
        self.exists_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn incr_ret(&mut self, key: &str, ret: Result<i64, CustomRedisError>) -> Self {
        self.incr_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn decr_ret(&mut self, key: &str, ret: Result<i64, CustomRedisError>) -> Self {
        self.decr_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn expire_ret(&mut self, key: &str, ret: Result<bool, CustomRedisError>) -> Self {
        self.expire_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn sadd_ret(&mut self, key: &str, ret: Result<(), CustomRedisError>) -> Self {
        self.sadd_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn smembers_ret(&mut self, key: &str, ret: Result<Vec<String>, CustomRedisError>) -> Self {
        self.smembers_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn srem_ret(&mut self, key: &str, ret: Result<u64, CustomRedisError>) -> Self {
        self.srem_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn scard_ret(&mut self, key: &str, ret: Result<u64, CustomRedisError>) -> Self {
        self.scard_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn get_calls(&self) -> Vec<MockRedisCall> {
        self.lock_calls().clone()
    }
}

#[derive(Debug, Clone)]
pub enum MockRedisValue {
    None,
    String(String),
    StringWithTTL(String, u64),
    VecString(Vec<String>),
    I64(i64),
}

#[derive(Debug, Clone)]
pub struct MockRedisCall {
    pub op: String,
    pub key: String,
    pub value: MockRedisValue,
}

#[async_trait]
impl Client for MockRedisClient {
    async fn get(&self, key: String) -> Result<String, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "get".to_string(),
            key: key.clone(),
            value: MockRedisValue::None,
        });

        self.get_ret
            .get(&key)
            .cloned()
            .unwrap_or(Err(CustomRedisError::NotFound))
    }

    async fn set(&self, key: String, value: String) -> Result<(), CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "set".to_string(),
            key: key.clone(),
            value: MockRedisValue::String(value.clone()),
        });

        self.set_ret.get(&key).cloned().unwrap_or(Ok(()))
    }

    async fn setex(
        &self,
        key: String,
        value: String,
        seconds: u64,
    ) -> Result<(), CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "setex".to_string(),
            key: key.clone(),
            value: MockRedisValue::StringWithTTL(value.clone(), seconds),
        });

        self.setex_ret.get(&key).cloned().unwrap_or(Ok(()))
    }

    async fn del(&self, key: String) -> Result<bool, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "del".to_string(),
            key: key.clone(),
            value: MockRedisValue::None,
        });

        self.del_ret.get(&key).cloned().unwrap_or(Ok(false))
    }

    async fn del_many(&self, keys: Vec<String>) -> Result<u64, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "del_many".to_string(),
            key: format!("keys={}", keys.len()),
            value: MockRedisValue::VecString(keys.clone()),
        });

        match &self.del_many_ret {
            Some(ret) => ret.clone(),
            None => Ok(keys.len() as u64),
        }
    }

    async fn exists(&self, key: String) -> Result<bool, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "exists".to_string(),
            key: key.clone(),
            value: MockRedisValue::None,
        });

        self.exists_ret.get(&key).cloned().unwrap_or(Ok(false))
    }

    async fn incr(&self, key: String) -> Result<i64, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "incr".to_string(),
            key: key.clone(),
            value: MockRedisValue::I64(1),
        });

        self.incr_ret.get(&key).cloned().unwrap_or(Ok(1))
    }

    async fn decr(&self, key: String) -> Result<i64, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "decr".to_string(),
            key: key.clone(),
            value: MockRedisValue::I64(-1),
        });

        self.decr_ret.get(&key).cloned().unwrap_or(Ok(-1))
    }

    async fn expire(&self, key: String, seconds: i64) -> Result<bool, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "expire".to_string(),
            key: key.clone(),
            value: MockRedisValue::I64(seconds),
        });

        self.expire_ret.get(&key).cloned().unwrap_or(Ok(true))
    }

    async fn sadd(&self, key: String, member: String) -> Result<(), CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "sadd".to_string(),
            key: key.clone(),
            value: MockRedisValue::String(member.clone()),
        });

        self.sadd_ret.get(&key).cloned().unwrap_or(Ok(()))
    }

    async fn smembers(&self, key: String) -> Result<Vec<String>, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "smembers".to_string(),
            key: key.clone(),
            value: MockRedisValue::None,
        });

        self.smembers_ret
            .get(&key)
            .cloned()
            .unwrap_or(Ok(Vec::new()))
    }

    async fn srem(&self, key: String, members: Vec<String>) -> Result<u64, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "srem".to_string(),
            key: key.clone(),
            value: MockRedisValue::VecString(members.clone()),
        });

        self.srem_ret.get(&key).cloned().unwrap_or(Ok(0))
    }

    async fn scard(&self, key: String) -> Result<u64, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "scard".to_string(),
            key: key.clone(),
            value: MockRedisValue::None,
        });

        self.scard_ret.get(&key).cloned().unwrap_or(Ok(0))
    }
}
