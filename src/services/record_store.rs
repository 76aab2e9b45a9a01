// src/services/record_store.rs
use crate::errors::ResizerError;
use crate::models::{CacheRecord, NormalizedLookup, ValidatedLookup};
use async_trait::async_trait;
use log::warn;
use redis::{AsyncCommands, Client};

/// Exact-match storage of finished resizes.
///
/// Records are append-only. Duplicate equivalent records are allowed; any
/// match is a valid answer.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_validated(&self, lookup: &ValidatedLookup) -> Result<Option<CacheRecord>, ResizerError>;
    async fn find_normalized(&self, lookup: &NormalizedLookup) -> Result<Option<CacheRecord>, ResizerError>;
    async fn insert(&self, record: &CacheRecord) -> Result<(), ResizerError>;
}

pub struct RedisRecordStore {
    client: Client,
}

impl RedisRecordStore {
    pub async fn new(redis_url: &str) -> Result<Self, ResizerError> {
        let client = Client::open(redis_url).map_err(|e| ResizerError::Redis(e.to_string()))?;

        // Test connection
        let mut conn = client
            .get_async_connection()
            .await
            .map_err(|e| ResizerError::Redis(e.to_string()))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| ResizerError::Redis(e.to_string()))?;

        Ok(Self { client })
    }

    fn validated_key(fingerprint: &str) -> String {
        format!("resizer:validated:{}", fingerprint)
    }

    fn normalized_key(fingerprint: &str) -> String {
        format!("resizer:normalized:{}", fingerprint)
    }

    async fn scan<F>(&self, key: &str, matches: F) -> Result<Option<CacheRecord>, ResizerError>
    where
        F: Fn(&CacheRecord) -> bool + Send,
    {
        let mut conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| ResizerError::Redis(e.to_string()))?;

        let values: Vec<String> = conn
            .lrange(key, 0, -1)
            .await
            .map_err(|e| ResizerError::Redis(e.to_string()))?;

        Ok(first_match(key, &values, matches))
    }
}

/// First stored record under `key` accepted by `matches`.
///
/// Entries that no longer decode are skipped, so they read as a miss.
fn first_match<F>(key: &str, values: &[String], matches: F) -> Option<CacheRecord>
where
    F: Fn(&CacheRecord) -> bool,
{
    values.iter().find_map(|value| match serde_json::from_str::<CacheRecord>(value) {
        Ok(record) => matches(&record).then_some(record),
        Err(e) => {
            warn!("skipping undecodable record under {}: {}", key, e);
            None
        }
    })
}

#[async_trait]
impl RecordStore for RedisRecordStore {
    async fn find_validated(&self, lookup: &ValidatedLookup) -> Result<Option<CacheRecord>, ResizerError> {
        self.scan(&Self::validated_key(&lookup.fingerprint), |r| lookup.matches(r))
            .await
    }

    async fn find_normalized(&self, lookup: &NormalizedLookup) -> Result<Option<CacheRecord>, ResizerError> {
        self.scan(&Self::normalized_key(&lookup.fingerprint), |r| lookup.matches(r))
            .await
    }

    async fn insert(&self, record: &CacheRecord) -> Result<(), ResizerError> {
        let mut conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| ResizerError::Redis(e.to_string()))?;

        let value =
            serde_json::to_string(record).map_err(|e| ResizerError::Serialization(e.to_string()))?;

        // Both tiers become visible together.
        redis::pipe()
            .atomic()
            .rpush(Self::validated_key(&record.validated_fingerprint), &value)
            .ignore()
            .rpush(Self::normalized_key(&record.normalized_fingerprint), &value)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| ResizerError::Redis(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryRecordStore {
        records: Mutex<Vec<CacheRecord>>,
        fail_inserts: bool,
    }

    impl MemoryRecordStore {
        pub fn failing() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                fail_inserts: true,
            }
        }

        pub fn records(&self) -> Vec<CacheRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordStore for MemoryRecordStore {
        async fn find_validated(&self, lookup: &ValidatedLookup) -> Result<Option<CacheRecord>, ResizerError> {
            Ok(self.records.lock().unwrap().iter().find(|r| lookup.matches(r)).cloned())
        }

        async fn find_normalized(&self, lookup: &NormalizedLookup) -> Result<Option<CacheRecord>, ResizerError> {
            Ok(self.records.lock().unwrap().iter().find(|r| lookup.matches(r)).cloned())
        }

        async fn insert(&self, record: &CacheRecord) -> Result<(), ResizerError> {
            if self.fail_inserts {
                return Err(ResizerError::Redis("insert refused".to_string()));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }
}
