use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::storage::errors::StorageError;
use crate::storage::types::{CacheData, CachePrefix};

use super::types::{CacheStore, InMemoryCacheStore, MemoryEntry};

const CACHE_PREFIX: &str = "cache";

impl InMemoryCacheStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory generic cache store");
        Self {
            entry: Mutex::new(HashMap::new()),
        }
    }

    fn make_key(prefix: CachePrefix, key: &str) -> String {
        format!("{CACHE_PREFIX}:{}:{key}", prefix.as_str())
    }
}

fn evict_expired(entries: &mut HashMap<String, MemoryEntry>, now: DateTime<Utc>) -> u64 {
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    (before - entries.len()) as u64
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(()) // Nothing to initialize for in-memory store
    }

    async fn put_with_ttl(
        &self,
        prefix: CachePrefix,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError> {
        let key = Self::make_key(prefix, key);
        let now = Utc::now();
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| StorageError::Config(format!("ttl of {ttl} seconds is out of range")))?;

        let mut entries = self.entry.lock().await;
        // Abandoned keys are never read again, so writes sweep them
        let evicted = evict_expired(&mut entries, now);
        if evicted > 0 {
            tracing::trace!("Evicted {} expired cache entries", evicted);
        }
        entries.insert(
            key,
            MemoryEntry {
                data: value,
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, prefix: CachePrefix, key: &str) -> Result<Option<CacheData>, StorageError> {
        let key = Self::make_key(prefix, key);
        let mut entries = self.entry.lock().await;

        match entries.get(&key) {
            Some(entry) if entry.expires_at <= Utc::now() => {
                tracing::debug!("Dropping expired cache entry {}", key);
                entries.remove(&key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.data.clone())),
            None => Ok(None),
        }
    }

    async fn remove(&self, prefix: CachePrefix, key: &str) -> Result<(), StorageError> {
        let key = Self::make_key(prefix, key);
        self.entry.lock().await.remove(&key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StorageError> {
        let mut entries = self.entry.lock().await;
        Ok(evict_expired(&mut entries, Utc::now()))
    }
}
