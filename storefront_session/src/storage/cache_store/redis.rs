use async_trait::async_trait;
use redis::{self, AsyncCommands};

use crate::storage::errors::StorageError;
use crate::storage::types::{CacheData, CachePrefix};

use super::types::{CacheStore, RedisCacheStore};

const CACHE_PREFIX: &str = "cache";

impl RedisCacheStore {
    pub fn open(url: &str, read_url: Option<&str>) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)?;
        let read_client = read_url.map(redis::Client::open).transpose()?;
        Ok(Self {
            client,
            read_client,
        })
    }

    fn make_key(prefix: CachePrefix, key: &str) -> String {
        format!("{CACHE_PREFIX}:{}:{key}", prefix.as_str())
    }

    fn reader(&self) -> &redis::Client {
        self.read_client.as_ref().unwrap_or(&self.client)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn init(&self) -> Result<(), StorageError> {
        // Verify the connections work
        let _conn = self.client.get_multiplexed_async_connection().await?;
        if let Some(read_client) = &self.read_client {
            let _conn = read_client.get_multiplexed_async_connection().await?;
        }
        Ok(())
    }

    async fn put_with_ttl(
        &self,
        prefix: CachePrefix,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = Self::make_key(prefix, key);
        let value = serde_json::to_string(&value)?;
        let _: () = conn.set_ex(&key, value, ttl as u64).await?;
        Ok(())
    }

    async fn get(&self, prefix: CachePrefix, key: &str) -> Result<Option<CacheData>, StorageError> {
        let mut conn = self.reader().get_multiplexed_async_connection().await?;

        let key = Self::make_key(prefix, key);
        let value: Option<String> = conn.get(&key).await?;

        match value {
            Some(v) => Ok(Some(serde_json::from_str(&v)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, prefix: CachePrefix, key: &str) -> Result<(), StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = Self::make_key(prefix, key);
        let _: () = conn.del(&key).await?;
        Ok(())
    }
}
