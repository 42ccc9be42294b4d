use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::storage::errors::StorageError;
use crate::storage::types::{CacheData, CachePrefix};

pub(super) struct MemoryEntry {
    pub(super) data: CacheData,
    pub(super) expires_at: DateTime<Utc>,
}

/// Process-local store. Writes are visible to the next read immediately.
pub struct InMemoryCacheStore {
    pub(super) entry: Mutex<HashMap<String, MemoryEntry>>,
}

/// Redis-backed store. Reads go to `read_client` when one is configured
/// (typically a replica), so a read right after a write may miss.
pub struct RedisCacheStore {
    pub(super) client: redis::Client,
    pub(super) read_client: Option<redis::Client>,
}

#[derive(Clone, Debug)]
pub enum SqlPool {
    Sqlite(sqlx::SqlitePool),
    Postgres(sqlx::PgPool),
}

/// SQL-backed store, one row per (prefix, key) with an absolute expiry.
pub struct SqlCacheStore {
    pub(super) pool: SqlPool,
    pub(super) read_pool: Option<SqlPool>,
    pub(super) table: String,
}

/// The durable store behind sessions.
///
/// `put_with_ttl` is the write operation and `get` the read operation the
/// session lifecycle relies on. Implementations may lag between the two.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// Initialize the store. This is called when the store is created.
    async fn init(&self) -> Result<(), StorageError>;

    /// Put a value into the store, expiring after `ttl` seconds.
    async fn put_with_ttl(
        &self,
        prefix: CachePrefix,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError>;

    /// Get a value from the store. Expired values are reported as absent.
    async fn get(&self, prefix: CachePrefix, key: &str) -> Result<Option<CacheData>, StorageError>;

    /// Remove a value from the store. Removing a missing key is not an error.
    async fn remove(&self, prefix: CachePrefix, key: &str) -> Result<(), StorageError>;

    /// Delete every expired entry and return how many were removed. Stores
    /// that expire keys themselves keep the default.
    async fn purge_expired(&self) -> Result<u64, StorageError> {
        Ok(0)
    }
}
