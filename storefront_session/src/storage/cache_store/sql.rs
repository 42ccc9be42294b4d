use async_trait::async_trait;
use chrono::Utc;
use std::str::FromStr;

use crate::storage::errors::StorageError;
use crate::storage::types::{CacheData, CachePrefix};

use super::types::{CacheStore, SqlCacheStore, SqlPool};

impl SqlPool {
    /// Lazily connected pool; the scheme of `url` selects the backend.
    pub fn connect_lazy(url: &str) -> Result<Self, StorageError> {
        if url.starts_with("sqlite:") {
            let opts = sqlx::sqlite::SqliteConnectOptions::from_str(url)?.create_if_missing(true);
            Ok(Self::Sqlite(sqlx::SqlitePool::connect_lazy_with(opts)))
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Ok(Self::Postgres(sqlx::PgPool::connect_lazy(url)?))
        } else {
            Err(StorageError::Config(format!(
                "Unsupported database url scheme: {url}"
            )))
        }
    }
}

fn validate_table_name(table: &str) -> Result<(), StorageError> {
    let valid = !table.is_empty()
        && table.len() <= 63
        && table
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StorageError::Config(format!("Invalid table name: {table}")))
    }
}

impl SqlCacheStore {
    pub fn new(
        pool: SqlPool,
        read_pool: Option<SqlPool>,
        table: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self {
            pool,
            read_pool,
            table,
        })
    }

    fn reader(&self) -> &SqlPool {
        self.read_pool.as_ref().unwrap_or(&self.pool)
    }
}

#[async_trait]
impl CacheStore for SqlCacheStore {
    async fn init(&self) -> Result<(), StorageError> {
        let table = self.table.as_str();

        match &self.pool {
            SqlPool::Sqlite(pool) => {
                sqlx::query(&format!(
                    r#"
                    CREATE TABLE IF NOT EXISTS {table} (
                        prefix TEXT NOT NULL,
                        key TEXT NOT NULL,
                        value TEXT NOT NULL,
                        expires_at INTEGER NOT NULL,
                        PRIMARY KEY (prefix, key)
                    )
                    "#
                ))
                .execute(pool)
                .await?;
            }
            SqlPool::Postgres(pool) => {
                sqlx::query(&format!(
                    r#"
                    CREATE TABLE IF NOT EXISTS {table} (
                        prefix TEXT NOT NULL,
                        key TEXT NOT NULL,
                        value TEXT NOT NULL,
                        expires_at BIGINT NOT NULL,
                        PRIMARY KEY (prefix, key)
                    )
                    "#
                ))
                .execute(pool)
                .await?;
            }
        }

        tracing::info!("Session table {} ready", table);
        Ok(())
    }

    async fn put_with_ttl(
        &self,
        prefix: CachePrefix,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError> {
        let table = self.table.as_str();
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(|ttl| Utc::now().timestamp().checked_add(ttl))
            .ok_or_else(|| StorageError::Config(format!("ttl of {ttl} seconds is out of range")))?;

        match &self.pool {
            SqlPool::Sqlite(pool) => {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO {table} (prefix, key, value, expires_at)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT (prefix, key) DO UPDATE SET
                        value = excluded.value,
                        expires_at = excluded.expires_at
                    "#
                ))
                .bind(prefix.as_str())
                .bind(key)
                .bind(&value.value)
                .bind(expires_at)
                .execute(pool)
                .await?;
            }
            SqlPool::Postgres(pool) => {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO {table} (prefix, key, value, expires_at)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (prefix, key) DO UPDATE SET
                        value = EXCLUDED.value,
                        expires_at = EXCLUDED.expires_at
                    "#
                ))
                .bind(prefix.as_str())
                .bind(key)
                .bind(&value.value)
                .bind(expires_at)
                .execute(pool)
                .await?;
            }
        }
        Ok(())
    }

    async fn get(&self, prefix: CachePrefix, key: &str) -> Result<Option<CacheData>, StorageError> {
        let table = self.table.as_str();
        let now = Utc::now().timestamp();

        let value: Option<String> = match self.reader() {
            SqlPool::Sqlite(pool) => {
                sqlx::query_scalar(&format!(
                    "SELECT value FROM {table} WHERE prefix = ? AND key = ? AND expires_at > ?"
                ))
                .bind(prefix.as_str())
                .bind(key)
                .bind(now)
                .fetch_optional(pool)
                .await?
            }
            SqlPool::Postgres(pool) => {
                sqlx::query_scalar(&format!(
                    "SELECT value FROM {table} WHERE prefix = $1 AND key = $2 AND expires_at > $3"
                ))
                .bind(prefix.as_str())
                .bind(key)
                .bind(now)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(value.map(|value| CacheData { value }))
    }

    async fn remove(&self, prefix: CachePrefix, key: &str) -> Result<(), StorageError> {
        let table = self.table.as_str();

        match &self.pool {
            SqlPool::Sqlite(pool) => {
                sqlx::query(&format!(
                    "DELETE FROM {table} WHERE prefix = ? AND key = ?"
                ))
                .bind(prefix.as_str())
                .bind(key)
                .execute(pool)
                .await?;
            }
            SqlPool::Postgres(pool) => {
                sqlx::query(&format!(
                    "DELETE FROM {table} WHERE prefix = $1 AND key = $2"
                ))
                .bind(prefix.as_str())
                .bind(key)
                .execute(pool)
                .await?;
            }
        }
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StorageError> {
        let table = self.table.as_str();
        let now = Utc::now().timestamp();

        let affected = match &self.pool {
            SqlPool::Sqlite(pool) => sqlx::query(&format!(
                "DELETE FROM {table} WHERE expires_at <= ?"
            ))
            .bind(now)
            .execute(pool)
            .await?
            .rows_affected(),
            SqlPool::Postgres(pool) => sqlx::query(&format!(
                "DELETE FROM {table} WHERE expires_at <= $1"
            ))
            .bind(now)
            .execute(pool)
            .await?
            .rows_affected(),
        };

        tracing::debug!("Purged {} expired rows from {}", affected, table);
        Ok(affected)
    }
}
