use std::{env, sync::Arc, sync::LazyLock, time::Duration};

use crate::storage::errors::StorageError;

use super::types::{CacheStore, InMemoryCacheStore, RedisCacheStore, SqlCacheStore, SqlPool};

pub static SESSION_STORE_TYPE: LazyLock<String> =
    LazyLock::new(|| env::var("SESSION_STORE_TYPE").unwrap_or_else(|_| "memory".to_string()));

pub static SESSION_STORE_URL: LazyLock<Option<String>> =
    LazyLock::new(|| env::var("SESSION_STORE_URL").ok());

/// Optional replica used for reads.
pub static SESSION_STORE_READ_URL: LazyLock<Option<String>> =
    LazyLock::new(|| env::var("SESSION_STORE_READ_URL").ok());

pub static SESSION_STORE_TABLE: LazyLock<String> =
    LazyLock::new(|| env::var("SESSION_STORE_TABLE").unwrap_or_else(|_| "sessions".to_string()));

/// How often expired entries are purged. `0` disables the background sweep.
pub static SESSION_STORE_PRUNE_INTERVAL: LazyLock<Option<Duration>> = LazyLock::new(|| {
    parse_prune_interval(env::var("SESSION_STORE_PRUNE_INTERVAL").ok().as_deref())
});

fn parse_prune_interval(value: Option<&str>) -> Option<Duration> {
    // Default to 15 minutes if not set or invalid
    let secs = value.and_then(|s| s.parse().ok()).unwrap_or(15 * 60);
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Build and initialize the session store selected by the environment.
pub async fn cache_store_from_env() -> Result<Arc<dyn CacheStore>, StorageError> {
    build_cache_store(
        SESSION_STORE_TYPE.as_str(),
        SESSION_STORE_URL.as_deref(),
        SESSION_STORE_READ_URL.as_deref(),
        SESSION_STORE_TABLE.as_str(),
    )
    .await
}

async fn build_cache_store(
    store_type: &str,
    url: Option<&str>,
    read_url: Option<&str>,
    table: &str,
) -> Result<Arc<dyn CacheStore>, StorageError> {
    tracing::info!(
        "Initializing session store with type: {}, url: {:?}, read url: {:?}",
        store_type,
        url,
        read_url
    );

    let require_url = || {
        url.ok_or_else(|| {
            StorageError::Config(format!(
                "SESSION_STORE_URL must be set for store type '{store_type}'"
            ))
        })
    };

    let store: Arc<dyn CacheStore> = match store_type {
        "memory" => Arc::new(InMemoryCacheStore::new()),
        "redis" => Arc::new(RedisCacheStore::open(require_url()?, read_url)?),
        "sqlite" | "postgres" => {
            let pool = SqlPool::connect_lazy(require_url()?)?;
            let read_pool = read_url.map(SqlPool::connect_lazy).transpose()?;
            Arc::new(SqlCacheStore::new(pool, read_pool, table)?)
        }
        t => {
            return Err(StorageError::Config(format!(
                "Unsupported store type: {t}. Supported types are 'memory', 'redis', 'sqlite' and 'postgres'"
            )));
        }
    };

    store.init().await.inspect_err(|e| {
        tracing::error!("Failed to initialize session store: {}", e);
    })?;

    tracing::info!("Connected to session store: type={}", store_type);
    Ok(store)
}
