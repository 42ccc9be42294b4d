mod cache_store;
mod errors;
mod types;

pub use cache_store::{
    CacheStore, InMemoryCacheStore, RedisCacheStore, SESSION_STORE_PRUNE_INTERVAL, SqlCacheStore,
    SqlPool, cache_store_from_env, spawn_expiry_sweeper,
};
pub use errors::StorageError;
pub use types::{CacheData, CachePrefix};
