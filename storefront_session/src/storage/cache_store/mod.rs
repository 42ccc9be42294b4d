mod config;
mod memory;
mod redis;
mod sql;
mod sweeper;
mod types;

pub use config::{SESSION_STORE_PRUNE_INTERVAL, cache_store_from_env};
pub use sweeper::spawn_expiry_sweeper;
pub use types::{CacheStore, InMemoryCacheStore, RedisCacheStore, SqlCacheStore, SqlPool};
