use serde::{Deserialize, Serialize};

/// Data stored in the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheData {
    pub value: String,
}

/// Namespace for cache keys, so unrelated records never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CachePrefix(&'static str);

impl CachePrefix {
    pub const fn session() -> Self {
        Self("session")
    }

    pub const fn new(prefix: &'static str) -> Self {
        Self(prefix)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}
