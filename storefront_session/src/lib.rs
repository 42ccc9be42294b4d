//! storefront-session - durable session establishment and CSRF synchronization
//!
//! A login turns into a freshly identified session record that is confirmed
//! readable from the store before the caller proceeds, and every
//! state-changing request is checked against a token derived from that
//! confirmed session.

mod config;
mod csrf;
mod session;
mod storage;
mod utils;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;
use thiserror::Error;

pub use config::{APP_ENV, AppEnv, CookieSecurity};

pub use csrf::{
    CSRF_COOKIE_NAME, CSRF_HEADER_NAME, CsrfConfig, CsrfError, CsrfGate, ExemptionPolicy,
    ExemptionRule, GateOutcome, IssuedToken, MIN_SECRET_LEN, derive_token, verify_token,
};

pub use session::{
    DurabilityPolicy, MAX_SESSION_MAX_AGE, RetryOutcome, SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME, SessionConfig,
    SessionError, SessionHandle, SessionManager, Sleeper, StoredSession, TokioSleeper,
    retry_until_found,
};

pub use storage::{
    CacheData, CachePrefix, CacheStore, InMemoryCacheStore, RedisCacheStore,
    SESSION_STORE_PRUNE_INTERVAL, SqlCacheStore, SqlPool, StorageError, cache_store_from_env,
    spawn_expiry_sweeper,
};

pub use utils::{UtilError, gen_random_string};

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Store initialization failed: {0}")]
    Storage(#[from] StorageError),

    #[error("CSRF configuration failed: {0}")]
    Csrf(#[from] CsrfError),
}

/// Build the store, session manager and CSRF gate from the environment, and
/// start the expired-entry sweep unless `SESSION_STORE_PRUNE_INTERVAL=0`.
///
/// The returned gate owns the session manager; reach it through
/// [`CsrfGate::sessions`].
pub async fn init(exemptions: ExemptionPolicy) -> Result<CsrfGate, InitError> {
    let store: Arc<dyn CacheStore> = cache_store_from_env().await?;
    if let Some(every) = *SESSION_STORE_PRUNE_INTERVAL {
        spawn_expiry_sweeper(&store, every);
    }
    let sessions = SessionManager::new(store, SessionConfig::from_env());
    let csrf_config = CsrfConfig::from_env()?;

    tracing::info!(
        "Session layer ready: {:?}, {:?}",
        sessions.config(),
        csrf_config
    );
    Ok(CsrfGate::new(csrf_config, sessions, exemptions))
}
