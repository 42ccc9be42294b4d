use chrono::Utc;
use http::header::HeaderMap;
use std::sync::Arc;

use crate::session::config::SessionConfig;
use crate::session::errors::SessionError;
use crate::session::types::{SessionHandle, StoredSession};
use crate::storage::{CacheData, CachePrefix, CacheStore};
use crate::utils::gen_random_string;

use super::cookie::{append_clear_session_cookie, session_cookie_headers, session_id_from_headers};
use super::retry::{RetryOutcome, Sleeper, TokioSleeper, retry_until_found};

const SESSION_ID_BYTES: usize = 32;

/// Establishes, reads and tears down sessions in the durable store.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CacheStore>,
    config: SessionConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn CacheStore>, config: SessionConfig) -> Self {
        Self::with_sleeper(store, config, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        store: Arc<dyn CacheStore>,
        config: SessionConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            store,
            config,
            sleeper,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Drop the record behind `current_session_id` (if any) and allocate a
    /// fresh identifier. Nothing is written for the new id yet.
    #[tracing::instrument(skip(self, current_session_id))]
    pub async fn regenerate(
        &self,
        current_session_id: Option<&str>,
    ) -> Result<SessionHandle, SessionError> {
        if let Some(old_id) = current_session_id {
            self.store.remove(CachePrefix::session(), old_id).await?;
            tracing::debug!("Removed previous session record");
        }

        let session_id = gen_random_string(SESSION_ID_BYTES)?;
        Ok(SessionHandle::new(
            session_id,
            current_session_id.map(str::to_string),
        ))
    }

    /// Write the handle's fields with the configured ttl. Returns once the
    /// store has acknowledged the write, which does not imply readers see it.
    #[tracing::instrument(skip_all)]
    pub async fn persist(&self, handle: &mut SessionHandle) -> Result<(), SessionError> {
        let now = Utc::now();
        let record = handle.to_record(now, self.config.max_age)?;
        let data = CacheData::try_from(&record)?;
        let ttl = usize::try_from(record.ttl).map_err(|_| SessionError::InvalidTtl(record.ttl))?;

        self.store
            .put_with_ttl(CachePrefix::session(), handle.id(), data, ttl)
            .await
            .inspect_err(|e| tracing::error!("Failed to persist session: {}", e))?;

        handle.mark_persisted(now);
        Ok(())
    }

    /// Poll the store until the record is readable or the durability policy
    /// runs out of attempts.
    #[tracing::instrument(skip_all)]
    pub async fn confirm_durable(&self, session_id: &str) -> Result<StoredSession, SessionError> {
        let policy = &self.config.durability;
        let outcome = retry_until_found(policy, self.sleeper.as_ref(), |_| self.load(session_id)).await;

        match outcome {
            RetryOutcome::Found { value, attempts } => {
                tracing::debug!("Session confirmed durable after {} attempt(s)", attempts);
                Ok(value)
            }
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                if let Some(e) = last_error {
                    tracing::error!("Last durability probe error: {}", e);
                }
                tracing::warn!("Session never became visible in the store");
                Err(SessionError::NotDurable {
                    session_id: session_id.to_string(),
                    attempts,
                })
            }
        }
    }

    /// Regenerate, attach the identity, persist and confirm. The handle is
    /// only returned once the record is readable from the store.
    #[tracing::instrument(skip(self, current_session_id, roles))]
    pub async fn initialize<I, S>(
        &self,
        current_session_id: Option<&str>,
        user_id: &str,
        roles: I,
    ) -> Result<SessionHandle, SessionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut handle = self.regenerate(current_session_id).await?;
        handle.attach_identity(user_id, roles);
        self.persist(&mut handle).await?;
        self.confirm_durable(handle.id()).await?;

        tracing::info!("Session initialized for user {}", user_id);
        Ok(handle)
    }

    /// Single read. Records past their expiry are reported as absent.
    pub async fn load(&self, session_id: &str) -> Result<Option<StoredSession>, SessionError> {
        let Some(data) = self.store.get(CachePrefix::session(), session_id).await? else {
            return Ok(None);
        };

        let record = StoredSession::try_from(data)?;
        if record.is_expired() {
            tracing::debug!("Session record is past its expiry");
            return Ok(None);
        }
        Ok(Some(record))
    }

    pub async fn destroy(&self, session_id: &str) -> Result<(), SessionError> {
        self.store.remove(CachePrefix::session(), session_id).await?;
        tracing::debug!("Session destroyed");
        Ok(())
    }

    pub fn session_id_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        session_id_from_headers(&self.config, headers)
    }

    pub fn session_cookie_headers(&self, handle: &SessionHandle) -> Result<HeaderMap, SessionError> {
        session_cookie_headers(&self.config, handle.id())
    }

    /// Append a `Set-Cookie` that expires the session cookie.
    pub fn append_clear_cookies(&self, headers: &mut HeaderMap) -> Result<(), SessionError> {
        append_clear_session_cookie(&self.config, headers)
    }

    /// Headers that expire the session cookie.
    pub fn clear_cookie_headers(&self) -> Result<HeaderMap, SessionError> {
        let mut headers = HeaderMap::new();
        self.append_clear_cookies(&mut headers)?;
        Ok(headers)
    }
}
