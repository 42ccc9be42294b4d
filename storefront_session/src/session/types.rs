use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::session::errors::SessionError;
use crate::storage::CacheData;

/// The durable session record, keyed by session id in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user_id: Option<String>,
    pub roles: BTreeSet<String>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ttl: u64,
}

impl StoredSession {
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

impl TryFrom<&StoredSession> for CacheData {
    type Error = SessionError;

    fn try_from(data: &StoredSession) -> Result<Self, Self::Error> {
        Ok(Self {
            value: serde_json::to_string(data).map_err(|e| SessionError::Corrupt(e.to_string()))?,
        })
    }
}

impl TryFrom<CacheData> for StoredSession {
    type Error = SessionError;

    fn try_from(data: CacheData) -> Result<Self, Self::Error> {
        serde_json::from_str(&data.value).map_err(|e| SessionError::Corrupt(e.to_string()))
    }
}

/// Request-scoped view of a session. The store holds the truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    id: String,
    previous_id: Option<String>,
    user_id: Option<String>,
    roles: BTreeSet<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl SessionHandle {
    pub(crate) fn new(id: String, previous_id: Option<String>) -> Self {
        Self {
            id,
            previous_id,
            user_id: None,
            roles: BTreeSet::new(),
            updated_at: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The identifier this handle replaced, if the request carried one.
    pub fn previous_id(&self) -> Option<&str> {
        self.previous_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Time of the last successful persist, `None` until then.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Attach the authenticated identity. In-memory only.
    pub fn attach_identity<I, S>(&mut self, user_id: &str, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_id = Some(user_id.to_string());
        self.roles = roles.into_iter().map(Into::into).collect();
    }

    pub(crate) fn to_record(
        &self,
        now: DateTime<Utc>,
        ttl: u64,
    ) -> Result<StoredSession, SessionError> {
        let expires_at = i64::try_from(ttl)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(SessionError::InvalidTtl(ttl))?;

        Ok(StoredSession {
            user_id: self.user_id.clone(),
            roles: self.roles.clone(),
            updated_at: now,
            expires_at,
            ttl,
        })
    }

    pub(crate) fn mark_persisted(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}
