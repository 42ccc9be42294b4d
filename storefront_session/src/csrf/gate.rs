use http::{HeaderMap, Method};
use std::sync::Arc;

use crate::session::{SessionManager, StoredSession};
use crate::utils::{header_clear_cookie, header_set_cookie};

use super::config::CsrfConfig;
use super::errors::CsrfError;
use super::exemption::ExemptionPolicy;
use super::token::{derive_token, is_temporary_id, temporary_session_id, verify_token};

/// Why a request was let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Matched the named exemption rule; no token was looked at.
    Exempt { rule: String },
    /// Safe method, never compared.
    Ignored,
    /// The presented token matched the session.
    Allowed { session_id: String },
}

/// A token handed out by the token endpoint, with the `Set-Cookie` that
/// mirrors it for the front-end.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// False when the caller had no established session and the token is
    /// bound to a temporary identifier.
    pub established: bool,
    pub headers: HeaderMap,
}

enum ResolvedSession {
    Established { id: String, record: StoredSession },
    Temporary { id: String },
}

impl ResolvedSession {
    fn id(&self) -> &str {
        match self {
            Self::Established { id, .. } | Self::Temporary { id } => id,
        }
    }

    fn has_user(&self) -> bool {
        matches!(self, Self::Established { record, .. } if record.is_authenticated())
    }
}

/// Per-request CSRF check bound to the durable session store.
#[derive(Debug, Clone)]
pub struct CsrfGate {
    config: Arc<CsrfConfig>,
    sessions: SessionManager,
    exemptions: Arc<ExemptionPolicy>,
}

impl CsrfGate {
    pub fn new(config: CsrfConfig, sessions: SessionManager, exemptions: ExemptionPolicy) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            exemptions: Arc::new(exemptions),
        }
    }

    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn exemptions(&self) -> &ExemptionPolicy {
        &self.exemptions
    }

    /// Decide whether a request may proceed.
    ///
    /// A rejected request with an identified session yields
    /// [`CsrfError::Mismatch`] carrying a fresh token; without one it yields
    /// [`CsrfError::SessionExpired`].
    pub async fn check(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<GateOutcome, CsrfError> {
        if let Some(rule) = self.exemptions.matching(method, path) {
            tracing::trace!("CSRF check skipped for {} {} (rule {})", method, path, rule);
            return Ok(GateOutcome::Exempt {
                rule: rule.to_string(),
            });
        }

        if is_ignored_method(method) {
            return Ok(GateOutcome::Ignored);
        }

        let session = self.resolve(headers).await?;

        let presented = headers
            .get(self.config.header_name.as_str())
            .and_then(|v| v.to_str().ok());

        if let Some(presented) = presented {
            if verify_token(self.config.secret(), session.id(), presented)? {
                return Ok(GateOutcome::Allowed {
                    session_id: session.id().to_string(),
                });
            }
        }

        tracing::warn!(
            "CSRF validation failed: method={} path={} header_present={} has_user={}",
            method,
            path,
            presented.is_some(),
            session.has_user()
        );

        if session.has_user() {
            let fresh_token = derive_token(self.config.secret(), session.id())?;
            Err(CsrfError::Mismatch { fresh_token })
        } else {
            Err(CsrfError::SessionExpired)
        }
    }

    /// Token for the caller's established session, or for a one-off temporary
    /// identifier when there is none.
    pub async fn issue_token(&self, headers: &HeaderMap) -> Result<IssuedToken, CsrfError> {
        let session = self.resolve(headers).await?;
        let established = matches!(session, ResolvedSession::Established { .. });
        let token = derive_token(self.config.secret(), session.id())?;

        Ok(IssuedToken {
            headers: self.token_cookie_headers(&token)?,
            token,
            established,
        })
    }

    /// Token for a session the caller has just confirmed durable.
    pub fn token_for(&self, session_id: &str) -> Result<String, CsrfError> {
        derive_token(self.config.secret(), session_id)
    }

    /// Script-readable cookie mirroring the token.
    pub fn token_cookie_headers(&self, token: &str) -> Result<HeaderMap, CsrfError> {
        let mut headers = HeaderMap::new();
        header_set_cookie(
            &mut headers,
            &self.config.cookie_name,
            token,
            self.config.cookie_max_age(),
            false,
            self.config.cookie_security,
        )?;
        Ok(headers)
    }

    /// Expire both the session cookie and the CSRF cookie.
    pub fn expiry_cookie_headers(&self) -> Result<HeaderMap, CsrfError> {
        let mut headers = HeaderMap::new();
        self.sessions.append_clear_cookies(&mut headers)?;
        header_clear_cookie(
            &mut headers,
            &self.config.cookie_name,
            self.config.cookie_security,
        )?;
        Ok(headers)
    }

    async fn resolve(&self, headers: &HeaderMap) -> Result<ResolvedSession, CsrfError> {
        if let Some(id) = self
            .sessions
            .session_id_from_headers(headers)
            .filter(|id| !is_temporary_id(id))
        {
            if let Some(record) = self.sessions.load(&id).await? {
                return Ok(ResolvedSession::Established { id, record });
            }
            tracing::debug!("Session cookie present but no record in the store");
        }

        Ok(ResolvedSession::Temporary {
            id: temporary_session_id()?,
        })
    }
}

fn is_ignored_method(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD || method == Method::OPTIONS
}
