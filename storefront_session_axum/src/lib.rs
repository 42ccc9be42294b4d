//! Axum integration for storefront-session: the CSRF middleware, the
//! `SessionUser` extractor and the login/token endpoints.

mod auth;
mod config;
mod error;
mod handlers;
mod middleware;
mod router;
mod session;
mod state;

#[cfg(test)]
mod test_utils;

pub use auth::{AuthError, Authenticator, Credentials, Identity, Registration};
pub use config::STOREFRONT_LOG_REJECTED_CLIENTS;
pub use error::ApiError;
pub use middleware::csrf_protection;
pub use router::{protected_router, protected_router_no_trace, session_router, session_routes};
pub use session::SessionUser;
pub use state::SessionState;

// Re-export what an application needs to wire the core up
pub use storefront_session::{
    APP_ENV, AppEnv, CacheStore, CsrfConfig, CsrfError, CsrfGate, ExemptionPolicy, ExemptionRule,
    GateOutcome, InitError, SessionConfig, SessionError, SessionManager, init,
};
