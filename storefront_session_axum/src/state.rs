use std::sync::Arc;

use storefront_session::{CsrfGate, SessionManager};

use super::auth::Authenticator;

/// Shared state for the session routes and the CSRF middleware.
#[derive(Clone)]
pub struct SessionState {
    pub gate: CsrfGate,
    pub authenticator: Arc<dyn Authenticator>,
}

impl SessionState {
    pub fn new(gate: CsrfGate, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            gate,
            authenticator,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        self.gate.sessions()
    }
}
