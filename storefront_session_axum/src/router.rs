//! Session routes and the CSRF-protected application router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::config::{
    CSRF_TOKEN_INIT_PATH, CSRF_TOKEN_PATH, LOGIN_PATH, LOGOUT_PATH, ME_PATH, REGISTER_PATH,
};
use super::handlers::{csrf_token, login, logout, me, register};
use super::middleware::csrf_protection;
use super::state::SessionState;

/// Token, login, register, logout and `me` endpoints, without state or the gate.
///
/// Merge application routes into this before handing it to
/// [`protected_router`] so that everything shares one CSRF layer.
pub fn session_routes() -> Router<SessionState> {
    Router::new()
        .route(CSRF_TOKEN_PATH, get(csrf_token))
        .route(CSRF_TOKEN_INIT_PATH, get(csrf_token))
        .route(LOGIN_PATH, post(login))
        .route(REGISTER_PATH, post(register))
        .route(LOGOUT_PATH, post(logout))
        .route(ME_PATH, get(me))
}

/// Put `routes` behind the CSRF gate and HTTP tracing.
pub fn protected_router(routes: Router<SessionState>, state: SessionState) -> Router {
    protected_router_no_trace(routes, state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as [`protected_router`] without the tracing layer.
pub fn protected_router_no_trace(routes: Router<SessionState>, state: SessionState) -> Router {
    routes
        .layer(middleware::from_fn_with_state(state.clone(), csrf_protection))
        .with_state(state)
}

/// The session endpoints alone, gated and traced.
pub fn session_router(state: SessionState) -> Router {
    protected_router(session_routes(), state)
}
