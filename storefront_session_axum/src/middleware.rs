use axum::{
    extract::{ConnectInfo, OriginalUri, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use storefront_session::CsrfError;

use super::config::STOREFRONT_LOG_REJECTED_CLIENTS;
use super::error::ApiError;
use super::state::SessionState;

/// Run the CSRF gate in front of every route of the router it is layered on.
///
/// Allowed requests carry the [`GateOutcome`](storefront_session::GateOutcome)
/// in their extensions. Rejections become a 403 with a fresh token, or a 401
/// that clears the session cookies.
pub async fn csrf_protection(
    State(state): State<SessionState>,
    mut req: Request,
    next: Next,
) -> Response {
    // Nested routers see a stripped path; the gate matches on the full one
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    match state.gate.check(req.method(), &path, req.headers()).await {
        Ok(outcome) => {
            tracing::trace!("CSRF gate passed: {:?}", outcome);
            req.extensions_mut().insert(outcome);
            next.run(req).await
        }
        Err(err) => {
            log_rejection(&err, &req, &path);
            ApiError::from_csrf(err, &state.gate).into_response()
        }
    }
}

fn log_rejection(err: &CsrfError, req: &Request, path: &str) {
    let client = if *STOREFRONT_LOG_REJECTED_CLIENTS {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
    } else {
        None
    };

    match err {
        CsrfError::Mismatch { .. } | CsrfError::SessionExpired => tracing::warn!(
            "Rejected {} {} from {}: {}",
            req.method(),
            path,
            client.as_deref().unwrap_or("unknown"),
            err
        ),
        _ => tracing::error!("CSRF gate failed for {} {}: {}", req.method(), path, err),
    }
}
