//! Shared fixtures for the router and middleware tests

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request, response::Response, routing::post};
use http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use storefront_session::{
    CsrfConfig, CsrfGate, ExemptionPolicy, InMemoryCacheStore, SessionConfig, SessionManager,
};

use crate::auth::{AuthError, Authenticator, Credentials, Identity, Registration};
use crate::router::{protected_router, session_routes};
use crate::state::SessionState;

pub const SECRET: &str = "test-secret-test-secret-test-secret";

/// Accepts `alice` / `wonderland`; registration rejects taken names.
pub struct StaticAuthenticator;

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn login(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        if credentials.username == "alice" && credentials.password == "wonderland" {
            Ok(Identity::new("user-42", vec!["customer".to_string()]))
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn register(&self, registration: &Registration) -> Result<Identity, AuthError> {
        if registration.username == "alice" {
            return Err(AuthError::Conflict("Username already taken".to_string()));
        }
        Ok(Identity::new(
            format!("user-{}", registration.username),
            vec!["customer".to_string()],
        ))
    }

    async fn profile(&self, user_id: &str) -> Result<Value, AuthError> {
        Ok(json!({ "displayName": format!("Display {user_id}") }))
    }
}

pub fn test_gate() -> CsrfGate {
    let sessions = SessionManager::new(
        Arc::new(InMemoryCacheStore::new()),
        SessionConfig::default(),
    );
    CsrfGate::new(
        CsrfConfig::new(SECRET).unwrap(),
        sessions,
        ExemptionPolicy::storefront_default(),
    )
}

pub fn test_state() -> SessionState {
    SessionState::new(test_gate(), Arc::new(StaticAuthenticator))
}

/// Session routes plus a protected cart route and an exempt webhook.
pub fn test_app(state: SessionState) -> Router {
    let routes = session_routes()
        .route("/api/cart/items", post(|| async { "added" }))
        .route("/api/webhooks/payment", post(|| async { "received" }));
    protected_router(routes, state)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone()
        .oneshot(request)
        .await
        .expect("service call succeeds")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Value of the named cookie among the response's `Set-Cookie` headers.
pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|cookie| {
        let (pair, _) = cookie.split_once(';')?;
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

pub fn json_post(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_with(path: &str, session_id: Option<&str>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(path);
    if let Some(sid) = session_id {
        builder = builder.header(COOKIE, format!("sessionId={sid}"));
    }
    if let Some(token) = token {
        builder = builder.header("x-csrf-token", token);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn get_with(path: &str, session_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(sid) = session_id {
        builder = builder.header(COOKIE, format!("sessionId={sid}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Log alice in; returns (session id, csrf token).
pub async fn login(app: &Router) -> (String, String) {
    let response = send(
        app,
        json_post(
            "/api/auth/login",
            json!({"username": "alice", "password": "wonderland"}),
        ),
    )
    .await;
    assert_eq!(response.status(), http::StatusCode::OK);

    let sid = cookie_value(&response, "sessionId").expect("session cookie");
    let body = body_json(response).await;
    let token = body["csrfToken"].as_str().expect("csrf token").to_string();
    (sid, token)
}
