//! A state-changing route behind the CSRF gate

use axum::{
    Extension, Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use storefront_session_axum::{SessionState, SessionUser};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartItem {
    pub(crate) product_id: String,
    pub(crate) quantity: u32,
}

/// Carts keyed by user id.
#[derive(Default)]
pub(crate) struct Carts {
    items: Mutex<HashMap<String, Vec<CartItem>>>,
}

impl Carts {
    async fn add(&self, user_id: &str, item: CartItem) -> Vec<CartItem> {
        let mut carts = self.items.lock().await;
        let cart = carts.entry(user_id.to_string()).or_default();
        match cart.iter_mut().find(|i| i.product_id == item.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => cart.push(item),
        }
        cart.clone()
    }

    async fn list(&self, user_id: &str) -> Vec<CartItem> {
        self.items
            .lock()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }
}

pub(crate) fn router(carts: Arc<Carts>) -> Router<SessionState> {
    Router::new()
        .route("/api/cart", get(list_items))
        .route("/api/cart/items", post(add_item))
        .layer(Extension(carts))
}

async fn list_items(
    user: SessionUser,
    Extension(carts): Extension<Arc<Carts>>,
) -> Json<Vec<CartItem>> {
    Json(carts.list(&user.user_id).await)
}

async fn add_item(
    user: SessionUser,
    Extension(carts): Extension<Arc<Carts>>,
    Json(item): Json<CartItem>,
) -> Result<(StatusCode, Json<Vec<CartItem>>), (StatusCode, String)> {
    if item.quantity == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Quantity must be positive".to_string(),
        ));
    }
    tracing::debug!("User {} adds {:?}", user.user_id, item);
    Ok((StatusCode::CREATED, Json(carts.add(&user.user_id, item).await)))
}
