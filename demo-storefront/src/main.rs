use std::sync::Arc;

use storefront_session_axum::{ExemptionPolicy, SessionState, protected_router, session_routes};

mod cart;
mod server;
mod users;

use crate::{
    cart::Carts,
    server::{Ports, init_tracing, spawn_http_server, spawn_https_server, tls_paths},
    users::UserDirectory,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install default CryptoProvider for rustls to prevent:
    // "no process-level CryptoProvider available -- call CryptoProvider::install_default() before this point"
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install default CryptoProvider")?;

    dotenvy::dotenv().ok();
    init_tracing("demo_storefront");

    let gate = storefront_session_axum::init(ExemptionPolicy::storefront_default()).await?;
    let users = UserDirectory::with_demo_user().await?;
    let state = SessionState::new(gate, Arc::new(users));

    let routes = session_routes().merge(cart::router(Arc::new(Carts::default())));
    let app = protected_router(routes, state);

    let ports = Ports::from_env();
    let http_server = spawn_http_server(ports.http, app.clone());

    match tls_paths() {
        Some(paths) => {
            let https_server = spawn_https_server(ports.https, app, paths).await?;
            tokio::try_join!(http_server, https_server)?;
        }
        None => {
            tracing::info!("TLS_CERT_PATH/TLS_KEY_PATH not set, serving HTTP only");
            http_server.await?;
        }
    }
    Ok(())
}
