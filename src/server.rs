use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tracing::info;

use crate::{api, spotify::Authorizer};

/// Builds the router of the authorization server.
pub fn router(authorizer: Arc<Authorizer>) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/callback", get(api::callback))
        .route("/health", get(api::health))
        .layer(Extension(authorizer))
}

/// Serves the authorization endpoints on the configured address.
///
/// Shuts down gracefully as soon as a credential is published: the request
/// that completed the authorization is still answered, new connections are
/// refused.
///
/// # Errors
///
/// Returns the I/O error when the address cannot be bound or the listener
/// fails.
pub async fn start_api_server(authorizer: Arc<Authorizer>) -> std::io::Result<()> {
    let addr = authorizer.config().server_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Authorization server listening on http://{}", addr);

    let mut credential = authorizer.subscribe();
    axum::serve(listener, router(authorizer))
        .with_graceful_shutdown(async move {
            let _ = credential.wait_for(Option::is_some).await;
            info!("Authorization complete, stopping authorization server.");
        })
        .await
}
