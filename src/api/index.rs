use std::sync::Arc;

use axum::{
    Extension,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;

use crate::spotify::Authorizer;

/// Sends the browser to Spotify's authorization page.
pub async fn index(Extension(authorizer): Extension<Arc<Authorizer>>) -> Response {
    match authorizer.authorize_url().await {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => {
            error!("Failed to build authorization URL: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Spotify authentication failed.",
            )
                .into_response()
        }
    }
}
