use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, http::StatusCode};
use tracing::warn;

use crate::spotify::Authorizer;

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(authorizer): Extension<Arc<Authorizer>>,
) -> (StatusCode, &'static str) {
    if let Some(error) = params.get("error") {
        warn!("Spotify authorization denied: {}", error);
        return (StatusCode::BAD_REQUEST, "Spotify authentication failed.");
    }

    let Some(code) = params.get("code") else {
        return (StatusCode::BAD_REQUEST, "Missing authorization code.");
    };

    match authorizer
        .complete(code, params.get("state").map(String::as_str))
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            "Spotify authentication successful! You can close this window.",
        ),
        Err(e) => {
            warn!("Token exchange failed: {}", e);
            (StatusCode::BAD_REQUEST, "Spotify authentication failed.")
        }
    }
}
