use std::sync::Arc;

use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::spotify::Authorizer;

pub async fn health(Extension(authorizer): Extension<Arc<Authorizer>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "authorized": authorizer.is_ready(),
    }))
}
