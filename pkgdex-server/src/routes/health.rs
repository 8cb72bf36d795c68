//! Liveness endpoint.

use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};

use super::PrettyJson;
use crate::state::AppState;

/// Health route group.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// `GET /health` - liveness probe; never touches the catalog.
async fn health() -> PrettyJson<Value> {
    PrettyJson(json!({ "status": "ok" }))
}
