//! Router assembly for the package index API.

use axum::http::Uri;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::routes;
use crate::state::AppState;

/// Creates the package index API router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::kinds::routes())
        .merge(routes::packages::routes())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no such route: {}", uri.path()))
}
