//! Kind discovery endpoints.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use pkgdex_core::query;

use super::PrettyJson;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Kind route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/kinds", get(list_kinds))
        .route("/kinds/:kind/packages", get(list_packages_by_kind))
}

/// `GET /kinds` - distinct manifest kinds, sorted.
async fn list_kinds(State(state): State<AppState>) -> ApiResult<PrettyJson<Vec<String>>> {
    let snapshot = state.catalog.get_all().await?;
    Ok(PrettyJson(query::list_kinds(snapshot.manifests())))
}

/// `GET /kinds/{kind}/packages` - package names within a kind, sorted.
/// 404 when the kind is unknown or holds no packages.
async fn list_packages_by_kind(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<PrettyJson<Vec<String>>> {
    let snapshot = state.catalog.get_all().await?;
    let names = query::list_names(snapshot.manifests(), &kind);
    if names.is_empty() {
        return Err(ApiError::not_found(format!(
            "kind '{kind}' not found or has no packages"
        )));
    }
    Ok(PrettyJson(names))
}
