//! Package search, version listing, and manifest endpoints.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Router;
use pkgdex_core::catalog::PackageManifest;
use pkgdex_core::query;
use serde::Deserialize;
use serde_json::{json, Value};

use super::PrettyJson;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Package route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/packages", get(search_packages))
        .route("/packages/:kind/:name", get(list_versions))
        .route("/packages/:kind/:name/:version", get(get_manifest))
}

/// Query parameters for `GET /packages`.
#[derive(Debug, Deserialize)]
struct SearchParams {
    /// Substring to match against name or desc.
    q: Option<String>,
    /// Exact manifest kind filter.
    kind: Option<String>,
}

/// `GET /packages?q=&kind=` - filtered package list. Both filters are
/// optional; empty values count as absent.
async fn search_packages(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<PrettyJson<Vec<Value>>> {
    let snapshot = state.catalog.get_all().await?;

    let q = params.q.as_deref().filter(|v| !v.is_empty());
    let kind = params.kind.as_deref().filter(|v| !v.is_empty());

    let rows = query::search(snapshot.manifests(), q, kind)
        .into_iter()
        .map(listing_row)
        .collect();
    Ok(PrettyJson(rows))
}

/// `GET /packages/{kind}/{name}` - all versions of one package, sorted
/// by plain version-string comparison. 404 when none match.
async fn list_versions(
    State(state): State<AppState>,
    Path((kind, name)): Path<(String, String)>,
) -> ApiResult<PrettyJson<Vec<Value>>> {
    let snapshot = state.catalog.get_all().await?;
    let versions = query::list_versions(snapshot.manifests(), &kind, &name);
    if versions.is_empty() {
        return Err(ApiError::not_found("Package not found"));
    }

    let rows = versions.into_iter().map(version_row).collect();
    Ok(PrettyJson(rows))
}

/// `GET /packages/{kind}/{name}/{version}` - full manifest projection
/// with checksum side-tables merged into distfiles. 404 when absent.
async fn get_manifest(
    State(state): State<AppState>,
    Path((kind, name, version)): Path<(String, String, String)>,
) -> ApiResult<PrettyJson<Value>> {
    let snapshot = state.catalog.get_all().await?;
    query::find_manifest(snapshot.manifests(), &kind, &name, &version)
        .map(|manifest| PrettyJson(query::summarize(manifest)))
        .ok_or_else(|| ApiError::not_found("Manifest not found"))
}

fn listing_row(manifest: &PackageManifest) -> Value {
    json!({
        "id": manifest.id(),
        "kind": manifest.kind,
        "name": manifest.name,
        "version": manifest.version,
        "desc": manifest.desc(),
        "vendor": manifest.vendor(),
        "distfiles": manifest.distfiles,
    })
}

fn version_row(manifest: &PackageManifest) -> Value {
    json!({
        "id": manifest.id(),
        "version": manifest.version,
        "desc": manifest.desc(),
        "vendor": manifest.vendor(),
    })
}
