//! Shared state for HTTP handlers.

use std::sync::Arc;

use pkgdex_core::catalog::CatalogCache;

/// Shared state injected into every handler.
///
/// The catalog cache is the only shared mutable state in the process;
/// handlers hold it behind an `Arc` and never touch globals.
#[derive(Clone)]
pub struct AppState {
    /// The TTL-cached package catalog.
    pub catalog: Arc<CatalogCache>,
}

impl AppState {
    /// Creates new handler state around the given catalog cache.
    pub fn new(catalog: Arc<CatalogCache>) -> Self {
        Self { catalog }
    }
}
