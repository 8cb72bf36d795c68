//! pkgdex-server library exports

pub mod error;
pub mod router;
pub mod routes;
pub mod state;

pub use router::api_router;
pub use state::AppState;
