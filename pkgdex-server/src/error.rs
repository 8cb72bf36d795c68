//! API error types and error response payloads.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pkgdex_core::catalog::CatalogError;
use serde::Serialize;

use crate::routes::PrettyJson;

/// Error detail carried in every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Stable error code identifier.
    pub error_code: String,
    /// Human readable message.
    pub message: String,
}

/// Error response wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    /// Error detail.
    pub error: ApiErrorDetail,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Requested resource does not exist in the catalog.
    #[error("{message}")]
    NotFound {
        /// Human readable message.
        message: String,
    },
    /// Upstream repository could not be reached or refused us.
    #[error("{message}")]
    BadGateway {
        /// Human readable message.
        message: String,
    },
    /// Internal error.
    #[error("{message}")]
    Internal {
        /// Human readable message.
        message: String,
    },
}

impl ApiError {
    /// Convenience constructor for 404 responses.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    fn to_status_and_payload(&self) -> (StatusCode, ApiErrorResponse) {
        let (status, error_code) = match self {
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadGateway { .. } => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        };
        (
            status,
            ApiErrorResponse {
                error: ApiErrorDetail {
                    error_code: error_code.to_string(),
                    message: self.to_string(),
                },
            },
        )
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            // The display text already carries the GITHUB_TOKEN hint.
            CatalogError::RateLimited
            | CatalogError::Fetch { .. }
            | CatalogError::Transport(_) => Self::BadGateway {
                message: err.to_string(),
            },
            CatalogError::Structure(_) | CatalogError::Io(_) | CatalogError::Refresh(_) => {
                Self::Internal {
                    message: err.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, payload) = self.to_status_and_payload();
        (status, PrettyJson(payload)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_maps_to_502_with_hint() {
        let err: ApiError = CatalogError::RateLimited.into();
        assert!(matches!(err, ApiError::BadGateway { .. }));
        assert!(err.to_string().contains("GITHUB_TOKEN"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_structural_error_maps_to_500() {
        let err: ApiError = CatalogError::Structure("no manifests dir".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = ApiError::not_found("nope").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
