//! Error types for catalog operations.

/// Errors that can abort a catalog refresh.
///
/// Per-manifest parse failures are deliberately absent: a file that does
/// not parse is logged and skipped inside the refresh loop and never
/// surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Upstream refused the request with rate-limit wording.
    #[error("upstream API rate limit hit; set GITHUB_TOKEN to raise the quota")]
    RateLimited,

    /// Upstream returned a non-success status.
    #[error("tarball fetch failed: HTTP {status}: {detail}")]
    Fetch {
        /// HTTP status code returned by upstream.
        status: u16,
        /// Leading excerpt of the response body.
        detail: String,
    },

    /// Transport-level failure before any HTTP status was available.
    #[error("tarball fetch failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The downloaded archive did not have the expected layout.
    #[error("unexpected archive layout: {0}")]
    Structure(String),

    /// Filesystem error while staging or unpacking the archive.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A background refresh task failed to run to completion.
    #[error("catalog refresh task failed: {0}")]
    Refresh(String),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
