//! Tarball download from the upstream package index.
//!
//! One bulk tarball download replaces hundreds of per-file API requests;
//! the GitHub contents/raw endpoints are intentionally not used.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::error::{CatalogError, Result};

/// Environment variable holding an optional GitHub personal access token.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Wording GitHub uses in 403 bodies when the API quota is exhausted.
const RATE_LIMIT_MARKER: &str = "rate limit";

/// Maximum length of the upstream body excerpt carried in errors.
const ERROR_DETAIL_LEN: usize = 200;

const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Source of the repository archive.
///
/// The production implementation hits the network; tests substitute
/// canned bytes or failures to exercise the cache without any I/O.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Downloads the complete repository archive as gzipped tar bytes.
    async fn fetch_archive(&self) -> Result<Bytes>;
}

/// Downloads the repository tarball over HTTPS, following redirects.
pub struct HttpArchiveFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpArchiveFetcher {
    /// Creates a fetcher for the given tarball URL.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pkgdex/", env!("CARGO_PKG_VERSION")))
            .timeout(FETCH_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ArchiveFetcher for HttpArchiveFetcher {
    async fn fetch_archive(&self) -> Result<Bytes> {
        let mut request = self.client.get(&self.url);

        // Re-read the token on every attempt; a rotated credential must
        // not require a process restart.
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.is_empty() {
                request = request.header(reqwest::header::AUTHORIZATION, format!("token {token}"));
            }
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::FORBIDDEN
                && body.to_lowercase().contains(RATE_LIMIT_MARKER)
            {
                return Err(CatalogError::RateLimited);
            }
            return Err(CatalogError::Fetch {
                status: status.as_u16(),
                detail: excerpt(&body),
            });
        }

        Ok(response.bytes().await?)
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(ERROR_DETAIL_LEN).collect()
}
