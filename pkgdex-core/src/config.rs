//! Runtime configuration, sourced from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::catalog::DEFAULT_CACHE_TTL;

/// Default upstream tarball endpoint (main branch of the package index).
pub const DEFAULT_UPSTREAM_URL: &str =
    "https://api.github.com/repos/ruyisdk/packages-index/tarball/main";

const UPSTREAM_URL_VAR: &str = "PKGDEX_UPSTREAM_URL";
const CACHE_TTL_VAR: &str = "PKGDEX_CACHE_TTL_SECS";
const BIND_ADDR_VAR: &str = "PKGDEX_BIND";

/// Server configuration with environment overrides.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the upstream repository tarball.
    pub upstream_url: String,

    /// Maximum snapshot age before a refresh.
    pub cache_ttl: Duration,

    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }
}

impl Config {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration from an arbitrary variable source. Empty
    /// values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(UPSTREAM_URL_VAR).filter(|v| !v.is_empty()) {
            config.upstream_url = url;
        }

        if let Some(secs) = lookup(CACHE_TTL_VAR).filter(|v| !v.is_empty()) {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("invalid {CACHE_TTL_VAR}: {secs}"))?;
            config.cache_ttl = Duration::from_secs(secs);
        }

        if let Some(addr) = lookup(BIND_ADDR_VAR).filter(|v| !v.is_empty()) {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("invalid {BIND_ADDR_VAR}: {addr}"))?;
        }

        Ok(config)
    }
}
