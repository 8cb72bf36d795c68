//! pkgdex - read-only REST facade over the RuyiSDK packages index.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use pkgdex_core::catalog::{CatalogCache, HttpArchiveFetcher};
use pkgdex_core::config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pkgdex_server::{api_router, AppState};

#[derive(Parser, Debug)]
#[clap(
    name = "pkgdex",
    about = "Read-only REST facade over the RuyiSDK packages index",
    version
)]
struct Cli {
    /// Address to bind the HTTP listener to (overrides PKGDEX_BIND).
    #[clap(long)]
    bind: Option<SocketAddr>,

    /// Snapshot TTL in seconds (overrides PKGDEX_CACHE_TTL_SECS).
    #[clap(long)]
    cache_ttl: Option<u64>,

    /// Upstream tarball URL (overrides PKGDEX_UPSTREAM_URL).
    #[clap(long)]
    upstream_url: Option<String>,

    /// Log filter directive used when RUST_LOG is unset.
    #[clap(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut config = Config::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(secs) = cli.cache_ttl {
        config.cache_ttl = Duration::from_secs(secs);
    }
    if let Some(url) = cli.upstream_url {
        config.upstream_url = url;
    }

    let fetcher = Arc::new(
        HttpArchiveFetcher::new(&config.upstream_url).context("failed to create HTTP client")?,
    );
    let catalog = Arc::new(CatalogCache::new(fetcher, config.cache_ttl));
    let app = api_router(AppState::new(catalog));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(
        addr = %config.bind_addr,
        upstream = %config.upstream_url,
        ttl_secs = config.cache_ttl.as_secs(),
        "pkgdex listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install ctrl-c handler");
    }
}
