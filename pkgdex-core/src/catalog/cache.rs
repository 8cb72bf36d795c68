//! The catalog cache: TTL-gated refresh with single-flight semantics.
//!
//! All readers go through [`CatalogCache::get_all`]. The refresh lock
//! covers the whole check-expiry / fetch / install sequence, so any
//! number of concurrent callers arriving past an expired TTL produce
//! exactly one upstream fetch; the rest wait on the lock and then read
//! the snapshot the winner installed.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::error::{CatalogError, Result};
use super::extractor::{self, RawManifest};
use super::fetcher::ArchiveFetcher;
use super::manifest::PackageManifest;

/// Default snapshot time-to-live (10 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// The complete catalog captured by one refresh.
///
/// Immutable once constructed; shared between readers as an `Arc`, so a
/// request that obtained a snapshot keeps seeing the same data even
/// while a later refresh installs a replacement.
#[derive(Debug)]
pub struct CatalogSnapshot {
    manifests: Vec<PackageManifest>,
    captured_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    fn new(manifests: Vec<PackageManifest>) -> Self {
        Self {
            manifests,
            captured_at: Utc::now(),
        }
    }

    /// All manifests, in snapshot order.
    pub fn manifests(&self) -> &[PackageManifest] {
        &self.manifests
    }

    /// When this snapshot was assembled.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Number of manifests in the snapshot.
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    /// Whether the snapshot holds no manifests.
    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}

/// The stored snapshot and the instant it was installed. Both are
/// replaced together; a snapshot is never mutated in place.
struct Slot {
    snapshot: Option<Arc<CatalogSnapshot>>,
    refreshed_at: Option<Instant>,
}

/// TTL-cached view of the upstream package index.
pub struct CatalogCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    fetcher: Arc<dyn ArchiveFetcher>,
    ttl: Duration,
    /// Serializes the whole check-TTL / refresh / install sequence.
    refresh_lock: Mutex<()>,
    /// Read side for the fast path and for the detached refresh task.
    slot: RwLock<Slot>,
}

impl CatalogCache {
    /// Creates a cache over the given fetcher with the given TTL.
    pub fn new(fetcher: Arc<dyn ArchiveFetcher>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                ttl,
                refresh_lock: Mutex::new(()),
                slot: RwLock::new(Slot {
                    snapshot: None,
                    refreshed_at: None,
                }),
            }),
        }
    }

    /// Returns the current snapshot, refreshing from upstream when the
    /// cached one is missing or older than the TTL.
    ///
    /// On refresh failure the error propagates to the caller and the
    /// previously stored snapshot is left untouched; the failed call
    /// never falls back to stale data.
    pub async fn get_all(&self) -> Result<Arc<CatalogSnapshot>> {
        let _guard = self.inner.refresh_lock.lock().await;

        if let Some(snapshot) = self.inner.fresh_snapshot() {
            return Ok(snapshot);
        }

        // Run the refresh on a detached task that installs the snapshot
        // itself: a caller that disconnects mid-wait cannot abort the
        // refresh other waiters will read.
        let inner = Arc::clone(&self.inner);
        match tokio::spawn(async move { inner.refresh().await }).await {
            Ok(result) => result,
            Err(err) => Err(CatalogError::Refresh(err.to_string())),
        }
    }

    /// Snapshot TTL this cache was built with.
    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }
}

impl CacheInner {
    /// The stored snapshot, if one exists and is younger than the TTL.
    fn fresh_snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        let slot = self.slot.read().expect("catalog slot lock poisoned");
        if slot.refreshed_at?.elapsed() < self.ttl {
            slot.snapshot.clone()
        } else {
            None
        }
    }

    /// Full refresh: fetch, unpack, parse, install.
    async fn refresh(self: Arc<Self>) -> Result<Arc<CatalogSnapshot>> {
        let started = Instant::now();

        let archive = self.fetcher.fetch_archive().await?;
        info!(bytes = archive.len(), "downloaded package index tarball");

        // Unpacking and per-file parsing are blocking filesystem work.
        let manifests = tokio::task::spawn_blocking(move || -> Result<Vec<PackageManifest>> {
            let raw = extractor::extract_manifests(&archive)?;
            Ok(parse_all(raw))
        })
        .await
        .map_err(|err| CatalogError::Refresh(err.to_string()))??;

        let snapshot = Arc::new(CatalogSnapshot::new(manifests));
        {
            let mut slot = self.slot.write().expect("catalog slot lock poisoned");
            slot.snapshot = Some(Arc::clone(&snapshot));
            slot.refreshed_at = Some(Instant::now());
        }

        info!(
            manifests = snapshot.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "catalog refreshed"
        );
        Ok(snapshot)
    }
}

/// Parses every raw manifest, skipping the ones that fail.
fn parse_all(raw: Vec<RawManifest>) -> Vec<PackageManifest> {
    let mut manifests = Vec::with_capacity(raw.len());
    for file in raw {
        match PackageManifest::parse(&file.kind, &file.name, &file.version, &file.path, &file.text)
        {
            Ok(manifest) => manifests.push(manifest),
            Err(err) => warn!(path = %file.path, %err, "skipping unparseable manifest"),
        }
    }
    manifests
}
