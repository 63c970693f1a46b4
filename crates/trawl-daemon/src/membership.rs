// crates/trawl-daemon/src/membership.rs
//
// File-backed membership snapshot, its refresh loop, and the liveness
// probe derived from how recently it was refreshed.

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use trawl_core::error::TrawlError;
use trawl_core::metagraph::Metagraph;
use trawl_core::traits::{LivenessProbe, MembershipView};

/// A [`Metagraph`] loaded from a JSON file.
///
/// Until the first successful [`refresh`](Self::refresh), `snapshot` fails
/// with `ServiceUnavailable`. A failed refresh keeps the previous snapshot.
#[derive(Debug)]
pub struct FileMetagraph {
    path: PathBuf,
    current: RwLock<Option<Arc<Metagraph>>>,
    /// Unix millis of the last successful refresh, 0 if never.
    refreshed_at_ms: AtomicI64,
}

impl FileMetagraph {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(None),
            refreshed_at_ms: AtomicI64::new(0),
        }
    }

    /// Re-read the file and swap in the new snapshot.
    pub async fn refresh(&self) -> Result<Arc<Metagraph>, TrawlError> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            TrawlError::Internal(format!(
                "Failed to read metagraph {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let metagraph: Metagraph = serde_json::from_slice(&raw)?;
        let metagraph = Arc::new(metagraph);

        *self.current.write().await = Some(metagraph.clone());
        self.refreshed_at_ms
            .store(Utc::now().timestamp_millis(), Ordering::Release);

        tracing::debug!(
            "Loaded metagraph at block {} ({} nodes)",
            metagraph.block,
            metagraph.nodes.len()
        );
        Ok(metagraph)
    }

    /// Milliseconds since the last successful refresh, or `None` if there was none.
    pub fn age_ms(&self) -> Option<i64> {
        match self.refreshed_at_ms.load(Ordering::Acquire) {
            0 => None,
            at => Some(Utc::now().timestamp_millis().saturating_sub(at)),
        }
    }
}

#[async_trait]
impl MembershipView for FileMetagraph {
    async fn snapshot(&self) -> Result<Arc<Metagraph>, TrawlError> {
        self.current.read().await.clone().ok_or_else(|| {
            TrawlError::ServiceUnavailable("Metagraph not loaded yet".to_string())
        })
    }
}

/// Refresh `membership` every `interval_secs`, forever.
///
/// Failures are logged and the previous snapshot is kept.
pub async fn run_refresh_loop(membership: Arc<FileMetagraph>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    // The first tick completes immediately; startup already loaded once.
    interval.tick().await;

    loop {
        interval.tick().await;
        match membership.refresh().await {
            Ok(graph) => tracing::debug!("Metagraph refreshed at block {}", graph.block),
            Err(e) => tracing::warn!("Metagraph refresh failed, keeping previous snapshot: {}", e),
        }
    }
}

/// Healthy while the membership snapshot is fresh.
#[derive(Debug, Clone)]
pub struct SnapshotLiveness {
    membership: Arc<FileMetagraph>,
    stale_after: Duration,
}

impl SnapshotLiveness {
    pub fn new(membership: Arc<FileMetagraph>, stale_after: Duration) -> Self {
        Self {
            membership,
            stale_after,
        }
    }
}

impl LivenessProbe for SnapshotLiveness {
    fn is_healthy(&self) -> bool {
        match self.membership.age_ms() {
            Some(age) => age <= self.stale_after.as_millis() as i64,
            None => false,
        }
    }
}
