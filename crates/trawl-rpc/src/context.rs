// crates/trawl-rpc/src/context.rs
//
// ServiceContext: everything a handler needs, built once at startup and
// handed to each request through a ContextHandle.
//
// The HTTP server may start before the collaborators are ready (the first
// membership snapshot is still loading, for instance). Until the daemon
// installs a context, every route answers 503.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use trawl_core::error::TrawlError;
use trawl_core::traits::{LivenessProbe, MembershipView, PeerConnector, StatsRepository};
use trawl_p2p::{DispatchPool, PeerSelection, QueryDispatcher, DEFAULT_DISPATCH_TIMEOUT};

use crate::error::ApiError;

/// Query-path tuning.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// How many miners each query is sent to.
    pub fanout: usize,
    /// Which ranked set the miners are drawn from.
    pub dispatch_pool: DispatchPool,
    /// Hard timeout for each miner call.
    pub timeout: Duration,
    /// Largest accepted `limit`.
    pub max_limit: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            fanout: 1,
            dispatch_pool: DispatchPool::Qualified,
            timeout: DEFAULT_DISPATCH_TIMEOUT,
            max_limit: 1000,
        }
    }
}

/// Collaborators and settings shared by all handlers.
pub struct ServiceContext {
    /// Our own uid, excluded from every selection.
    pub self_uid: u16,
    pub membership: Arc<dyn MembershipView>,
    pub liveness: Arc<dyn LivenessProbe>,
    pub stats: Arc<dyn StatsRepository>,
    pub dispatcher: QueryDispatcher,
    pub query: QueryConfig,
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("self_uid", &self.self_uid)
            .field("query", &self.query)
            .finish()
    }
}

impl ServiceContext {
    pub fn new(
        self_uid: u16,
        membership: Arc<dyn MembershipView>,
        liveness: Arc<dyn LivenessProbe>,
        stats: Arc<dyn StatsRepository>,
        connector: Arc<dyn PeerConnector>,
        query: QueryConfig,
    ) -> Self {
        let dispatcher = QueryDispatcher::new(connector, query.timeout);
        Self {
            self_uid,
            membership,
            liveness,
            stats,
            dispatcher,
            query,
        }
    }

    /// Rank the current snapshot's miners.
    pub async fn selection(&self) -> Result<PeerSelection, TrawlError> {
        let metagraph = self.membership.snapshot().await?;
        Ok(PeerSelection::from_metagraph(&metagraph, self.self_uid))
    }
}

/// Write-once slot for the [`ServiceContext`], cloned into the router.
#[derive(Clone, Default)]
pub struct ContextHandle {
    slot: Arc<OnceLock<Arc<ServiceContext>>>,
}

impl std::fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextHandle")
            .field("installed", &self.slot.get().is_some())
            .finish()
    }
}

impl ContextHandle {
    /// An empty handle; routes answer 503 until [`install`](Self::install).
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle that is ready immediately.
    pub fn ready(context: ServiceContext) -> Self {
        let handle = Self::new();
        let _ = handle.slot.set(Arc::new(context));
        handle
    }

    /// Install the context. Fails if one is already installed.
    pub fn install(&self, context: ServiceContext) -> Result<(), TrawlError> {
        self.slot
            .set(Arc::new(context))
            .map_err(|_| TrawlError::Internal("Service context already installed".to_string()))
    }

    /// The installed context, or `ServiceUnavailable`.
    pub fn get(&self) -> Result<Arc<ServiceContext>, TrawlError> {
        self.slot
            .get()
            .cloned()
            .ok_or_else(|| TrawlError::ServiceUnavailable("API server not initialized".to_string()))
    }
}

/// Extractor yielding the installed [`ServiceContext`].
pub struct Ctx(pub Arc<ServiceContext>);

#[axum::async_trait]
impl FromRequestParts<ContextHandle> for Ctx {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        handle: &ContextHandle,
    ) -> Result<Self, Self::Rejection> {
        handle.get().map(Ctx).map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_handle_is_unavailable() {
        let handle = ContextHandle::new();
        assert!(matches!(handle.get(), Err(TrawlError::ServiceUnavailable(_))));
    }

    #[test]
    fn query_config_defaults() {
        let cfg = QueryConfig::default();
        assert_eq!(cfg.fanout, 1);
        assert_eq!(cfg.dispatch_pool, DispatchPool::Qualified);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.max_limit, 1000);
    }
}
