// crates/trawl-core/src/traits.rs
//
// Seams to the collaborators the coordinator consumes but does not own:
// membership, liveness, the statistics index, and the peer transport.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TrawlError;
use crate::metagraph::{Metagraph, NodeInfo};
use crate::query::{OnDemandRequest, QueryResultItem};
use crate::source::DataSource;
use crate::stats::{AgeSize, LabelSize};

/// Read-only view of network membership.
///
/// Implemented by the daemon (file-backed snapshot refreshed on a timer).
#[async_trait]
pub trait MembershipView: Send + Sync {
    /// The current snapshot. Fails with `ServiceUnavailable` if none is loaded.
    async fn snapshot(&self) -> Result<Arc<Metagraph>, TrawlError>;
}

/// Liveness predicate reported by `/health`.
pub trait LivenessProbe: Send + Sync {
    fn is_healthy(&self) -> bool;
}

/// The two aggregate reads over the statistics index.
///
/// Implemented by trawl-store (SQLite).
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Per-label totals for a source, sorted by adjusted size descending.
    async fn label_sizes(&self, source: DataSource) -> Result<Vec<LabelSize>, TrawlError>;

    /// Per-bucket totals for a source, sorted by bucket id descending.
    async fn age_sizes(&self, source: DataSource) -> Result<Vec<AgeSize>, TrawlError>;
}

/// Opens a network session for one dispatch.
///
/// The returned client lives exactly as long as the dispatch that opened it.
pub trait PeerConnector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn PeerClient>, TrawlError>;
}

/// One open session capable of querying miners.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Send one query to one miner and return its items.
    async fn forward(
        &self,
        peer: &NodeInfo,
        request: &OnDemandRequest,
    ) -> Result<Vec<QueryResultItem>, TrawlError>;
}
