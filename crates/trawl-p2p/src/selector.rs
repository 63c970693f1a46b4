// crates/trawl-p2p/src/selector.rs
//
// PeerSelector: which miners may be queried, which of them are trusted
// enough to count as "qualified", and which ones a dispatch targets.

use std::cmp::Ordering;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use trawl_core::identity::NodeRole;
use trawl_core::metagraph::{Metagraph, NodeInfo};

/// Which ranked set a dispatch draws its targets from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchPool {
    /// Only the top half of eligible miners by trust.
    #[default]
    Qualified,
    /// Every eligible miner.
    Eligible,
}

/// The eligible and qualified miners for one request.
#[derive(Debug, Clone, Default)]
pub struct PeerSelection {
    /// Active miners other than ourselves, highest trust first.
    pub eligible: Vec<NodeInfo>,
    /// Leading `eligible.len() / 2` entries of `eligible`.
    pub qualified: Vec<NodeInfo>,
}

impl PeerSelection {
    /// Derive the selection from a membership snapshot.
    ///
    /// Validators, inactive nodes, and `self_uid` are excluded. Ties in
    /// trust are broken by uid so the ranking is deterministic.
    pub fn from_metagraph(metagraph: &Metagraph, self_uid: u16) -> Self {
        let mut eligible: Vec<NodeInfo> = metagraph
            .nodes
            .iter()
            .filter(|n| n.role == NodeRole::Miner && n.active && n.uid != self_uid)
            .cloned()
            .collect();

        eligible.sort_by(|a, b| {
            b.trust
                .partial_cmp(&a.trust)
                .unwrap_or(Ordering::Equal)
                .then(a.uid.cmp(&b.uid))
        });

        let qualified = eligible[..eligible.len() / 2].to_vec();

        Self {
            eligible,
            qualified,
        }
    }

    /// The ranked set for the given pool.
    pub fn pool(&self, pool: DispatchPool) -> &[NodeInfo] {
        match pool {
            DispatchPool::Qualified => &self.qualified,
            DispatchPool::Eligible => &self.eligible,
        }
    }

    /// Pick up to `fanout` distinct targets uniformly at random from `pool`.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        pool: DispatchPool,
        fanout: usize,
        rng: &mut R,
    ) -> Vec<NodeInfo> {
        self.pool(pool)
            .choose_multiple(rng, fanout)
            .cloned()
            .collect()
    }
}
