// crates/trawl-p2p/src/dendrite.rs
//
// Dendrite: outbound query sender for Trawl.
//
// A Dendrite is one HTTP session. The connector opens a fresh one for each
// dispatch, so connection state never outlives the call that created it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use trawl_core::crypto::Keypair;
use trawl_core::error::TrawlError;
use trawl_core::metagraph::NodeInfo;
use trawl_core::query::{OnDemandRequest, OnDemandResponse, QueryResultItem};
use trawl_core::traits::{PeerClient, PeerConnector};

use crate::auth::{self, HOTKEY_HEADER, NONCE_HEADER, SIGNATURE_HEADER};

/// Path miners serve on-demand queries under.
pub const ON_DEMAND_PATH: &str = "/on_demand";

/// An open session that sends signed queries to miner axons.
pub struct Dendrite {
    client: reqwest::Client,
    keypair: Option<Arc<Keypair>>,
}

impl std::fmt::Debug for Dendrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dendrite")
            .field("signed", &self.keypair.is_some())
            .finish()
    }
}

impl Dendrite {
    /// Open a session. `timeout` bounds each HTTP exchange.
    pub fn new(keypair: Option<Arc<Keypair>>, timeout: Duration) -> Result<Self, TrawlError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrawlError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, keypair })
    }

    fn endpoint(peer: &NodeInfo) -> String {
        format!("{}{}", peer.axon_addr.trim_end_matches('/'), ON_DEMAND_PATH)
    }
}

#[async_trait]
impl PeerClient for Dendrite {
    async fn forward(
        &self,
        peer: &NodeInfo,
        request: &OnDemandRequest,
    ) -> Result<Vec<QueryResultItem>, TrawlError> {
        let body = serde_json::to_vec(request)?;
        let url = Self::endpoint(peer);

        let mut builder = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(keypair) = &self.keypair {
            let signed = auth::sign_request(keypair, chrono::Utc::now().timestamp_millis(), &body);
            builder = builder
                .header(HOTKEY_HEADER, signed.hotkey)
                .header(NONCE_HEADER, signed.nonce)
                .header(SIGNATURE_HEADER, signed.signature);
        }

        let resp = builder
            .body(body)
            .send()
            .await
            .map_err(|e| TrawlError::RemoteCall(format!("HTTP error from {}: {}", url, e)))?;

        if !resp.status().is_success() {
            return Err(TrawlError::RemoteCall(format!(
                "Miner {} returned status {}",
                peer.uid,
                resp.status()
            )));
        }

        let reply: OnDemandResponse = resp
            .json()
            .await
            .map_err(|e| TrawlError::RemoteCall(format!("Failed to parse response from {}: {}", url, e)))?;

        debug!("Miner {} answered with {} items", peer.uid, reply.data.len());
        Ok(reply.data)
    }
}

/// Opens a new [`Dendrite`] per dispatch.
#[derive(Clone)]
pub struct DendriteConnector {
    keypair: Option<Arc<Keypair>>,
    timeout: Duration,
}

impl std::fmt::Debug for DendriteConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DendriteConnector")
            .field("signed", &self.keypair.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DendriteConnector {
    /// `keypair` signs outbound calls; `None` sends them unsigned.
    pub fn new(keypair: Option<Arc<Keypair>>, timeout: Duration) -> Self {
        Self { keypair, timeout }
    }
}

impl PeerConnector for DendriteConnector {
    fn connect(&self) -> Result<Arc<dyn PeerClient>, TrawlError> {
        Ok(Arc::new(Dendrite::new(self.keypair.clone(), self.timeout)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trawl_core::identity::NodeRole;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let peer = NodeInfo {
            uid: 1,
            hotkey: [0u8; 32],
            role: NodeRole::Miner,
            trust: 1.0,
            axon_addr: "http://10.0.0.1:8091/".to_string(),
            active: true,
        };
        assert_eq!(Dendrite::endpoint(&peer), "http://10.0.0.1:8091/on_demand");
    }

    #[test]
    fn connector_opens_sessions() {
        let connector = DendriteConnector::new(Some(Arc::new(Keypair::generate())), Duration::from_secs(1));
        assert!(connector.connect().is_ok());
    }
}
