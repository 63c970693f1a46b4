// crates/trawl-p2p/src/dispatch.rs
//
// QueryDispatcher: send one query to an explicit list of miners.
//
// One session is opened per dispatch and dropped when it returns. Each
// miner call runs concurrently under the same hard timeout. A miner that
// errors or times out is logged and contributes nothing; it never fails
// the dispatch. There are no retries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use trawl_core::error::TrawlError;
use trawl_core::metagraph::NodeInfo;
use trawl_core::query::{OnDemandRequest, QueryResultItem};
use trawl_core::traits::PeerConnector;

/// Upper bound on a single miner call.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// What came back from one dispatch.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    /// One entry per miner that answered, in the order answers arrived.
    pub payloads: Vec<Vec<QueryResultItem>>,
    /// Number of miners a call was issued to.
    pub attempted: usize,
    /// Number of miners that errored or timed out.
    pub failed: usize,
}

/// Sends a query to the miners it is given.
#[derive(Clone)]
pub struct QueryDispatcher {
    connector: Arc<dyn PeerConnector>,
    timeout: Duration,
}

impl std::fmt::Debug for QueryDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryDispatcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl QueryDispatcher {
    pub fn new(connector: Arc<dyn PeerConnector>, timeout: Duration) -> Self {
        Self { connector, timeout }
    }

    /// Query every miner in `peers` once.
    ///
    /// Only failing to open the session is an error; per-miner failures are
    /// absorbed and counted in [`DispatchOutcome::failed`].
    pub async fn dispatch(
        &self,
        peers: &[NodeInfo],
        request: &OnDemandRequest,
    ) -> Result<DispatchOutcome, TrawlError> {
        let mut outcome = DispatchOutcome {
            attempted: peers.len(),
            ..DispatchOutcome::default()
        };
        if peers.is_empty() {
            return Ok(outcome);
        }

        let session = self.connector.connect()?;
        let request = Arc::new(request.clone());
        let timeout = self.timeout;

        let mut calls = JoinSet::new();
        for peer in peers.iter().cloned() {
            let session = session.clone();
            let request = request.clone();
            calls.spawn(async move {
                let result = match tokio::time::timeout(timeout, session.forward(&peer, &request)).await {
                    Ok(result) => result,
                    Err(_) => Err(TrawlError::RemoteCall(format!(
                        "no answer within {}s",
                        timeout.as_secs_f64()
                    ))),
                };
                (peer.uid, result)
            });
        }

        while let Some(joined) = calls.join_next().await {
            match joined {
                Ok((uid, Ok(items))) => {
                    debug!("Miner {} returned {} items", uid, items.len());
                    outcome.payloads.push(items);
                }
                Ok((uid, Err(e))) => {
                    warn!("Error querying miner {}: {}", uid, e);
                    outcome.failed += 1;
                }
                Err(e) => {
                    warn!("Miner query task aborted: {}", e);
                    outcome.failed += 1;
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trawl_core::identity::NodeRole;
    use trawl_core::source::DataSource;
    use trawl_core::traits::PeerClient;

    /// Answers by uid: 1 -> two items, 2 -> transport error, 3 -> hangs.
    struct ScriptedClient;

    #[async_trait]
    impl PeerClient for ScriptedClient {
        async fn forward(
            &self,
            peer: &NodeInfo,
            _request: &OnDemandRequest,
        ) -> Result<Vec<QueryResultItem>, TrawlError> {
            match peer.uid {
                1 => Ok(vec![
                    QueryResultItem(json!({"n": 1})),
                    QueryResultItem(json!({"n": 2})),
                ]),
                2 => Err(TrawlError::RemoteCall("connection refused".to_string())),
                _ => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(vec![])
                }
            }
        }
    }

    #[derive(Default)]
    struct CountingConnector {
        opened: AtomicUsize,
    }

    impl PeerConnector for CountingConnector {
        fn connect(&self) -> Result<Arc<dyn PeerClient>, TrawlError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(ScriptedClient))
        }
    }

    struct BrokenConnector;

    impl PeerConnector for BrokenConnector {
        fn connect(&self) -> Result<Arc<dyn PeerClient>, TrawlError> {
            Err(TrawlError::Internal("no network".to_string()))
        }
    }

    fn miner(uid: u16) -> NodeInfo {
        NodeInfo {
            uid,
            hotkey: [uid as u8; 32],
            role: NodeRole::Miner,
            trust: 1.0,
            axon_addr: format!("http://miner-{}", uid),
            active: true,
        }
    }

    fn request() -> OnDemandRequest {
        OnDemandRequest {
            source: DataSource::Reddit,
            usernames: vec![],
            keywords: vec![],
            start_date: None,
            end_date: None,
            limit: 10,
        }
    }

    #[tokio::test]
    async fn failures_and_timeouts_are_absorbed() {
        let connector = Arc::new(CountingConnector::default());
        let dispatcher = QueryDispatcher::new(connector.clone(), Duration::from_millis(50));

        let outcome = dispatcher
            .dispatch(&[miner(1), miner(2), miner(3)], &request())
            .await
            .unwrap();

        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.failed, 2);
        assert_eq!(outcome.payloads.len(), 1);
        assert_eq!(outcome.payloads[0].len(), 2);
        assert_eq!(connector.opened.load(Ordering::SeqCst), 1, "one session per dispatch");
    }

    #[tokio::test]
    async fn hanging_miner_alone_yields_empty_outcome() {
        let dispatcher =
            QueryDispatcher::new(Arc::new(CountingConnector::default()), Duration::from_millis(20));
        let outcome = dispatcher.dispatch(&[miner(3)], &request()).await.unwrap();
        assert!(outcome.payloads.is_empty());
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn no_peers_opens_no_session() {
        let connector = Arc::new(CountingConnector::default());
        let dispatcher = QueryDispatcher::new(connector.clone(), DEFAULT_DISPATCH_TIMEOUT);
        let outcome = dispatcher.dispatch(&[], &request()).await.unwrap();
        assert_eq!(outcome.attempted, 0);
        assert_eq!(connector.opened.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn session_failure_is_surfaced() {
        let dispatcher = QueryDispatcher::new(Arc::new(BrokenConnector), DEFAULT_DISPATCH_TIMEOUT);
        let result = dispatcher.dispatch(&[miner(1)], &request()).await;
        assert!(matches!(result, Err(TrawlError::Internal(_))));
    }
}
