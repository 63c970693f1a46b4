// crates/trawl-p2p/src/axon.rs
//
// Axon: inbound on-demand query server, the miner side of a Dendrite call.
//
// The coordinator never runs an Axon itself. It exists so miners built on
// this crate (and the integration tests) speak the same wire format and
// check request signatures the same way.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use trawl_core::error::TrawlError;
use trawl_core::query::{OnDemandRequest, OnDemandResponse, QueryResultItem};

use crate::auth::{self, SignedHeaders, HOTKEY_HEADER, NONCE_HEADER, SIGNATURE_HEADER};
use crate::dendrite::ON_DEMAND_PATH;

/// Answers on-demand queries on behalf of a miner.
#[async_trait]
pub trait OnDemandHandler: Send + Sync + 'static {
    /// `caller` is the verified hotkey of the coordinator, when the request was signed.
    async fn handle(&self, caller: Option<[u8; 32]>, request: OnDemandRequest) -> Vec<QueryResultItem>;
}

/// Signature policy for an [`Axon`].
#[derive(Debug, Clone)]
pub struct AxonConfig {
    /// Reject requests without valid signature headers.
    pub require_signature: bool,
    /// Maximum accepted distance between caller nonce and local clock.
    pub max_skew_ms: i64,
}

impl Default for AxonConfig {
    fn default() -> Self {
        Self {
            require_signature: true,
            max_skew_ms: 30_000,
        }
    }
}

#[derive(Clone)]
struct AxonState {
    handler: Arc<dyn OnDemandHandler>,
    config: AxonConfig,
}

/// A running on-demand server.
pub struct Axon {
    /// The address this Axon is listening on.
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for Axon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Axon")
            .field("addr", &self.addr)
            .field("running", &!self.task.is_finished())
            .finish()
    }
}

impl Axon {
    /// Bind to `addr` (port 0 picks a free port) and start serving.
    pub async fn start(
        addr: SocketAddr,
        handler: Arc<dyn OnDemandHandler>,
        config: AxonConfig,
    ) -> Result<Self, TrawlError> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| TrawlError::Internal(format!("Failed to bind axon on {}: {}", addr, e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| TrawlError::Internal(format!("Failed to read axon address: {}", e)))?;

        let app = router(handler, config);
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!("Axon on {} stopped: {}", addr, e);
            }
        });

        info!("Axon started on {}", addr);
        Ok(Self { addr, task })
    }

    /// Base URL to put in a metagraph entry.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting requests.
    pub fn stop(self) {
        self.task.abort();
        info!("Axon stopped on {}", self.addr);
    }
}

/// Router serving `POST /on_demand`.
pub fn router(handler: Arc<dyn OnDemandHandler>, config: AxonConfig) -> Router {
    Router::new()
        .route(ON_DEMAND_PATH, post(on_demand))
        .with_state(AxonState { handler, config })
}

fn signed_headers(headers: &HeaderMap) -> Option<SignedHeaders> {
    let get = |name: &str| headers.get(name)?.to_str().ok().map(str::to_string);
    Some(SignedHeaders {
        hotkey: get(HOTKEY_HEADER)?,
        nonce: get(NONCE_HEADER)?,
        signature: get(SIGNATURE_HEADER)?,
    })
}

async fn on_demand(
    State(state): State<AxonState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<OnDemandResponse>, (StatusCode, String)> {
    let caller = match signed_headers(&headers) {
        Some(signed) => {
            let now = chrono::Utc::now().timestamp_millis();
            match auth::verify_request(&signed, &body, now, state.config.max_skew_ms) {
                Ok(hotkey) => Some(hotkey),
                Err(e) => return Err((StatusCode::UNAUTHORIZED, e.to_string())),
            }
        }
        None if state.config.require_signature => {
            return Err((StatusCode::UNAUTHORIZED, "Missing signature headers".to_string()));
        }
        None => None,
    };

    let request: OnDemandRequest = serde_json::from_slice(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Invalid request: {}", e)))?;

    let data = state.handler.handle(caller, request).await;
    Ok(Json(OnDemandResponse { data }))
}
