// crates/trawl-rpc/src/server.rs
//
// HTTP server setup: TrawlRpcServer, RpcConfig, and the route table.
//
// Each route is a thin adapter: pull the ServiceContext out of the
// ContextHandle, decode the input, call the matching handle_* function,
// and let ApiError turn failures into status codes.

use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use trawl_core::error::TrawlError;
use trawl_core::stats::{AgeSize, LabelSize};

use crate::context::{ContextHandle, Ctx};
use crate::error::ApiError;
use crate::handlers;
use crate::handlers::health::HealthResponse;
use crate::handlers::query::{QueryRequest, QueryResponse};
use crate::middleware;

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Build the API router over `handle`.
pub fn build_router(handle: ContextHandle) -> Router {
    Router::new()
        .route("/query", post(query_route))
        .route("/health", get(health_route))
        .route("/labels/:source", get(labels_route))
        .route("/ages/:source", get(ages_route))
        .layer(middleware::trace_layer())
        .with_state(handle)
}

async fn query_route(
    Ctx(ctx): Ctx,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) =
        body.map_err(|e| TrawlError::InvalidArgument(format!("Invalid request body: {}", e.body_text())))?;
    let response = handlers::query::handle_query(&ctx, request).await?;
    Ok(Json(response))
}

async fn health_route(Ctx(ctx): Ctx) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(handlers::health::handle_health(&ctx).await?))
}

async fn labels_route(
    Ctx(ctx): Ctx,
    Path(source): Path<String>,
) -> Result<Json<Vec<LabelSize>>, ApiError> {
    Ok(Json(handlers::stats::handle_label_sizes(&ctx, &source).await?))
}

async fn ages_route(
    Ctx(ctx): Ctx,
    Path(source): Path<String>,
) -> Result<Json<Vec<AgeSize>>, ApiError> {
    Ok(Json(handlers::stats::handle_age_sizes(&ctx, &source).await?))
}

// ---------------------------------------------------------------------------
// TrawlRpcServer
// ---------------------------------------------------------------------------

/// The HTTP API server.
///
/// Serves 503 on every route until a context is installed into its handle.
#[derive(Debug, Clone)]
pub struct TrawlRpcServer {
    config: RpcConfig,
    handle: ContextHandle,
}

impl TrawlRpcServer {
    pub fn new(config: RpcConfig, handle: ContextHandle) -> Self {
        Self { config, handle }
    }

    /// Bind the configured address and serve until the task is dropped.
    pub async fn start(&self) -> Result<(), TrawlError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TrawlError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), TrawlError> {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        tracing::info!("Trawl API server listening on {:?}", local);

        axum::serve(listener, build_router(self.handle.clone()))
            .await
            .map_err(|e| TrawlError::Internal(format!("API server error: {}", e)))
    }
}
