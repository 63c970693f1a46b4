// crates/trawl-rpc/src/handlers/health.rs
//
// Health handler: liveness plus the number of miners we could query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trawl_core::error::TrawlError;

use crate::context::ServiceContext;

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy", mirroring the liveness probe.
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// Eligible miners in the current snapshot.
    pub miners_available: usize,
}

/// Handle a health check.
pub async fn handle_health(ctx: &ServiceContext) -> Result<HealthResponse, TrawlError> {
    let selection = ctx.selection().await?;
    let status = if ctx.liveness.is_healthy() {
        "healthy"
    } else {
        "unhealthy"
    };

    Ok(HealthResponse {
        status: status.to_string(),
        timestamp: Utc::now(),
        miners_available: selection.eligible.len(),
    })
}
