// crates/trawl-rpc/src/error.rs
//
// Maps the core error taxonomy onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use trawl_core::error::TrawlError;

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always "error".
    pub status: String,
    /// Human-readable message.
    pub error: String,
}

/// A [`TrawlError`] on its way out of an HTTP handler.
#[derive(Debug)]
pub struct ApiError(pub TrawlError);

impl ApiError {
    /// `ServiceUnavailable` -> 503, `InvalidArgument` -> 400, anything else -> 500.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TrawlError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            TrawlError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TrawlError> for ApiError {
    fn from(e: TrawlError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, self.0);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self.0);
        }

        let body = ErrorBody {
            status: "error".to_string(),
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
