// crates/trawl-core/src/error.rs

use thiserror::Error;

/// Error taxonomy for the Trawl coordinator.
///
/// Each variant maps onto one externally visible outcome; the HTTP layer in
/// trawl-rpc owns the status-code mapping.
#[derive(Debug, Error)]
pub enum TrawlError {
    /// A collaborator is not ready yet, or no peer qualifies for a query.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Caller-supplied input was rejected (unknown source, bad limit, ...).
    #[error("{0}")]
    InvalidArgument(String),

    /// A single remote peer call failed or timed out.
    ///
    /// The dispatcher absorbs these; they never reach the caller.
    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    /// Statistics store error (pool, SQL, schema).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Cryptographic error (key parsing, signing, verification).
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Anything else that went wrong unexpectedly.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrawlError {
    /// Shorthand for the error returned when a source name does not parse.
    pub fn invalid_source(source: &str) -> Self {
        TrawlError::InvalidArgument(format!("Invalid source: {}", source))
    }
}

impl From<serde_json::Error> for TrawlError {
    fn from(e: serde_json::Error) -> Self {
        TrawlError::Serialization(e.to_string())
    }
}

impl From<ed25519_dalek::SignatureError> for TrawlError {
    fn from(e: ed25519_dalek::SignatureError) -> Self {
        TrawlError::Crypto(e.to_string())
    }
}

impl From<hex::FromHexError> for TrawlError {
    fn from(e: hex::FromHexError) -> Self {
        TrawlError::Crypto(format!("Invalid hex: {}", e))
    }
}
