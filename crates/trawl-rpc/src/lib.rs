// crates/trawl-rpc/src/lib.rs
//
// trawl-rpc: HTTP API for the Trawl query coordinator.
//
// Provides an axum server exposing /query, /health, /labels/{source}
// and /ages/{source}. Handlers get their collaborators from a
// ServiceContext installed once the daemon has finished starting up.

pub mod context;
pub mod error;
pub mod handlers;
pub mod merge;
pub mod middleware;
pub mod server;

// Re-export the main server types for ergonomic access.
pub use context::{ContextHandle, QueryConfig, ServiceContext};
pub use error::ApiError;
pub use server::{build_router, RpcConfig, TrawlRpcServer};
