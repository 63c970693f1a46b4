// crates/trawl-rpc/src/handlers/mod.rs
//
// Handler modules for all HTTP endpoints.
// Each module defines request/response types and a handle_* function
// that works on a ServiceContext; server.rs adapts them to axum routes.

pub mod health;
pub mod query;
pub mod stats;
