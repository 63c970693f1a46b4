// crates/trawl-core/src/lib.rs
//
// trawl-core: Core types, traits, and crypto primitives for Trawl.
//
// This is the leaf crate every other crate in the workspace depends on.
// It defines the membership snapshot, query wire types, statistics records,
// the error taxonomy, and the collaborator traits the coordinator is built on.

pub mod crypto;
pub mod error;
pub mod identity;
pub mod metagraph;
pub mod query;
pub mod source;
pub mod stats;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use trawl_core::Metagraph;`

pub use error::TrawlError;
pub use identity::{NodeIdentity, NodeRole};
pub use metagraph::{Metagraph, NodeInfo};
pub use query::{ItemKey, OnDemandRequest, OnDemandResponse, QueryResultItem};
pub use source::{DataSource, TimeBucket};
pub use stats::{AgeSize, LabelSize};
pub use traits::{LivenessProbe, MembershipView, PeerClient, PeerConnector, StatsRepository};
