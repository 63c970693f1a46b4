// crates/trawl-p2p/src/lib.rs
//
// trawl-p2p: Networking layer for Trawl.
//
// Ranks miners from the membership snapshot, opens signed HTTP sessions
// to their axons, and dispatches on-demand queries under a hard timeout.

pub mod auth;
pub mod axon;
pub mod dendrite;
pub mod dispatch;
pub mod selector;

pub use axon::{Axon, AxonConfig, OnDemandHandler};
pub use dendrite::{Dendrite, DendriteConnector};
pub use dispatch::{DispatchOutcome, QueryDispatcher, DEFAULT_DISPATCH_TIMEOUT};
pub use selector::{DispatchPool, PeerSelection};
