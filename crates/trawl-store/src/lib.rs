// crates/trawl-store/src/lib.rs
//
// trawl-store: Statistics index for Trawl.
//
// Serves the two aggregate reads (content size by label, by time bucket)
// from a SQLite database populated by a separate writer process. Reads go
// through an r2d2 connection pool with query-only connections.

pub mod schema;
pub mod sqlite;

// Re-export key types for ergonomic access from downstream crates.
pub use sqlite::{SqliteStatsStore, StatsStoreOptions};
