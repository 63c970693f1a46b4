// crates/trawl-cli/src/commands/mod.rs
//
// Command module declarations for the Trawl CLI.

pub mod health;
pub mod keygen;
pub mod query;
pub mod stats;
