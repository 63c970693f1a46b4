// crates/trawl-cli/src/main.rs
//
// CLI entrypoint for the Trawl developer tools.
//
// Talks to a running trawl-daemon over HTTP: health, on-demand queries,
// and the statistics index views. `keygen` works offline.

mod client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use client::ApiClient;
use commands::keygen::KeygenCmd;
use commands::query::QueryCmd;
use output::OutputFormat;

/// Trawl CLI: talk to a Trawl query coordinator.
#[derive(Parser, Debug)]
#[command(name = "trawl", version = "0.1.0", about = "Trawl query coordinator CLI")]
struct Cli {
    /// Base URL of the trawl-daemon HTTP API.
    #[arg(long, global = true, default_value = "http://localhost:8000")]
    api: String,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Coordinator liveness and available miners.
    Health,

    /// Fan a query out to miners and print the merged result.
    Query(QueryCmd),

    /// Content size per label for a source.
    Labels {
        /// reddit, x, or youtube.
        source: String,
    },

    /// Content size per hour bucket for a source.
    Ages {
        /// reddit, x, or youtube.
        source: String,
    },

    /// Generate the coordinator's signing hotkey.
    Keygen(KeygenCmd),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.api);
    let format = OutputFormat::from_json_flag(cli.json);

    match &cli.command {
        Commands::Health => commands::health::run(&client, format).await?,
        Commands::Query(cmd) => commands::query::run(&client, cmd, format).await?,
        Commands::Labels { source } => commands::stats::run_labels(&client, source, format).await?,
        Commands::Ages { source } => commands::stats::run_ages(&client, source, format).await?,
        Commands::Keygen(cmd) => commands::keygen::run(cmd).await?,
    }

    Ok(())
}
