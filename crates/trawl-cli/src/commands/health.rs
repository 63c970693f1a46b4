// crates/trawl-cli/src/commands/health.rs
//
// `trawl health`: coordinator liveness and miner availability.

use trawl_rpc::handlers::health::HealthResponse;

use crate::client::ApiClient;
use crate::output::{format_json, OutputFormat};

/// Run the health command.
pub async fn run(client: &ApiClient, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let health: HealthResponse = client.get("/health").await?;

    match format {
        OutputFormat::Json => println!("{}", format_json(&health)),
        OutputFormat::Table => {
            println!("Status:           {}", health.status);
            println!("Miners available: {}", health.miners_available);
            println!("Checked at:       {}", health.timestamp.to_rfc3339());
        }
    }
    Ok(())
}
