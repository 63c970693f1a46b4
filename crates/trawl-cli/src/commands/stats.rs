// crates/trawl-cli/src/commands/stats.rs
//
// `trawl labels <source>` and `trawl ages <source>`: statistics index views.

use tabled::Tabled;

use trawl_core::source::TimeBucket;
use trawl_core::stats::{AgeSize, LabelSize};

use crate::client::ApiClient;
use crate::output::{format_json, format_table, human_bytes, OutputFormat};

#[derive(Tabled)]
struct LabelRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Adjusted")]
    adjusted: String,
}

#[derive(Tabled)]
struct AgeRow {
    #[tabled(rename = "Bucket")]
    bucket: i64,
    #[tabled(rename = "Starts (UTC)")]
    starts: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Adjusted")]
    adjusted: String,
}

fn label_row(l: &LabelSize) -> LabelRow {
    LabelRow {
        label: l.label_value.clone().unwrap_or_else(|| "(none)".to_string()),
        size: human_bytes(l.content_size_bytes),
        adjusted: human_bytes(l.adj_content_size_bytes),
    }
}

fn age_row(a: &AgeSize) -> AgeRow {
    AgeRow {
        bucket: a.time_bucket_id,
        starts: TimeBucket(a.time_bucket_id)
            .start()
            .map(|t| t.format("%Y-%m-%d %H:00").to_string())
            .unwrap_or_else(|| "-".to_string()),
        size: human_bytes(a.content_size_bytes),
        adjusted: human_bytes(a.adj_content_size_bytes),
    }
}

/// Run the labels command.
pub async fn run_labels(
    client: &ApiClient,
    source: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<LabelSize> = client.get(&format!("/labels/{}", source)).await?;
    match format {
        OutputFormat::Json => println!("{}", format_json(&labels)),
        OutputFormat::Table if labels.is_empty() => println!("No labels indexed for {}.", source),
        OutputFormat::Table => {
            let rows: Vec<LabelRow> = labels.iter().map(label_row).collect();
            println!("{}", format_table(&rows));
        }
    }
    Ok(())
}

/// Run the ages command.
pub async fn run_ages(
    client: &ApiClient,
    source: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let ages: Vec<AgeSize> = client.get(&format!("/ages/{}", source)).await?;
    match format {
        OutputFormat::Json => println!("{}", format_json(&ages)),
        OutputFormat::Table if ages.is_empty() => println!("No content indexed for {}.", source),
        OutputFormat::Table => {
            let rows: Vec<AgeRow> = ages.iter().map(age_row).collect();
            println!("{}", format_table(&rows));
        }
    }
    Ok(())
}
