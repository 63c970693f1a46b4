// crates/trawl-cli/src/commands/query.rs
//
// `trawl query --source X ...`: run an on-demand query through the coordinator.

use clap::Args;
use tabled::Tabled;

use trawl_core::query::QueryResultItem;
use trawl_rpc::handlers::query::QueryResponse;

use crate::client::ApiClient;
use crate::output::{format_json, format_table, OutputFormat};

/// On-demand query command.
#[derive(Debug, Args)]
pub struct QueryCmd {
    /// Data source: reddit, x, or youtube.
    #[arg(long)]
    pub source: String,

    /// Restrict to posts containing this keyword (repeatable).
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,

    /// Restrict to posts by this user (repeatable).
    #[arg(long = "username")]
    pub usernames: Vec<String>,

    /// Earliest post date, `YYYY-MM-DD` or RFC 3339.
    #[arg(long)]
    pub start_date: Option<String>,

    /// Latest post date, `YYYY-MM-DD` or RFC 3339.
    #[arg(long)]
    pub end_date: Option<String>,

    /// Maximum number of items to return.
    #[arg(long, default_value = "100")]
    pub limit: u32,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "URI")]
    uri: String,
    #[tabled(rename = "Content")]
    preview: String,
}

const PREVIEW_CHARS: usize = 60;

impl QueryCmd {
    /// The JSON body sent to `POST /query`.
    ///
    /// Dates are passed through as typed; the daemon validates them.
    fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "source": self.source,
            "keywords": self.keywords,
            "usernames": self.usernames,
            "start_date": self.start_date,
            "end_date": self.end_date,
            "limit": self.limit,
        })
    }
}

fn item_row(index: usize, item: &QueryResultItem) -> ItemRow {
    let field = |name: &str| item.0.get(name).and_then(|v| v.as_str()).map(str::to_string);
    let content = field("content")
        .or_else(|| field("text"))
        .unwrap_or_else(|| item.0.to_string());
    let mut preview: String = content.chars().take(PREVIEW_CHARS).collect();
    if content.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }

    ItemRow {
        index,
        uri: field("uri").unwrap_or_else(|| "-".to_string()),
        preview: preview.replace('\n', " "),
    }
}

/// Run the query command.
pub async fn run(
    client: &ApiClient,
    cmd: &QueryCmd,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let response: QueryResponse = client.post("/query", &cmd.body()).await?;

    match format {
        OutputFormat::Json => println!("{}", format_json(&response)),
        OutputFormat::Table => {
            let rows: Vec<ItemRow> = response
                .data
                .iter()
                .enumerate()
                .map(|(i, item)| item_row(i + 1, item))
                .collect();
            if rows.is_empty() {
                println!("No results.");
            } else {
                println!("{}", format_table(&rows));
            }
            let meta = &response.meta;
            println!();
            println!(
                "{} unique items from {} of {} miners queried ({} qualified, {} eligible)",
                meta.unique_items,
                meta.total_responses,
                meta.miners_queried,
                meta.qualified_miners,
                meta.total_miners
            );
        }
    }
    Ok(())
}
