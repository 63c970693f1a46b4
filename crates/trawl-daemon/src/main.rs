// crates/trawl-daemon/src/main.rs
//
// Binary entrypoint for the Trawl query coordinator.
//
// Initializes tracing, parses CLI arguments, loads configuration and
// identity, opens the statistics index, starts the HTTP API, then loads
// the membership snapshot and installs the service context.

mod config;
mod membership;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use config::DaemonConfig;
use membership::{run_refresh_loop, FileMetagraph, SnapshotLiveness};

use trawl_core::crypto::Keypair;
use trawl_core::identity::NodeIdentity;
use trawl_p2p::DendriteConnector;
use trawl_rpc::{ContextHandle, RpcConfig, ServiceContext, TrawlRpcServer};
use trawl_store::{SqliteStatsStore, StatsStoreOptions};

/// Trawl daemon: fans on-demand queries out to miners and serves index statistics.
#[derive(Parser, Debug)]
#[command(name = "trawl-daemon", version = "0.1.0", about = "Trawl query coordinator")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.trawl/config.toml")]
    config: String,

    /// Override the HTTP API port.
    #[arg(long)]
    rpc_port: Option<u16>,

    /// Override the metagraph snapshot path.
    #[arg(long)]
    metagraph: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration from TOML file, falling back to defaults if the file
    // is not found. Logged once tracing is up.
    let config_path = expand_tilde(&args.config);
    let loaded = DaemonConfig::load(&config_path);
    let mut daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", config_path),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    // CLI flags override the config file values.
    if let Some(port) = args.rpc_port {
        daemon_config.rpc_port = port;
    }
    if let Some(path) = args.metagraph {
        daemon_config.metagraph_path = path;
    }

    tracing::info!("Trawl Daemon v0.1.0");
    tracing::info!(
        "API endpoint: {}:{}",
        daemon_config.rpc_host,
        daemon_config.rpc_port
    );
    tracing::info!(
        "Query fan-out: {} from {:?} pool, {}s timeout",
        daemon_config.query.fanout,
        daemon_config.query.dispatch_pool,
        daemon_config.query.timeout_secs
    );

    // ---------------------------------------------------------------
    // Identity
    // ---------------------------------------------------------------
    let (identity, keypair) = load_node_identity(&daemon_config);
    if identity.is_placeholder() {
        tracing::warn!(
            "Running with placeholder identity; miner calls will be unsigned. \
             Write a hex hotkey secret to {}.",
            daemon_config.hotkey_path
        );
    } else {
        tracing::info!("Node DID: {}", identity.did);
    }

    // ---------------------------------------------------------------
    // Statistics index
    // ---------------------------------------------------------------
    let stats_path = expand_tilde(&daemon_config.stats_db_path);
    let stats = SqliteStatsStore::open(
        &stats_path,
        StatsStoreOptions {
            pool_size: daemon_config.stats_pool_size,
            serialize_reads: daemon_config.stats_serialize_reads,
        },
    )?;
    tracing::info!("Statistics index opened at {}", stats_path);

    // ---------------------------------------------------------------
    // HTTP API (answers 503 until the context is installed)
    // ---------------------------------------------------------------
    let handle = ContextHandle::new();
    let rpc_server = TrawlRpcServer::new(
        RpcConfig {
            host: daemon_config.rpc_host.clone(),
            port: daemon_config.rpc_port,
        },
        handle.clone(),
    );
    let server_task = tokio::spawn(async move { rpc_server.start().await });

    // ---------------------------------------------------------------
    // Membership and service context
    // ---------------------------------------------------------------
    let membership = Arc::new(FileMetagraph::new(expand_tilde(
        &daemon_config.metagraph_path,
    )));
    match membership.refresh().await {
        Ok(graph) => tracing::info!(
            "Metagraph loaded: block {}, {} nodes",
            graph.block,
            graph.nodes.len()
        ),
        Err(e) => tracing::warn!("Initial metagraph load failed: {}. Retrying on refresh.", e),
    }

    let liveness = SnapshotLiveness::new(
        membership.clone(),
        Duration::from_secs(daemon_config.health_stale_secs),
    );
    let query = daemon_config.query.to_query_config();
    let connector = DendriteConnector::new(keypair, query.timeout);

    handle.install(ServiceContext::new(
        daemon_config.self_uid,
        membership.clone(),
        Arc::new(liveness),
        Arc::new(stats),
        Arc::new(connector),
        query,
    ))?;
    tracing::info!("Service context installed; API ready");

    let refresh_secs = daemon_config.metagraph_refresh_secs;
    tokio::spawn(run_refresh_loop(membership, refresh_secs));

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("API server error: {}", e);
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::error!("API server task failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received");
        }
    }

    tracing::info!("Trawl daemon shut down gracefully");
    Ok(())
}

/// Load the coordinator identity from the hotkey secret file.
///
/// Returns a placeholder identity and no keypair if the file is missing
/// or does not hold a 32-byte hex secret.
fn load_node_identity(config: &DaemonConfig) -> (NodeIdentity, Option<Arc<Keypair>>) {
    let hotkey_path = expand_tilde(&config.hotkey_path);

    let keypair = match std::fs::read_to_string(&hotkey_path) {
        Ok(hex_str) => match Keypair::from_secret_hex(hex_str.trim()) {
            Ok(kp) => Some(kp),
            Err(e) => {
                tracing::warn!("Invalid hotkey secret at {}: {}", hotkey_path, e);
                None
            }
        },
        Err(_) => {
            tracing::debug!("Hotkey secret not found at {}", hotkey_path);
            None
        }
    };

    match keypair {
        Some(kp) => {
            let identity = NodeIdentity::from_keypair(config.self_uid, &kp);
            (identity, Some(Arc::new(kp)))
        }
        None => (NodeIdentity::placeholder(config.self_uid), None),
    }
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
