// crates/trawl-daemon/src/config.rs
//
// Runtime configuration for the Trawl daemon.
// Loaded from a TOML file or populated with sensible defaults.

use std::fs;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use trawl_p2p::DispatchPool;
use trawl_rpc::QueryConfig;

/// Why a configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Host address for the HTTP API.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port for the HTTP API.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// This coordinator's uid, never selected as a query target.
    #[serde(default)]
    pub self_uid: u16,

    /// Hex-encoded ed25519 secret used to sign outbound miner calls.
    #[serde(default = "default_hotkey_path")]
    pub hotkey_path: String,

    /// JSON membership snapshot, re-read every `metagraph_refresh_secs`.
    #[serde(default = "default_metagraph_path")]
    pub metagraph_path: String,

    #[serde(default = "default_metagraph_refresh_secs")]
    pub metagraph_refresh_secs: u64,

    /// `/health` reports unhealthy once the snapshot is older than this.
    #[serde(default = "default_health_stale_secs")]
    pub health_stale_secs: u64,

    /// SQLite statistics index.
    #[serde(default = "default_stats_db_path")]
    pub stats_db_path: String,

    #[serde(default = "default_stats_pool_size")]
    pub stats_pool_size: u32,

    /// Hold a process-wide lock around every statistics read.
    #[serde(default = "default_true")]
    pub stats_serialize_reads: bool,

    #[serde(default)]
    pub query: QuerySection,
}

/// The `[query]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct QuerySection {
    /// Miners each query is sent to.
    #[serde(default = "default_fanout")]
    pub fanout: usize,

    /// "qualified" (top half by trust) or "eligible" (every active miner).
    #[serde(default)]
    pub dispatch_pool: DispatchPool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_hotkey_path() -> String {
    "~/.trawl/keys/hotkey.secret".to_string()
}

fn default_metagraph_path() -> String {
    "~/.trawl/metagraph.json".to_string()
}

fn default_metagraph_refresh_secs() -> u64 {
    60
}

fn default_health_stale_secs() -> u64 {
    600
}

fn default_stats_db_path() -> String {
    "~/.trawl/stats.db".to_string()
}

fn default_stats_pool_size() -> u32 {
    4
}

fn default_true() -> bool {
    true
}

fn default_fanout() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_limit() -> u32 {
    1000
}

impl Default for QuerySection {
    fn default() -> Self {
        Self {
            fanout: default_fanout(),
            dispatch_pool: DispatchPool::default(),
            timeout_secs: default_timeout_secs(),
            max_limit: default_max_limit(),
        }
    }
}

impl QuerySection {
    /// Convert into the settings the query handler runs with.
    pub fn to_query_config(&self) -> QueryConfig {
        QueryConfig {
            fanout: self.fanout,
            dispatch_pool: self.dispatch_pool,
            timeout: Duration::from_secs(self.timeout_secs),
            max_limit: self.max_limit,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            log_level: default_log_level(),
            self_uid: 0,
            hotkey_path: default_hotkey_path(),
            metagraph_path: default_metagraph_path(),
            metagraph_refresh_secs: default_metagraph_refresh_secs(),
            health_stale_secs: default_health_stale_secs(),
            stats_db_path: default_stats_db_path(),
            stats_pool_size: default_stats_pool_size(),
            stats_serialize_reads: true,
            query: QuerySection::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text. Missing keys take their defaults.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        if config.query.fanout == 0 {
            return Err(ConfigError::Invalid("query.fanout must be at least 1".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = DaemonConfig::parse("").unwrap();
        assert_eq!(cfg.rpc_port, 8000);
        assert_eq!(cfg.metagraph_refresh_secs, 60);
        assert_eq!(cfg.health_stale_secs, 600);
        assert_eq!(cfg.stats_pool_size, 4);
        assert!(cfg.stats_serialize_reads);
        assert_eq!(cfg.query.fanout, 1);
        assert_eq!(cfg.query.dispatch_pool, DispatchPool::Qualified);
        assert_eq!(cfg.query.timeout_secs, 30);
        assert_eq!(cfg.query.max_limit, 1000);
    }

    #[test]
    fn partial_file_overrides() {
        let cfg = DaemonConfig::parse(
            r#"
            rpc_port = 9100
            self_uid = 12
            stats_serialize_reads = false

            [query]
            fanout = 3
            dispatch_pool = "eligible"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.rpc_port, 9100);
        assert_eq!(cfg.self_uid, 12);
        assert!(!cfg.stats_serialize_reads);
        assert_eq!(cfg.query.fanout, 3);
        assert_eq!(cfg.query.dispatch_pool, DispatchPool::Eligible);
        assert_eq!(cfg.query.timeout_secs, 30);

        let query = cfg.query.to_query_config();
        assert_eq!(query.timeout, Duration::from_secs(30));
        assert_eq!(query.fanout, 3);
    }

    #[test]
    fn unknown_pool_is_rejected() {
        let err = DaemonConfig::parse("[query]\ndispatch_pool = \"everyone\"\n");
        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn zero_fanout_is_rejected() {
        let err = DaemonConfig::parse("[query]\nfanout = 0\n");
        assert!(matches!(err, Err(ConfigError::Invalid(_))));

        let cfg = DaemonConfig::parse("[query]\nfanout = 1\n").unwrap();
        assert_eq!(cfg.query.to_query_config().fanout, 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DaemonConfig::load("/definitely/not/here/trawl.toml");
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }
}
