//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use verileaf_store_lmdb::DEFAULT_MAP_SIZE;
use verileaf_types::Identity;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a registry node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Missing keys take defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum size of the LMDB memory map, in bytes.
    #[serde(default = "default_map_size")]
    pub lmdb_map_size: usize,

    /// Address both servers bind to.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    #[serde(default)]
    pub enable_websocket: bool,

    #[serde(default = "default_ws_port")]
    pub websocket_port: u16,

    /// Largest accepted distance between a signed call's `issued_at` and the
    /// node clock.
    #[serde(default = "default_max_clock_skew")]
    pub max_clock_skew_secs: u64,

    /// Allow cross-origin requests from any origin.
    #[serde(default)]
    pub cors_allow_any: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter, e.g. "info" or "debug,verileaf_rpc=trace".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Serve Prometheus metrics at `/metrics`.
    #[serde(default = "default_true")]
    pub enable_metrics: bool,

    /// Identity that constructs the registry on first start. Ignored once
    /// the store holds a registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Identity>,

    /// Verifier at first construction; the owner when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_verifier: Option<Identity>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./verileaf_data")
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_true() -> bool {
    true
}

fn default_rpc_port() -> u16 {
    7077
}

fn default_ws_port() -> u16 {
    7078
}

fn default_max_clock_skew() -> u64 {
    300
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// The configured log format.
    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            lmdb_map_size: default_map_size(),
            bind_address: default_bind_address(),
            rpc_port: default_rpc_port(),
            enable_websocket: false,
            websocket_port: default_ws_port(),
            max_clock_skew_secs: default_max_clock_skew(),
            cors_allow_any: false,
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: default_true(),
            owner: None,
            initial_verifier: None,
        }
    }
}
