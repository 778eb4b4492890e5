//! Node configuration with TOML file support.

use crate::NodeError;
use rai_types::Network;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a rai node.
///
/// Loaded from a TOML file via [`NodeConfig::from_toml_file`] or built
/// programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Which network variant to join.
    #[serde(default = "default_network")]
    pub network: Network,

    /// Data directory for the ledger store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// UDP/TCP peering port. Zero lets the OS pick (tests).
    #[serde(default)]
    pub port: Option<u16>,

    /// Peers contacted on startup for keepalive and initial sync.
    #[serde(default)]
    pub preconfigured_peers: Vec<String>,

    /// Private key (hex) of the representative this node votes as.
    ///
    /// Absent on non-representative nodes; they forward vote traffic but
    /// never originate it.
    #[serde(default)]
    pub representative_key: Option<String>,

    /// Upper clamp on parallel bulk-pull connections.
    #[serde(default = "default_bootstrap_connections_max")]
    pub bootstrap_connections_max: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> Network {
    Network::Live
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./rai_data")
}

fn default_bootstrap_connections_max() -> usize {
    16
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
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// The effective peering port.
    pub fn peering_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.network.default_port())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            data_dir: default_data_dir(),
            port: None,
            preconfigured_peers: Vec::new(),
            representative_key: None,
            bootstrap_connections_max: default_bootstrap_connections_max(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
