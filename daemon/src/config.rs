//! Daemon configuration with TOML file support.
//!
//! One file describes a deployment: the threshold parameters, the ordered
//! server roster, and the client key. Servers and the client read the same
//! file and add their own key file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use prand_protocol::{MalformedDealPolicy, RevealPolicy, SessionConfig};
use prand_types::{PrandError, PublicKey, Roster, ThresholdParams};
use prand_utils::LogFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("invalid configuration: {0}")]
    Parse(String),

    #[error("invalid key in {field}: {source}")]
    Key {
        field: String,
        #[source]
        source: PrandError,
    },

    #[error("client_public_key is not set")]
    MissingClientKey,

    #[error("public key {0} is not in the server roster")]
    NotInRoster(String),

    #[error(transparent)]
    Roster(#[from] PrandError),
}

/// One roster entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    /// Hex-encoded Ed25519 public key.
    pub public_key: String,
    /// `host:port` the server listens on.
    pub address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Hex-encoded public key of the client servers accept sessions from.
    #[serde(default)]
    pub client_public_key: Option<String>,

    /// Address the server listens on.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// File holding this party's hex-encoded private key.
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,

    #[serde(default)]
    pub malformed_deal_policy: MalformedDealPolicy,

    #[serde(default)]
    pub reveal_policy: RevealPolicy,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-message read timeout on both sides of a connection.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub threshold: ThresholdParams,

    /// Ordered roster; position in this list is the server index.
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen() -> String {
    "0.0.0.0:7100".to_string()
}

fn default_key_file() -> PathBuf {
    PathBuf::from("./prand.key")
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse the roster and check the threshold parameters against it.
    pub fn roster(&self) -> Result<Roster, ConfigError> {
        let keys = self
            .servers
            .iter()
            .enumerate()
            .map(|(i, s)| {
                PublicKey::from_hex(&s.public_key).map_err(|source| ConfigError::Key {
                    field: format!("servers[{i}].public_key"),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let roster = Roster::new(keys)?;
        self.threshold.validate(roster.len())?;
        Ok(roster)
    }

    pub fn addresses(&self) -> Vec<String> {
        self.servers.iter().map(|s| s.address.clone()).collect()
    }

    pub fn client_key(&self) -> Result<PublicKey, ConfigError> {
        let hex = self
            .client_public_key
            .as_deref()
            .ok_or(ConfigError::MissingClientKey)?;
        PublicKey::from_hex(hex).map_err(|source| ConfigError::Key {
            field: "client_public_key".into(),
            source,
        })
    }

    /// Roster position of `key`.
    pub fn server_index(&self, key: &PublicKey) -> Result<usize, ConfigError> {
        self.roster()?
            .position_of(key)
            .ok_or_else(|| ConfigError::NotInRoster(key.to_hex()))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            params: self.threshold,
            malformed_deal_policy: self.malformed_deal_policy,
            reveal_policy: self.reveal_policy,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdParams::default(),
            servers: Vec::new(),
            client_public_key: None,
            listen: default_listen(),
            key_file: default_key_file(),
            malformed_deal_policy: MalformedDealPolicy::default(),
            reveal_policy: RevealPolicy::default(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
