//! Configuration types for HEALCHAIN

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::HealchainError;
use crate::traits::HealchainResult;
use crate::types::{Amount, Role};

/// Main node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node name for logging
    pub name: String,

    /// Data directory
    pub data_dir: PathBuf,

    /// Logging level, overridden by RUST_LOG
    pub log_level: String,

    /// Log output format: "pretty" or "json"
    pub log_format: String,

    /// Storage configuration
    pub storage: StorageConfig,

    /// API configuration
    pub api: ApiConfig,

    /// Ledger rules
    pub ledger: LedgerConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "healchain-node".to_string(),
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            storage: StorageConfig::default(),
            api: ApiConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn from_json(json: &str) -> HealchainResult<Self> {
        serde_json::from_str(json).map_err(|e| HealchainError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> HealchainResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HealchainError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Directory holding the sled database
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.path)
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Sled,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Database directory, relative to the data directory
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sled,
            path: PathBuf::from("state"),
        }
    }
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API listen address
    pub listen_addr: String,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            enable_cors: true,
        }
    }
}

/// Fund module rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Balance granted to a newly registered user
    pub initial_balance: Amount,

    /// Role assigned at registration
    pub default_role: Role,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_balance: Amount::new(1000),
            default_role: Role::User,
        }
    }
}
