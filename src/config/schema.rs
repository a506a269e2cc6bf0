//! Configuration schema for Vault
//!
//! Configuration is stored at `~/.config/vault/config.toml`

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Resolution settings
    pub vault: VaultConfig,

    /// Local store settings
    pub backend: BackendConfig,

    /// External providers, consulted in order
    pub providers: Vec<ProviderConfig>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Resolution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Namespace to scope all entries to
    pub namespace: Option<String>,

    /// Entry time-to-live in seconds (0 = never expire)
    pub ttl_secs: u64,
}

impl VaultConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Backend kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// JSON files on disk
    #[default]
    File,
    /// Process memory (lost on exit)
    Memory,
    /// OS keychain
    Keychain,
}

/// Local store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,

    /// Entries directory for the file backend (default: data dir)
    pub path: Option<PathBuf>,

    /// Keyring service for the keychain backend (default: "vault")
    pub service: Option<String>,
}

/// External provider definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Run a command that prints entries as JSON
    Command {
        name: String,
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
        #[serde(default)]
        workdir: Option<PathBuf>,
    },

    /// Fixed values
    Static {
        name: String,
        #[serde(default)]
        entries: BTreeMap<String, String>,
    },
}

impl ProviderConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Command { name, .. } | Self::Static { name, .. } => name,
        }
    }
}
