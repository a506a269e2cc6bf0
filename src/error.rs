//! Error types for Vault
//!
//! All modules use `VaultResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Vault operations
pub type VaultResult<T> = Result<T, VaultError>;

/// All errors that can occur in Vault
#[derive(Error, Debug)]
pub enum VaultError {
    // Resolution errors
    #[error("vault: not found")]
    NotFound,

    #[error("vault: {op}{}: {source}", key_suffix(.key))]
    Backend {
        op: &'static str,
        key: Option<String>,
        #[source]
        source: Box<VaultError>,
    },

    #[error("vault: refresh: provider {provider}: {source}")]
    Provider {
        provider: String,
        #[source]
        source: Box<VaultError>,
    },

    #[error("vault: refresh: set {key:?}: {source}")]
    RefreshWrite {
        key: String,
        #[source]
        source: Box<VaultError>,
    },

    #[error("keychain: {op} {key:?}: {source}")]
    Keychain {
        op: &'static str,
        key: String,
        #[source]
        source: keyring::Error,
    },

    // Cancellation errors
    #[error("Operation cancelled: {op}")]
    Cancelled { op: String },

    #[error("Deadline exceeded: {op}")]
    DeadlineExceeded { op: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Provider errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    #[error("Unexpected output from {provider}: {reason}")]
    ProviderOutput { provider: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

fn key_suffix(key: &Option<String>) -> String {
    key.as_ref()
        .map(|k| format!(" {:?}", k))
        .unwrap_or_default()
}

impl VaultError {
    /// Wrap a backend failure with the operation and key it happened on
    pub fn backend(op: &'static str, key: Option<&str>, source: VaultError) -> Self {
        Self::Backend {
            op,
            key: key.map(str::to_string),
            source: Box::new(source),
        }
    }

    /// Wrap an OS keychain failure with the operation and key
    pub fn keychain(op: &'static str, key: impl Into<String>, source: keyring::Error) -> Self {
        Self::Keychain {
            op,
            key: key.into(),
            source,
        }
    }

    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether this is the not-found sentinel
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Whether this error, or any error it wraps, came from cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled { .. } | Self::DeadlineExceeded { .. } => true,
            Self::Backend { source, .. }
            | Self::Provider { source, .. }
            | Self::RefreshWrite { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid { .. } => Some("Run: vault config show"),
            Self::Provider { .. } => Some("Check the provider configuration, then run: vault refresh"),
            Self::CommandFailed { .. } => Some("Make sure the provider command is installed and on PATH"),
            Self::Keychain { .. } => Some("Check that the OS keychain is unlocked and reachable"),
            _ => None,
        }
    }
}
