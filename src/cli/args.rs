//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Vault - pluggable configuration and secret store
///
/// Resolves entries from external providers and caches them locally,
/// refreshing when they go stale.
#[derive(Parser, Debug)]
#[command(name = "vault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "VAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Namespace to operate in (overrides config)
    #[arg(short, long, global = true, env = "VAULT_NAMESPACE")]
    pub namespace: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve an entry, refreshing from providers if needed
    Get(GetArgs),

    /// Store an entry directly
    Set(SetArgs),

    /// Remove an entry
    Delete(DeleteArgs),

    /// List stored entries
    List(ListArgs),

    /// Fetch from all providers now
    Refresh,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Entry key
    pub key: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Arguments for the set command
#[derive(Parser, Debug)]
pub struct SetArgs {
    /// Entry key
    pub key: String,

    /// Entry value
    pub value: String,

    /// Provenance label (defaults to "manual")
    #[arg(short, long)]
    pub source: Option<String>,
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Entry key
    pub key: String,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format for commands that print entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (values for get, keys for list)
    Plain,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
