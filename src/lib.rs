//! Vault - pluggable configuration and secret store
//!
//! Decouples where values come from ([`Provider`], read-only) from where
//! they live locally ([`Backend`], read-write). A [`Vault`] caches provider
//! output in its backend and refreshes it when entries go stale.

pub mod audit;
pub mod backend;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod entry;
pub mod error;
pub mod factory;
pub mod provider;
pub mod ui;

pub use backend::{Backend, FileBackend, KeychainBackend, MemoryBackend, Namespaced};
pub use context::Context;
pub use engine::{Clock, ManualClock, SystemClock, Vault, VaultBuilder};
pub use entry::{Entry, MANUAL_SOURCE};
pub use error::{VaultError, VaultResult};
pub use provider::{provider_fn, CommandProvider, Provider, ProviderFn, StaticProvider};
