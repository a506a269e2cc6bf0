//! Builds backends, providers and vaults from configuration

use crate::backend::keychain::DEFAULT_SERVICE;
use crate::backend::{Backend, FileBackend, KeychainBackend, MemoryBackend};
use crate::config::schema::{BackendConfig, BackendKind, ProviderConfig};
use crate::config::{Config, ConfigManager};
use crate::engine::Vault;
use crate::provider::{CommandProvider, Provider, StaticProvider};
use std::sync::Arc;
use tracing::debug;

/// Create the configured local store
pub fn create_backend(config: &BackendConfig) -> Arc<dyn Backend> {
    match config.kind {
        BackendKind::Memory => Arc::new(MemoryBackend::new()),
        BackendKind::File => {
            let dir = config
                .path
                .clone()
                .unwrap_or_else(ConfigManager::entries_dir);
            debug!("Using file backend at {}", dir.display());
            Arc::new(FileBackend::new(dir))
        }
        BackendKind::Keychain => {
            let service = config.service.as_deref().unwrap_or(DEFAULT_SERVICE);
            debug!("Using keychain backend with service {}", service);
            Arc::new(KeychainBackend::with_service(service))
        }
    }
}

/// Create a provider from its definition
pub fn create_provider(config: &ProviderConfig) -> Arc<dyn Provider> {
    match config {
        ProviderConfig::Command {
            name,
            command,
            args,
            env,
            workdir,
        } => {
            let mut provider = CommandProvider::new(name, command).args(args.iter().cloned());
            for (key, value) in env {
                provider = provider.env(key, value);
            }
            if let Some(dir) = workdir {
                provider = provider.workdir(dir);
            }
            Arc::new(provider)
        }
        ProviderConfig::Static { name, entries } => {
            Arc::new(StaticProvider::new(name, entries.clone()))
        }
    }
}

/// Create a vault wired the way `config` describes
pub fn create_vault(config: &Config) -> Vault {
    let mut builder = Vault::builder()
        .shared_backend(create_backend(&config.backend))
        .ttl(config.vault.ttl());

    if let Some(namespace) = &config.vault.namespace {
        builder = builder.namespace(namespace);
    }

    for provider in &config.providers {
        builder = builder.shared_provider(create_provider(provider));
    }

    builder.build()
}
