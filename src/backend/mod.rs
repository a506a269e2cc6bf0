//! Local persistence backends
//!
//! A [`Backend`] stores entries locally (read-write). Backends that can
//! hand out isolated views of themselves also expose [`Namespaced`]
//! through [`Backend::as_namespaced`]:
//! - [`MemoryBackend`]: process-local map, the default
//! - [`FileBackend`]: one JSON file per entry on disk
//! - [`KeychainBackend`]: the OS credential store

pub mod file;
pub mod keychain;
pub mod memory;

pub use file::FileBackend;
pub use keychain::KeychainBackend;
pub use memory::MemoryBackend;

use crate::context::Context;
use crate::entry::Entry;
use crate::error::VaultResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Read-write local persistence for entries
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch an entry, or `VaultError::NotFound`
    async fn get(&self, ctx: &Context, key: &str) -> VaultResult<Entry>;

    /// Insert or overwrite the entry with the same key
    async fn set(&self, ctx: &Context, entry: &Entry) -> VaultResult<()>;

    /// Remove an entry. Removing a missing key succeeds.
    async fn delete(&self, ctx: &Context, key: &str) -> VaultResult<()>;

    /// All entries visible in this scope, in no particular order
    async fn list(&self, ctx: &Context) -> VaultResult<Vec<Entry>>;

    /// Namespace support, if this backend has it
    fn as_namespaced(&self) -> Option<&dyn Namespaced> {
        None
    }
}

/// Optional capability: isolated views over the same storage
pub trait Namespaced {
    /// A handle scoped to `namespace`, sharing storage with `self`.
    /// Scoping an already scoped handle nests the namespaces.
    fn with_namespace(&self, namespace: &str) -> Arc<dyn Backend>;
}

/// Scope `backend` to `namespace` if it supports namespaces.
///
/// Backends without the capability, and empty namespace names, yield the
/// backend unchanged.
pub fn scoped(backend: Arc<dyn Backend>, namespace: Option<&str>) -> Arc<dyn Backend> {
    let Some(ns) = namespace.filter(|ns| !ns.is_empty()) else {
        return backend;
    };

    let scoped = backend.as_namespaced().map(|n| n.with_namespace(ns));
    match scoped {
        Some(scoped) => scoped,
        None => {
            tracing::debug!("Backend has no namespace support, ignoring namespace {}", ns);
            backend
        }
    }
}
