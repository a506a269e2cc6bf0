//! In-memory backend

use super::{Backend, Namespaced};
use crate::context::Context;
use crate::entry::Entry;
use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Slot = (String, String);

/// In-memory [`Backend`], safe for concurrent use.
///
/// Clones and namespaced views share the same map; entries are keyed by
/// `(namespace, key)` so scopes never see each other.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<RwLock<HashMap<Slot, Entry>>>,
    namespace: String,
}

impl MemoryBackend {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> Slot {
        (self.namespace.clone(), key.to_string())
    }
}

impl Namespaced for MemoryBackend {
    fn with_namespace(&self, namespace: &str) -> Arc<dyn Backend> {
        let namespace = if self.namespace.is_empty() {
            namespace.to_string()
        } else {
            format!("{}/{}", self.namespace, namespace)
        };
        Arc::new(Self {
            entries: Arc::clone(&self.entries),
            namespace,
        })
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, _ctx: &Context, key: &str) -> VaultResult<Entry> {
        let entries = self.entries.read().await;
        entries
            .get(&self.slot(key))
            .cloned()
            .ok_or(VaultError::NotFound)
    }

    async fn set(&self, _ctx: &Context, entry: &Entry) -> VaultResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(self.slot(&entry.key), entry.clone());
        Ok(())
    }

    async fn delete(&self, _ctx: &Context, key: &str) -> VaultResult<()> {
        let mut entries = self.entries.write().await;
        entries.remove(&self.slot(key));
        Ok(())
    }

    async fn list(&self, _ctx: &Context) -> VaultResult<Vec<Entry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|((ns, _), _)| *ns == self.namespace)
            .map(|(_, e)| e.clone())
            .collect())
    }

    fn as_namespaced(&self) -> Option<&dyn Namespaced> {
        Some(self)
    }
}
