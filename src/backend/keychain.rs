//! OS keychain backend
//!
//! Each entry is a JSON secret in a keyring service (`"vault"` by default)
//! under the entry key as account name. Keychains cannot be enumerated
//! portably, so every service also keeps the JSON list of its keys under
//! [`INDEX_KEY`].
//!
//! Namespaces map to services: namespace `prod` of service `vault` is the
//! service `vault/prod`.

use super::{Backend, Namespaced};
use crate::context::Context;
use crate::entry::Entry;
use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Service name used when none is configured
pub const DEFAULT_SERVICE: &str = "vault";

/// Reserved account holding a service's key index
pub const INDEX_KEY: &str = "__vault_index__";

/// [`Backend`] storing entries in the platform credential store
/// (Keychain, Secret Service/keyutils, Credential Manager).
#[derive(Clone)]
pub struct KeychainBackend {
    service: String,
    shared: Arc<Shared>,
}

/// State shared by a backend and all its namespaced views
#[derive(Default)]
struct Shared {
    // Handles are reused so every call for an account goes through one credential.
    handles: Mutex<HashMap<(String, String), Arc<keyring::Entry>>>,
    // Serializes read-modify-write of the key indexes.
    index: Mutex<()>,
}

impl KeychainBackend {
    pub fn new() -> Self {
        Self::with_service(DEFAULT_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            shared: Arc::default(),
        }
    }

    /// Keyring service this scope stores into
    pub fn service(&self) -> &str {
        &self.service
    }

    fn namespaced(&self, namespace: &str) -> Self {
        Self {
            service: format!("{}/{}", self.service, namespace),
            shared: Arc::clone(&self.shared),
        }
    }

    fn handle(&self, account: &str) -> keyring::Result<Arc<keyring::Entry>> {
        let mut handles = self
            .shared
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let slot = (self.service.clone(), account.to_string());
        if let Some(handle) = handles.get(&slot) {
            return Ok(Arc::clone(handle));
        }

        let handle = Arc::new(keyring::Entry::new(&self.service, account)?);
        handles.insert(slot, Arc::clone(&handle));
        Ok(handle)
    }

    fn read_secret(&self, account: &str) -> keyring::Result<Option<String>> {
        match self.handle(account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn load(&self, key: &str) -> VaultResult<Entry> {
        let secret = self
            .read_secret(key)
            .map_err(|e| VaultError::keychain("get", key, e))?
            .ok_or(VaultError::NotFound)?;
        Ok(serde_json::from_str(&secret)?)
    }

    fn store(&self, entry: &Entry) -> VaultResult<()> {
        if entry.key == INDEX_KEY {
            return Err(VaultError::User(format!("{} is a reserved key", INDEX_KEY)));
        }

        let secret = serde_json::to_string(entry)?;
        self.handle(&entry.key)
            .and_then(|h| h.set_password(&secret))
            .map_err(|e| VaultError::keychain("set", &entry.key, e))?;

        self.update_index(&entry.key, |keys| {
            if !keys.iter().any(|k| *k == entry.key) {
                keys.push(entry.key.clone());
            }
        })
    }

    fn remove(&self, key: &str) -> VaultResult<()> {
        match self.handle(key).and_then(|h| h.delete_credential()) {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => return Err(VaultError::keychain("delete", key, e)),
        }

        self.update_index(key, |keys| keys.retain(|k| k != key))
    }

    fn load_all(&self) -> VaultResult<Vec<Entry>> {
        let keys = self
            .read_index()
            .map_err(|e| VaultError::keychain("index read", INDEX_KEY, e))?;

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            match self.load(&key) {
                Ok(entry) => entries.push(entry),
                Err(VaultError::NotFound) => {
                    debug!("Skipping {} in {}: listed but not stored", key, self.service)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(entries)
    }

    fn read_index(&self) -> keyring::Result<Vec<String>> {
        let Some(raw) = self.read_secret(INDEX_KEY)? else {
            return Ok(vec![]);
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring unreadable key index of {}: {}", self.service, e);
            vec![]
        }))
    }

    fn update_index(&self, key: &str, change: impl FnOnce(&mut Vec<String>)) -> VaultResult<()> {
        let _guard = self
            .shared
            .index
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut keys = self
            .read_index()
            .map_err(|e| VaultError::keychain("index read", key, e))?;
        change(&mut keys);

        let raw = serde_json::to_string(&keys)?;
        self.handle(INDEX_KEY)
            .and_then(|h| h.set_password(&raw))
            .map_err(|e| VaultError::keychain("index write", key, e))
    }

    /// Run a keychain call on the blocking pool, bounded by `ctx`
    async fn blocking<T, F>(&self, ctx: &Context, op: &str, call: F) -> VaultResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&KeychainBackend) -> VaultResult<T> + Send + 'static,
    {
        ctx.check(op)?;

        let this = self.clone();
        let task = tokio::task::spawn_blocking(move || call(&this));
        ctx.run(op, async move {
            task.await
                .map_err(|e| VaultError::Internal(format!("keychain call failed: {}", e)))?
        })
        .await
    }
}

impl Default for KeychainBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeychainBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeychainBackend")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl Namespaced for KeychainBackend {
    fn with_namespace(&self, namespace: &str) -> Arc<dyn Backend> {
        Arc::new(self.namespaced(namespace))
    }
}

#[async_trait]
impl Backend for KeychainBackend {
    async fn get(&self, ctx: &Context, key: &str) -> VaultResult<Entry> {
        let key = key.to_string();
        self.blocking(ctx, "keychain get", move |kc| kc.load(&key))
            .await
    }

    async fn set(&self, ctx: &Context, entry: &Entry) -> VaultResult<()> {
        let entry = entry.clone();
        self.blocking(ctx, "keychain set", move |kc| kc.store(&entry))
            .await
    }

    async fn delete(&self, ctx: &Context, key: &str) -> VaultResult<()> {
        let key = key.to_string();
        self.blocking(ctx, "keychain delete", move |kc| kc.remove(&key))
            .await
    }

    async fn list(&self, ctx: &Context) -> VaultResult<Vec<Entry>> {
        self.blocking(ctx, "keychain list", |kc| kc.load_all()).await
    }

    fn as_namespaced(&self) -> Option<&dyn Namespaced> {
        Some(self)
    }
}
