//! Resolution engine
//!
//! [`Vault`] resolves entries from external [`Provider`]s and caches them in
//! a local [`Backend`].
//!
//! # Resolution flow
//!
//! When [`Vault::get`] is called:
//!
//!  1. Look the key up in the backend
//!  2. If found and fresh, return it
//!  3. If missing or stale, refresh from all providers (throttled, see
//!     [`RefreshPolicy::should_auto_refresh`])
//!  4. Look the key up again
//!
//! Stale entries are never served: a miss that may not refresh is reported
//! as [`VaultError::NotFound`]. [`Vault::refresh`] bypasses the throttle.
//!
//! # Example
//!
//! ```rust,ignore
//! let vault = Vault::builder()
//!     .backend(FileBackend::new("/var/lib/app/vault"))
//!     .provider(CommandProvider::new("ssm", "aws").args(["ssm", "..."]))
//!     .namespace("prod")
//!     .ttl(Duration::from_secs(7 * 24 * 3600))
//!     .build();
//!
//! let entry = vault.get(&Context::background(), "db-password").await?;
//! ```

pub mod clock;
pub mod policy;

pub use clock::{Clock, ManualClock, SystemClock};
pub use policy::{Freshness, RefreshPolicy};

use crate::backend::{self, Backend, MemoryBackend};
use crate::context::Context;
use crate::entry::{Entry, MANUAL_SOURCE};
use crate::error::{VaultError, VaultResult};
use crate::provider::Provider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configures a [`Vault`]
#[derive(Default)]
pub struct VaultBuilder {
    backend: Option<Arc<dyn Backend>>,
    providers: Vec<Arc<dyn Provider>>,
    namespace: Option<String>,
    ttl: Duration,
    clock: Option<Arc<dyn Clock>>,
}

impl VaultBuilder {
    /// Local store. Defaults to a fresh [`MemoryBackend`].
    pub fn backend<B: Backend + 'static>(self, backend: B) -> Self {
        self.shared_backend(Arc::new(backend))
    }

    /// Local store already behind an `Arc`
    pub fn shared_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Add a provider. Providers are consulted in the order they are added.
    pub fn provider<P: Provider + 'static>(self, provider: P) -> Self {
        self.shared_provider(Arc::new(provider))
    }

    pub fn shared_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Scope all operations to a namespace. Ignored when the backend has no
    /// namespace support.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Maximum entry age. Zero (the default) means entries never expire.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Vault {
        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(MemoryBackend::new()));

        Vault {
            backend: backend::scoped(backend, self.namespace.as_deref()),
            providers: self.providers,
            policy: RefreshPolicy::new(self.ttl),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            last_refresh: Mutex::new(None),
        }
    }
}

/// Backend + providers under a freshness policy
pub struct Vault {
    backend: Arc<dyn Backend>,
    providers: Vec<Arc<dyn Provider>>,
    policy: RefreshPolicy,
    clock: Arc<dyn Clock>,
    last_refresh: Mutex<Option<DateTime<Utc>>>,
}

impl Vault {
    pub fn builder() -> VaultBuilder {
        VaultBuilder::default()
    }

    /// In-memory vault with no providers and no TTL
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Start time of the last fully successful refresh
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve an entry, refreshing from providers if it is missing or stale
    pub async fn get(&self, ctx: &Context, key: &str) -> VaultResult<Entry> {
        match self.backend.get(ctx, key).await {
            Ok(entry) => match self.policy.classify(&entry, self.clock.now()) {
                Freshness::Fresh => {
                    debug!("Cache hit for {}", key);
                    return Ok(entry);
                }
                Freshness::Stale => debug!("Cached entry {} is stale", key),
            },
            Err(VaultError::NotFound) => debug!("Cache miss for {}", key),
            Err(e) => return Err(VaultError::backend("get", Some(key), e)),
        }

        if !self.should_auto_refresh() {
            debug!("Refresh throttled, {} unavailable", key);
            return Err(VaultError::NotFound);
        }

        self.refresh(ctx).await?;

        match self.backend.get(ctx, key).await {
            Ok(entry) => Ok(entry),
            Err(VaultError::NotFound) => Err(VaultError::NotFound),
            Err(e) => Err(VaultError::backend("get", Some(key), e)),
        }
    }

    /// Store an entry directly, stamping `created_at` and `source` if unset
    pub async fn set(&self, ctx: &Context, mut entry: Entry) -> VaultResult<()> {
        if entry.created_at.is_none() {
            entry.created_at = Some(self.clock.now());
        }
        if entry.source.is_empty() {
            entry.source = MANUAL_SOURCE.to_string();
        }

        self.backend
            .set(ctx, &entry)
            .await
            .map_err(|e| VaultError::backend("set", Some(&entry.key), e))
    }

    pub async fn delete(&self, ctx: &Context, key: &str) -> VaultResult<()> {
        self.backend
            .delete(ctx, key)
            .await
            .map_err(|e| VaultError::backend("delete", Some(key), e))
    }

    /// Everything currently stored, fresh or stale
    pub async fn list(&self, ctx: &Context) -> VaultResult<Vec<Entry>> {
        self.backend
            .list(ctx)
            .await
            .map_err(|e| VaultError::backend("list", None, e))
    }

    /// Fetch from every provider in order and store the results.
    ///
    /// Aborts on the first failure. Entries already written stay written,
    /// but the refresh does not count towards throttling.
    pub async fn refresh(&self, ctx: &Context) -> VaultResult<()> {
        let started = self.clock.now();
        let mut written = 0usize;

        for provider in &self.providers {
            let entries = provider.fetch(ctx).await.map_err(|e| {
                warn!("Refresh aborted: provider {} failed: {}", provider.name(), e);
                VaultError::Provider {
                    provider: provider.name().to_string(),
                    source: Box::new(e),
                }
            })?;

            for mut entry in entries {
                entry.created_at = Some(started);
                if let Err(e) = self.backend.set(ctx, &entry).await {
                    warn!("Refresh aborted: storing {} failed: {}", entry.key, e);
                    return Err(VaultError::RefreshWrite {
                        key: entry.key,
                        source: Box::new(e),
                    });
                }
                written += 1;
            }
        }

        *self.last_refresh.lock().unwrap_or_else(PoisonError::into_inner) = Some(started);

        info!(
            "Refreshed {} entries from {} providers",
            written,
            self.providers.len()
        );
        Ok(())
    }

    fn should_auto_refresh(&self) -> bool {
        let last = self.last_refresh();
        self.policy
            .should_auto_refresh(!self.providers.is_empty(), last, self.clock.now())
    }
}

impl Default for Vault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for Vault {
    async fn get(&self, ctx: &Context, key: &str) -> VaultResult<Entry> {
        Vault::get(self, ctx, key).await
    }

    async fn set(&self, ctx: &Context, entry: &Entry) -> VaultResult<()> {
        Vault::set(self, ctx, entry.clone()).await
    }

    async fn delete(&self, ctx: &Context, key: &str) -> VaultResult<()> {
        Vault::delete(self, ctx, key).await
    }

    async fn list(&self, ctx: &Context) -> VaultResult<Vec<Entry>> {
        Vault::list(self, ctx).await
    }
}
