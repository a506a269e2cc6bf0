//! External value providers
//!
//! A [`Provider`] fetches entries from somewhere outside the vault. Providers
//! are read-only: the engine decides where fetched entries are stored.

pub mod command;
pub mod fixed;

pub use command::CommandProvider;
pub use fixed::StaticProvider;

use crate::context::Context;
use crate::entry::Entry;
use crate::error::VaultResult;
use async_trait::async_trait;
use std::future::Future;

/// Read-only source of entries
#[async_trait]
pub trait Provider: Send + Sync {
    /// Fetch every entry this provider currently offers
    async fn fetch(&self, ctx: &Context) -> VaultResult<Vec<Entry>>;

    /// Label used in logs and error messages
    fn name(&self) -> &str {
        "provider"
    }
}

/// Adapts a plain async function into a [`Provider`]
pub struct ProviderFn<F> {
    name: String,
    f: F,
}

/// Wrap `f` as a [`Provider`]
///
/// ```rust,ignore
/// let defaults = vault::provider_fn(|_ctx| async {
///     Ok(vec![vault::Entry::new("region", "eu-west-1")])
/// });
/// ```
pub fn provider_fn<F, Fut>(f: F) -> ProviderFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = VaultResult<Vec<Entry>>> + Send + 'static,
{
    ProviderFn {
        name: "fn".to_string(),
        f,
    }
}

impl<F> ProviderFn<F> {
    /// Set the label reported by [`Provider::name`]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl<F, Fut> Provider for ProviderFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = VaultResult<Vec<Entry>>> + Send + 'static,
{
    async fn fetch(&self, ctx: &Context) -> VaultResult<Vec<Entry>> {
        (self.f)(ctx.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
