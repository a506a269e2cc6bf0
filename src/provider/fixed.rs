//! Provider serving a fixed set of values

use super::Provider;
use crate::context::Context;
use crate::entry::Entry;
use crate::error::VaultResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// [`Provider`] that always returns the same entries
#[derive(Debug, Clone)]
pub struct StaticProvider {
    name: String,
    entries: BTreeMap<String, String>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>, entries: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }
}

#[async_trait]
impl Provider for StaticProvider {
    async fn fetch(&self, _ctx: &Context) -> VaultResult<Vec<Entry>> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| Entry::new(k, v).with_source(&self.name))
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
