//! The unit of data moved between backends, providers and the engine

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Provenance label for entries written directly rather than fetched
pub const MANUAL_SOURCE: &str = "manual";

/// A configuration or secret value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Identifier, unique within a namespace
    pub key: String,

    /// Opaque payload
    pub value: String,

    /// Freshness baseline. `None` until the engine stamps it.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Where the value came from (provider name, or "manual")
    #[serde(default)]
    pub source: String,
}

impl Entry {
    /// Create an entry with no timestamp and no source
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            created_at: None,
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Age relative to `now`, or `None` if the entry was never stamped
    pub fn age(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.created_at.map(|created| now - created)
    }
}
