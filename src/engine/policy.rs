//! Freshness classification and the auto-refresh throttle gate

use crate::entry::Entry;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Read-time state of a stored entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// TTL-driven staleness and refresh throttling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    ttl: TimeDelta,
}

impl RefreshPolicy {
    /// A zero TTL disables expiry
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn expires(&self) -> bool {
        self.ttl > TimeDelta::zero()
    }

    /// Fresh iff expiry is off or the entry is no older than the TTL.
    /// Unstamped entries count as infinitely old.
    pub fn classify(&self, entry: &Entry, now: DateTime<Utc>) -> Freshness {
        if !self.expires() {
            return Freshness::Fresh;
        }
        match entry.age(now) {
            Some(age) if age <= self.ttl => Freshness::Fresh,
            _ => Freshness::Stale,
        }
    }

    /// Whether a `get` that missed may trigger a refresh.
    ///
    /// Without a TTL the vault refreshes at most once per lifetime; with a
    /// TTL, at most once per TTL period.
    pub fn should_auto_refresh(
        &self,
        has_providers: bool,
        last_refresh: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        if !has_providers {
            return false;
        }

        let Some(last) = last_refresh else {
            return true;
        };

        self.expires() && now - last > self.ttl
    }
}
