//! Audit trail of vault mutations
//!
//! Each event becomes one JSON line in `<data dir>/vault/audit.log`,
//! tagged with the namespace the command ran in:
//!
//! ```text
//! {"timestamp":"...","namespace":"prod","event":"entry.set","key":"db-host","source":"manual"}
//! ```
//!
//! Entry values are never recorded.

use crate::config::{schema::Config, ConfigManager};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// A mutation made through the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum AuditEvent {
    #[serde(rename = "entry.set")]
    EntrySet { key: String, source: String },

    #[serde(rename = "entry.deleted")]
    EntryDeleted { key: String },

    #[serde(rename = "vault.refreshed")]
    Refreshed { providers: usize },
}

#[derive(Serialize)]
struct AuditRecord<'a> {
    timestamp: DateTime<Utc>,
    namespace: Option<&'a str>,
    #[serde(flatten)]
    event: &'a AuditEvent,
}

/// Appends [`AuditEvent`]s for one namespace. Disabled logs drop everything.
pub struct AuditLog {
    path: Option<PathBuf>,
    namespace: Option<String>,
}

impl AuditLog {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config
                .general
                .audit_log
                .then(ConfigManager::audit_log_path),
            namespace: config.vault.namespace.clone().filter(|ns| !ns.is_empty()),
        }
    }

    /// Record `event`. Failures are logged, never returned.
    pub async fn record(&self, event: AuditEvent) {
        let Some(path) = &self.path else {
            return;
        };

        let record = AuditRecord {
            timestamp: Utc::now(),
            namespace: self.namespace.as_deref(),
            event: &event,
        };

        let mut line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize audit event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = append(path, &line).await {
            warn!("Failed to write audit log {}: {}", path.display(), e);
        }
    }
}

async fn append(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}
