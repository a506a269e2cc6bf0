//! File backend: one JSON document per entry
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<sha256(key)>.json
//! <root>/ns/<sha256(namespace)>/<sha256(key)>.json
//! ```
//!
//! Keys are opaque strings, so file names are derived from their hash and
//! the key itself lives inside the document.

use super::{Backend, Namespaced};
use crate::context::Context;
use crate::entry::Entry;
use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

const NAMESPACE_DIR: &str = "ns";

/// [`Backend`] that persists entries as JSON files
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
    dir: PathBuf,
}

impl FileBackend {
    /// Store entries under `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            root: dir.clone(),
            dir,
        }
    }

    /// Directory holding this scope's entries
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", digest(key)))
    }

    async fn ensure_dir(&self) -> VaultResult<()> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            VaultError::io(format!("creating entries directory {}", self.dir.display()), e)
        })?;

        // Every level from the root down to this scope is private
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            for dir in self.dir.ancestors().take_while(|d| d.starts_with(&self.root)) {
                fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
                    .await
                    .map_err(|e| {
                        VaultError::io(format!("setting permissions on {}", dir.display()), e)
                    })?;
            }
        }

        Ok(())
    }

    async fn read_entry(path: &Path) -> VaultResult<Option<Entry>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(VaultError::io(
                    format!("reading entry file {}", path.display()),
                    e,
                ))
            }
        };

        let entry: Entry = serde_json::from_str(&content)?;
        Ok(Some(entry))
    }

    async fn write_entry(&self, entry: &Entry) -> VaultResult<()> {
        self.ensure_dir().await?;

        let path = self.entry_path(&entry.key);
        let tmp = self.dir.join(format!(".{}.tmp", Uuid::new_v4()));
        let content = serde_json::to_vec_pretty(entry)?;

        // The blocking task runs to the end even when this future is dropped
        // by a cancelled context, so the temp file is always renamed or removed.
        let target = path.clone();
        tokio::task::spawn_blocking(move || replace_file(&tmp, &target, &content))
            .await
            .map_err(|e| VaultError::Internal(format!("entry writer failed: {}", e)))?
            .map_err(|e| VaultError::io(format!("writing entry file {}", path.display()), e))?;

        debug!("Stored entry {} at {}", entry.key, path.display());
        Ok(())
    }

    async fn remove_entry(&self, key: &str) -> VaultResult<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VaultError::io(
                format!("removing entry file {}", path.display()),
                e,
            )),
        }
    }

    async fn list_entries(&self) -> VaultResult<Vec<Entry>> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(VaultError::io("reading entries directory", e)),
        };

        let mut paths = vec![];
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| VaultError::io("reading entries directory entry", e))?
        {
            let path = item.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }

        Self::read_all(&paths).await
    }

    /// Read every path concurrently. Files deleted since the directory scan
    /// are skipped.
    async fn read_all(paths: &[PathBuf]) -> VaultResult<Vec<Entry>> {
        let entries = try_join_all(paths.iter().map(|p| Self::read_entry(p))).await?;
        Ok(entries.into_iter().flatten().collect())
    }
}

impl Namespaced for FileBackend {
    fn with_namespace(&self, namespace: &str) -> Arc<dyn Backend> {
        Arc::new(Self {
            root: self.root.clone(),
            dir: self.dir.join(NAMESPACE_DIR).join(digest(namespace)),
        })
    }
}

#[async_trait]
impl Backend for FileBackend {
    async fn get(&self, ctx: &Context, key: &str) -> VaultResult<Entry> {
        let path = self.entry_path(key);
        ctx.run("file get", Self::read_entry(&path))
            .await?
            .ok_or(VaultError::NotFound)
    }

    async fn set(&self, ctx: &Context, entry: &Entry) -> VaultResult<()> {
        ctx.run("file set", self.write_entry(entry)).await
    }

    async fn delete(&self, ctx: &Context, key: &str) -> VaultResult<()> {
        ctx.run("file delete", self.remove_entry(key)).await
    }

    async fn list(&self, ctx: &Context) -> VaultResult<Vec<Entry>> {
        ctx.run("file list", self.list_entries()).await
    }

    fn as_namespaced(&self) -> Option<&dyn Namespaced> {
        Some(self)
    }
}

fn digest(name: &str) -> String {
    hex::encode(Sha256::digest(name.as_bytes()))
}

/// Write `content` to `tmp` and move it over `path`, removing `tmp` if
/// either step fails.
fn replace_file(tmp: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    let result = write_private(tmp, content).and_then(|()| std::fs::rename(tmp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(tmp);
    }
    result
}

fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()
}
