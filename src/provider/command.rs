//! Provider backed by an external command
//!
//! The command must print JSON on stdout, either a list of entries or a
//! flat object of string values:
//!
//! ```text
//! [{"key": "db-host", "value": "10.0.0.5"}]
//! {"db-host": "10.0.0.5", "db-port": "5432"}
//! ```

use super::Provider;
use crate::context::Context;
use crate::entry::Entry;
use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// [`Provider`] that runs a program and parses its stdout
#[derive(Debug, Clone)]
pub struct CommandProvider {
    name: String,
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    workdir: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CommandOutput {
    Entries(Vec<Entry>),
    Values(BTreeMap<String, String>),
}

impl CommandProvider {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: vec![],
            env: HashMap::new(),
            workdir: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn execute(&self) -> VaultResult<Vec<u8>> {
        let command_line = self.command_line();
        debug!("Running provider {}: {}", self.name, command_line);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| VaultError::command_failed(&command_line, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VaultError::command_exec(command_line, stderr.trim()));
        }

        Ok(output.stdout)
    }

    fn parse(&self, stdout: &[u8]) -> VaultResult<Vec<Entry>> {
        let output: CommandOutput =
            serde_json::from_slice(stdout).map_err(|e| VaultError::ProviderOutput {
                provider: self.name.clone(),
                reason: e.to_string(),
            })?;

        let entries = match output {
            CommandOutput::Entries(entries) => entries
                .into_iter()
                .map(|mut e| {
                    if e.source.is_empty() {
                        e.source = self.name.clone();
                    }
                    e
                })
                .collect(),
            CommandOutput::Values(values) => values
                .into_iter()
                .map(|(k, v)| Entry::new(k, v).with_source(&self.name))
                .collect(),
        };

        Ok(entries)
    }
}

#[async_trait]
impl Provider for CommandProvider {
    async fn fetch(&self, ctx: &Context) -> VaultResult<Vec<Entry>> {
        // Dropping the output future on cancellation kills the child.
        let stdout = ctx.run("command fetch", self.execute()).await?;
        let entries = self.parse(&stdout)?;
        debug!("Provider {} returned {} entries", self.name, entries.len());
        Ok(entries)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
