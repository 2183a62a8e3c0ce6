//! File-backed implementation of the `DeploymentStore` port.
//!
//! `JsonFileStore` keeps every record in one JSON document, loaded and saved
//! through `tokio::task::spawn_blocking` with an atomic write (temp file +
//! rename) so a crash mid-write never leaves a truncated state file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use launchpad_common::{DeploymentRecord, PhaseChange};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::application::ports::DeploymentStore;
use crate::domain::DeployError;

/// On-disk layout of the state file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    deployments: BTreeMap<String, DeploymentRecord>,
}

/// State file manager: implements `DeploymentStore` for the infra layer.
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes load-modify-save cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<StateFile> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_sync(&path))
            .await
            .context("state load task panicked")?
    }

    async fn save(&self, state: StateFile) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save_sync(&path, &state))
            .await
            .context("state save task panicked")?
    }
}

fn load_sync(path: &Path) -> Result<StateFile> {
    if !path.exists() {
        return Ok(StateFile::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading state file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing state file {}", path.display()))
}

fn save_sync(path: &Path, state: &StateFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(state).context("serializing state")?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, &content)
        .with_context(|| format!("writing temp file {}", temp_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
    }

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("finalizing state file {}", path.display()))?;
    Ok(())
}

#[async_trait]
impl DeploymentStore for JsonFileStore {
    async fn insert(&self, record: &DeploymentRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        anyhow::ensure!(
            !state.deployments.contains_key(&record.identifier),
            "deployment {} already exists",
            record.identifier
        );
        state
            .deployments
            .insert(record.identifier.clone(), record.clone());
        self.save(state).await
    }

    async fn get(&self, identifier: &str) -> Result<Option<DeploymentRecord>> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        Ok(state.deployments.remove(identifier))
    }

    async fn update(&self, identifier: &str, change: PhaseChange) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        let applied = state
            .deployments
            .get_mut(identifier)
            .ok_or_else(|| DeployError::DeploymentNotFound(identifier.to_owned()))?
            .apply(change);
        anyhow::ensure!(applied, "deployment {identifier} already finished");
        self.save(state).await
    }
}
